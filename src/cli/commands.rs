use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use studybuddy::core::{InvitationDecision, SessionDuration, SessionLocation, WouldStudyAgain};

#[derive(Parser)]
#[command(name = "studybuddy")]
#[command(about = "Find study partners, chat, schedule sessions and rate them")]
#[command(version)]
pub struct Args {
    /// Data directory (defaults to the user config directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Acting username; authentication happens before this tool runs
    #[arg(long, short, global = true, env = "STUDYBUDDY_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show your study profile
    Profile,
    /// Rank the most compatible study partners
    Matches,
    /// Invite someone to be your study buddy
    Invite {
        /// Username to invite
        to: String,
    },
    /// List received and sent invitations
    Invitations,
    /// Accept or decline an invitation you received
    Respond {
        /// Invitation id
        id: u64,
        /// accept or decline
        decision: InvitationDecision,
    },
    /// List your study buddies with unread message counts
    Buddies,
    /// Open the conversation with a buddy (marks their messages read)
    Chat {
        buddy: String,
    },
    /// Send a message to a buddy
    Send {
        buddy: String,
        message: String,
    },
    /// Schedule a study session with a buddy
    Schedule {
        buddy: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Time as HH:MM
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        /// 30 min, 1 hour, 1.5 hours, 2 hours or 3 hours
        #[arg(long, default_value = "1 hour")]
        duration: SessionDuration,
        /// Library, Online (Zoom), Online (Google Meet), Cafe, Study Room or Other
        #[arg(long, default_value = "Library")]
        location: SessionLocation,
        /// Subject or topic
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List upcoming study sessions
    Sessions,
    /// Mark a scheduled session as completed
    Complete {
        id: u64,
    },
    /// Cancel a scheduled session
    Cancel {
        id: u64,
    },
    /// Rate a completed session
    Feedback {
        /// Session id
        session: u64,
        /// Overall rating, 1-5
        #[arg(long)]
        rating: u8,
        /// Productivity, 1-5
        #[arg(long)]
        productivity: u8,
        /// Yes, Maybe or No
        #[arg(long)]
        again: WouldStudyAgain,
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// Completed sessions still waiting for your feedback
    PendingFeedback,
    /// Feedback you have given
    History,
    /// Activity and performance summary
    Dashboard,
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("invalid time '{}': {}", s, e))
}
