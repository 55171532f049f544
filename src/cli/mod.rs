use anyhow::{Context, Result};

use studybuddy::config::Config;
use studybuddy::core::{
    FeedbackForm, JsonFileStore, RelationshipEngine, SessionPlan, UserProfile,
};

pub use commands::{Args, Commands};

mod commands;

type Engine = RelationshipEngine<JsonFileStore>;

pub fn run(args: Args, config: &Config) -> Result<()> {
    let engine = RelationshipEngine::open(JsonFileStore::new(config.data_file_path()));
    let user = args
        .user
        .context("No user given; pass --user or set STUDYBUDDY_USER")?;

    match args.command {
        Commands::Profile => handle_profile(&engine, &user),
        Commands::Matches => handle_matches(&engine, &user),
        Commands::Invite { to } => handle_invite(&engine, &user, &to),
        Commands::Invitations => handle_invitations(&engine, &user),
        Commands::Respond { id, decision } => {
            let invitation = engine.respond_invitation(&user, id, decision)?;
            println!("Invitation {} from {} is now {}", invitation.id, invitation.from_username, invitation.status);
            Ok(())
        }
        Commands::Buddies => handle_buddies(&engine, &user),
        Commands::Chat { buddy } => handle_chat(&engine, &user, &buddy),
        Commands::Send { buddy, message } => {
            engine.send_message(&user, &buddy, &message)?;
            println!("📨 Sent to {}", buddy);
            Ok(())
        }
        Commands::Schedule { buddy, date, time, duration, location, subject, notes } => {
            let plan = SessionPlan { date, time, duration, location, subject, notes };
            let session = engine.schedule_session(&user, &buddy, plan)?;
            println!(
                "📅 Session {} scheduled with {} on {} at {}",
                session.id,
                buddy,
                session.date,
                session.time.format("%H:%M")
            );
            Ok(())
        }
        Commands::Sessions => handle_sessions(&engine, &user),
        Commands::Complete { id } => {
            engine.complete_session(&user, id)?;
            println!("✅ Session {} completed", id);
            Ok(())
        }
        Commands::Cancel { id } => {
            engine.cancel_session(&user, id)?;
            println!("Session {} cancelled", id);
            Ok(())
        }
        Commands::Feedback { session, rating, productivity, again, comments } => {
            let form = FeedbackForm {
                rating,
                productivity,
                would_study_again: again,
                comments,
            };
            engine.submit_feedback(&user, session, form)?;
            println!("⭐ Thanks for rating session {}", session);
            Ok(())
        }
        Commands::PendingFeedback => handle_pending_feedback(&engine, &user),
        Commands::History => handle_history(&engine, &user),
        Commands::Dashboard => handle_dashboard(&engine, &user),
    }
}

fn display_name(engine: &Engine, username: &str) -> String {
    engine
        .profile(username)
        .map(|p| p.name)
        .unwrap_or_else(|_| username.to_string())
}

fn join(items: &std::collections::BTreeSet<String>) -> String {
    items.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn print_profile(profile: &UserProfile) {
    println!("  Subjects:     {}", join(&profile.subjects));
    println!("  Interests:    {}", join(&profile.interests));
    println!("  Study style:  {}", profile.study_style);
    println!("  Availability: {}", join(&profile.availability));
}

fn handle_profile(engine: &Engine, user: &str) -> Result<()> {
    let profile = engine.profile(user)?;
    println!("👤 {} (@{})", profile.name, profile.username);
    print_profile(&profile);
    Ok(())
}

fn handle_matches(engine: &Engine, user: &str) -> Result<()> {
    let candidates = engine.rank_candidates(user)?;
    if candidates.is_empty() {
        println!("No other students yet.");
        return Ok(());
    }

    let sent = engine.invitations_sent(user)?;
    println!("✨ Found {} compatible study partners:", candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let already_sent = sent.iter().any(|inv| inv.to_username == candidate.profile.username);
        println!(
            "{}. {} (@{}) - {}% {}{}",
            i + 1,
            candidate.profile.name,
            candidate.profile.username,
            (candidate.score * 100.0) as u32,
            candidate.badge(),
            if already_sent { " [invited]" } else { "" }
        );
        print_profile(&candidate.profile);
    }
    Ok(())
}

fn handle_invite(engine: &Engine, user: &str, to: &str) -> Result<()> {
    let invitation = engine.invite(user, to)?;
    println!(
        "🎉 Invitation {} sent to {} ({}% match)",
        invitation.id,
        display_name(engine, to),
        (invitation.match_score * 100.0) as u32
    );
    Ok(())
}

fn handle_invitations(engine: &Engine, user: &str) -> Result<()> {
    let received = engine.invitations_received(user)?;
    println!("📨 Received ({}):", received.len());
    for inv in &received {
        println!(
            "  #{} from {} - {}% - {} ({})",
            inv.id,
            display_name(engine, &inv.from_username),
            (inv.match_score * 100.0) as u32,
            inv.status,
            inv.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    let sent = engine.invitations_sent(user)?;
    println!("📤 Sent ({}):", sent.len());
    for inv in &sent {
        println!(
            "  #{} to {} - {}% - {} ({})",
            inv.id,
            display_name(engine, &inv.to_username),
            (inv.match_score * 100.0) as u32,
            inv.status,
            inv.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn handle_buddies(engine: &Engine, user: &str) -> Result<()> {
    let overview = engine.chat_overview(user)?;
    if overview.is_empty() {
        println!("No study buddies yet. Accept an invitation to start chatting!");
        return Ok(());
    }

    println!("🤝 Study buddies ({}):", overview.len());
    for entry in overview {
        let name = display_name(engine, &entry.buddy);
        if entry.unread > 0 {
            println!("  {} (@{}) - {} new", name, entry.buddy, entry.unread);
        } else {
            println!("  {} (@{})", name, entry.buddy);
        }
    }
    Ok(())
}

fn handle_chat(engine: &Engine, user: &str, buddy: &str) -> Result<()> {
    let messages = engine.open_conversation(user, buddy)?;
    println!("💬 {}", display_name(engine, buddy));
    if messages.is_empty() {
        println!("No messages yet. Start the conversation!");
    }
    for message in messages {
        let who = if message.from_username == user { "you" } else { buddy };
        println!(
            "[{}] {}: {}",
            message.sent_at.format("%Y-%m-%d %H:%M:%S"),
            who,
            message.body
        );
    }
    Ok(())
}

fn handle_sessions(engine: &Engine, user: &str) -> Result<()> {
    let sessions = engine.upcoming_sessions(user)?;
    if sessions.is_empty() {
        println!("No upcoming sessions scheduled.");
        return Ok(());
    }

    println!("📆 Upcoming sessions:");
    for session in sessions {
        let partner = session.partner_of(user).unwrap_or_default();
        println!(
            "  #{} {} with {} - {} {} - {} @ {}",
            session.id,
            session.subject,
            display_name(engine, partner),
            session.date,
            session.time.format("%H:%M"),
            session.duration,
            session.location
        );
        if !session.notes.is_empty() {
            println!("     Notes: {}", session.notes);
        }
    }
    Ok(())
}

fn handle_pending_feedback(engine: &Engine, user: &str) -> Result<()> {
    let pending = engine.pending_feedback(user)?;
    if pending.is_empty() {
        println!("✅ All completed sessions have been rated!");
        return Ok(());
    }

    println!("📝 Sessions waiting for your feedback:");
    for session in pending {
        let partner = session.partner_of(user).unwrap_or_default();
        println!(
            "  #{} {} with {} on {}",
            session.id,
            session.subject,
            display_name(engine, partner),
            session.date
        );
    }
    Ok(())
}

fn handle_history(engine: &Engine, user: &str) -> Result<()> {
    let history = engine.feedback_history(user)?;
    if history.is_empty() {
        println!("No feedback given yet.");
        return Ok(());
    }

    println!("📜 Your feedback history:");
    for fb in history {
        println!(
            "  ⭐ {} - Rating: {}/5 | Productivity: {}/5 | Again: {} | {}",
            display_name(engine, &fb.partner_username),
            fb.rating,
            fb.productivity,
            fb.would_study_again,
            fb.submitted_at.format("%Y-%m-%d %H:%M:%S")
        );
        if !fb.comments.is_empty() {
            println!("     💬 {}", fb.comments);
        }
    }
    Ok(())
}

fn handle_dashboard(engine: &Engine, user: &str) -> Result<()> {
    let metrics = engine.dashboard(user)?;

    println!("📊 Activity dashboard");
    println!("  Invitations sent:     {}", metrics.invitations_sent);
    println!("  Invitations received: {}", metrics.invitations_received);
    println!("  Connections made:     {}", metrics.connections);
    println!("  Sessions completed:   {}", metrics.sessions_completed);

    println!("🤝 Study partners:");
    if metrics.partners.is_empty() {
        println!("  none yet");
    }
    for partner in &metrics.partners {
        println!(
            "  {} - {} sessions completed",
            display_name(engine, &partner.username),
            partner.completed_sessions
        );
    }

    println!("📈 Performance:");
    let perf = &metrics.performance;
    match (perf.average_rating, perf.average_productivity, perf.would_study_again_pct) {
        (Some(rating), Some(productivity), Some(again)) => {
            println!("  Average rating:       {:.1}/5", rating);
            println!("  Average productivity: {:.1}/5", productivity);
            println!("  Would study again:    {:.0}%", again);
        }
        _ => println!("  no data yet; rate completed sessions to see metrics"),
    }
    Ok(())
}
