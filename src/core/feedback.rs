use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{BuddyError, Result};
use super::session::{SessionLedger, SessionStatus, StudySession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WouldStudyAgain {
    Yes,
    Maybe,
    No,
}

impl fmt::Display for WouldStudyAgain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WouldStudyAgain::Yes => write!(f, "Yes"),
            WouldStudyAgain::Maybe => write!(f, "Maybe"),
            WouldStudyAgain::No => write!(f, "No"),
        }
    }
}

impl std::str::FromStr for WouldStudyAgain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(WouldStudyAgain::Yes),
            "maybe" => Ok(WouldStudyAgain::Maybe),
            "no" => Ok(WouldStudyAgain::No),
            other => Err(format!("unknown answer '{}', expected Yes, Maybe or No", other)),
        }
    }
}

/// What a participant reports after a completed session
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackForm {
    pub rating: u8,
    pub productivity: u8,
    pub would_study_again: WouldStudyAgain,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub session_id: u64,
    pub from_username: String,
    pub partner_username: String,
    pub rating: u8,
    pub productivity: u8,
    pub would_study_again: WouldStudyAgain,
    #[serde(default)]
    pub comments: String,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregates over the feedback one user has given. `None` means no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub feedback_count: usize,
    pub average_rating: Option<f64>,
    pub average_productivity: Option<f64>,
    pub would_study_again_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackLedger {
    records: Vec<Feedback>,
}

impl FeedbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(
        &mut self,
        sessions: &SessionLedger,
        session_id: u64,
        from: &str,
        form: FeedbackForm,
    ) -> Result<Feedback> {
        let session = sessions
            .get(session_id)
            .ok_or_else(|| BuddyError::NotFound(format!("session {}", session_id)))?;

        if session.status != SessionStatus::Completed {
            return Err(BuddyError::SessionNotCompleted(session_id));
        }

        let partner = session
            .partner_of(from)
            .ok_or_else(|| BuddyError::NotParticipant {
                username: from.to_string(),
                what: format!("session {}", session_id),
            })?;

        if self.has_submitted(session_id, from) {
            return Err(BuddyError::AlreadySubmitted {
                session_id,
                username: from.to_string(),
            });
        }

        for value in [form.rating, form.productivity] {
            if !(1..=5).contains(&value) {
                return Err(BuddyError::InvalidRating(value));
            }
        }

        let feedback = Feedback {
            session_id,
            from_username: from.to_string(),
            partner_username: partner.to_string(),
            rating: form.rating,
            productivity: form.productivity,
            would_study_again: form.would_study_again,
            comments: form.comments,
            submitted_at: Utc::now(),
        };
        self.records.push(feedback.clone());
        Ok(feedback)
    }

    pub fn has_submitted(&self, session_id: u64, username: &str) -> bool {
        self.records
            .iter()
            .any(|f| f.session_id == session_id && f.from_username == username)
    }

    /// Completed sessions of `username` still waiting for their feedback
    pub fn pending_feedback_for<'a>(
        &self,
        sessions: &'a SessionLedger,
        username: &str,
    ) -> Vec<&'a StudySession> {
        sessions
            .completed_for(username)
            .into_iter()
            .filter(|s| !self.has_submitted(s.id, username))
            .collect()
    }

    pub fn history_for(&self, username: &str) -> Vec<&Feedback> {
        self.records
            .iter()
            .filter(|f| f.from_username == username)
            .collect()
    }

    pub fn performance_of(&self, username: &str) -> Performance {
        let history = self.history_for(username);
        let count = history.len();
        if count == 0 {
            return Performance {
                feedback_count: 0,
                average_rating: None,
                average_productivity: None,
                would_study_again_pct: None,
            };
        }

        let total = count as f64;
        let rating_sum: u32 = history.iter().map(|f| u32::from(f.rating)).sum();
        let productivity_sum: u32 = history.iter().map(|f| u32::from(f.productivity)).sum();
        let again = history
            .iter()
            .filter(|f| f.would_study_again == WouldStudyAgain::Yes)
            .count();

        Performance {
            feedback_count: count,
            average_rating: Some(f64::from(rating_sum) / total),
            average_productivity: Some(f64::from(productivity_sum) / total),
            would_study_again_pct: Some(again as f64 / total * 100.0),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
