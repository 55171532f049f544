use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{BuddyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionDuration {
    #[serde(rename = "30 min")]
    HalfHour,
    #[serde(rename = "1 hour")]
    OneHour,
    #[serde(rename = "1.5 hours")]
    NinetyMinutes,
    #[serde(rename = "2 hours")]
    TwoHours,
    #[serde(rename = "3 hours")]
    ThreeHours,
}

impl SessionDuration {
    pub const ALL: [SessionDuration; 5] = [
        SessionDuration::HalfHour,
        SessionDuration::OneHour,
        SessionDuration::NinetyMinutes,
        SessionDuration::TwoHours,
        SessionDuration::ThreeHours,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SessionDuration::HalfHour => "30 min",
            SessionDuration::OneHour => "1 hour",
            SessionDuration::NinetyMinutes => "1.5 hours",
            SessionDuration::TwoHours => "2 hours",
            SessionDuration::ThreeHours => "3 hours",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionLocation {
    Library,
    #[serde(rename = "Online (Zoom)")]
    Zoom,
    #[serde(rename = "Online (Google Meet)")]
    GoogleMeet,
    Cafe,
    #[serde(rename = "Study Room")]
    StudyRoom,
    Other,
}

impl SessionLocation {
    pub const ALL: [SessionLocation; 6] = [
        SessionLocation::Library,
        SessionLocation::Zoom,
        SessionLocation::GoogleMeet,
        SessionLocation::Cafe,
        SessionLocation::StudyRoom,
        SessionLocation::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SessionLocation::Library => "Library",
            SessionLocation::Zoom => "Online (Zoom)",
            SessionLocation::GoogleMeet => "Online (Google Meet)",
            SessionLocation::Cafe => "Cafe",
            SessionLocation::StudyRoom => "Study Room",
            SessionLocation::Other => "Other",
        }
    }
}

macro_rules! label_conversions {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| {
                        let labels: Vec<_> = <$ty>::ALL.iter().map(|v| v.label()).collect();
                        format!("unknown {} '{}', expected one of: {}", $what, s, labels.join(", "))
                    })
            }
        }
    };
}

label_conversions!(SessionDuration, "duration");
label_conversions!(SessionLocation, "location");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Scheduled => write!(f, "scheduled"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Everything the scheduling form collects besides the two participants
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: SessionDuration,
    pub location: SessionLocation,
    pub subject: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: u64,
    /// Participant slots; neither one is the organizer
    pub user1: String,
    pub user2: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: SessionDuration,
    pub location: SessionLocation,
    pub subject: String,
    #[serde(default)]
    pub notes: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl StudySession {
    pub fn has_participant(&self, username: &str) -> bool {
        self.user1 == username || self.user2 == username
    }

    /// The participant who is not `username`, if `username` takes part
    pub fn partner_of(&self, username: &str) -> Option<&str> {
        if self.user1 == username {
            Some(self.user2.as_str())
        } else if self.user2 == username {
            Some(self.user1.as_str())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLedger {
    #[serde(default)]
    records: Vec<StudySession>,
    #[serde(default)]
    counter: u64,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // A stored counter below the highest id is raised past it
    fn next_id(&mut self) -> u64 {
        let highest = self.records.iter().map(|r| r.id).max().unwrap_or(0);
        self.counter = self.counter.max(highest) + 1;
        self.counter
    }

    pub fn schedule(&mut self, user_a: &str, user_b: &str, plan: SessionPlan) -> Result<StudySession> {
        if user_a == user_b {
            return Err(BuddyError::SamePerson(user_a.to_string()));
        }

        let id = self.next_id();
        let session = StudySession {
            id,
            user1: user_a.to_string(),
            user2: user_b.to_string(),
            date: plan.date,
            time: plan.time,
            duration: plan.duration,
            location: plan.location,
            subject: plan.subject,
            notes: plan.notes,
            status: SessionStatus::Scheduled,
            created_at: Utc::now(),
        };
        self.records.push(session.clone());
        Ok(session)
    }

    pub fn get(&self, id: u64) -> Option<&StudySession> {
        self.records.iter().find(|s| s.id == id)
    }

    /// Move a scheduled session to completed or cancelled. One-way.
    pub fn transition(&mut self, id: u64, to: SessionStatus) -> Result<StudySession> {
        let session = self
            .records
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| BuddyError::NotFound(format!("session {}", id)))?;

        if session.status != SessionStatus::Scheduled || to == SessionStatus::Scheduled {
            return Err(BuddyError::InvalidTransition(format!(
                "session {} cannot move from {} to {}",
                id, session.status, to
            )));
        }

        session.status = to;
        Ok(session.clone())
    }

    pub fn upcoming_for(&self, username: &str) -> Vec<&StudySession> {
        let mut sessions = self.with_status(username, SessionStatus::Scheduled);
        sessions.sort_by_key(|s| s.date);
        sessions
    }

    pub fn completed_for(&self, username: &str) -> Vec<&StudySession> {
        self.with_status(username, SessionStatus::Completed)
    }

    fn with_status(&self, username: &str, status: SessionStatus) -> Vec<&StudySession> {
        self.records
            .iter()
            .filter(|s| s.status == status && s.has_participant(username))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn plan(date: &str, subject: &str) -> SessionPlan {
        SessionPlan {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            duration: SessionDuration::OneHour,
            location: SessionLocation::Library,
            subject: subject.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_schedule_then_complete_is_terminal() {
        let mut ledger = SessionLedger::new();
        let session = ledger.schedule("alice", "bob", plan("2026-11-02", "Calculus")).unwrap();
        assert_eq!(session.id, 1);
        assert_eq!(session.status, SessionStatus::Scheduled);

        let done = ledger.transition(session.id, SessionStatus::Completed).unwrap();
        assert_eq!(done.status, SessionStatus::Completed);

        assert_matches!(
            ledger.transition(session.id, SessionStatus::Cancelled),
            Err(BuddyError::InvalidTransition(_))
        );
        assert_eq!(ledger.get(session.id).unwrap().status, SessionStatus::Completed);
    }

    #[test]
    fn test_transition_errors() {
        let mut ledger = SessionLedger::new();
        assert_matches!(
            ledger.transition(9, SessionStatus::Completed),
            Err(BuddyError::NotFound(_))
        );

        let session = ledger.schedule("alice", "bob", plan("2026-11-02", "Calculus")).unwrap();
        assert_matches!(
            ledger.transition(session.id, SessionStatus::Scheduled),
            Err(BuddyError::InvalidTransition(_))
        );
    }

    #[test]
    fn test_self_session_rejected() {
        let mut ledger = SessionLedger::new();
        assert_matches!(
            ledger.schedule("alice", "alice", plan("2026-11-02", "Solo")),
            Err(BuddyError::SamePerson(_))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_upcoming_sorted_by_date_and_filtered() {
        let mut ledger = SessionLedger::new();
        ledger.schedule("alice", "bob", plan("2026-12-01", "Late")).unwrap();
        ledger.schedule("bob", "alice", plan("2026-11-01", "Early")).unwrap();
        let cancelled = ledger.schedule("alice", "bob", plan("2026-10-01", "Dropped")).unwrap();
        ledger.schedule("carol", "bob", plan("2026-09-01", "Not mine")).unwrap();
        ledger.transition(cancelled.id, SessionStatus::Cancelled).unwrap();

        let subjects: Vec<_> = ledger
            .upcoming_for("alice")
            .iter()
            .map(|s| s.subject.as_str())
            .collect();
        assert_eq!(subjects, vec!["Early", "Late"]);
        assert_eq!(ledger.get(cancelled.id).unwrap().status, SessionStatus::Cancelled);
        assert!(ledger.completed_for("alice").is_empty());
    }

    #[test]
    fn test_partner_is_slot_independent() {
        let mut ledger = SessionLedger::new();
        let session = ledger.schedule("alice", "bob", plan("2026-11-02", "Physics")).unwrap();
        assert_eq!(session.partner_of("alice"), Some("bob"));
        assert_eq!(session.partner_of("bob"), Some("alice"));
        assert_eq!(session.partner_of("carol"), None);
    }

    #[test]
    fn test_labels_parse_and_serialize() {
        assert_eq!("1.5 hours".parse::<SessionDuration>(), Ok(SessionDuration::NinetyMinutes));
        assert_eq!("online (zoom)".parse::<SessionLocation>(), Ok(SessionLocation::Zoom));
        assert!("forever".parse::<SessionDuration>().is_err());

        let json = serde_json::to_string(&SessionLocation::StudyRoom).unwrap();
        assert_eq!(json, "\"Study Room\"");
        assert_eq!(SessionDuration::HalfHour.to_string(), "30 min");
    }
}
