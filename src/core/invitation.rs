use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::error::{BuddyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Declined => write!(f, "declined"),
        }
    }
}

/// Recipient's answer to a pending invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationDecision {
    Accept,
    Decline,
}

impl InvitationDecision {
    fn status(self) -> InvitationStatus {
        match self {
            InvitationDecision::Accept => InvitationStatus::Accepted,
            InvitationDecision::Decline => InvitationStatus::Declined,
        }
    }
}

impl std::str::FromStr for InvitationDecision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept" | "accepted" => Ok(InvitationDecision::Accept),
            "decline" | "declined" => Ok(InvitationDecision::Decline),
            other => Err(format!("unknown decision '{}', expected accept or decline", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: u64,
    pub from_username: String,
    pub to_username: String,
    /// Compatibility at the moment the invitation was sent
    pub match_score: f64,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn involves(&self, username: &str) -> bool {
        self.from_username == username || self.to_username == username
    }

    fn is_active(&self) -> bool {
        matches!(self.status, InvitationStatus::Pending | InvitationStatus::Accepted)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvitationLedger {
    #[serde(default)]
    records: Vec<Invitation>,
    #[serde(default)]
    counter: u64,
}

impl InvitationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // A stored counter below the highest id is raised past it
    fn next_id(&mut self) -> u64 {
        let highest = self.records.iter().map(|r| r.id).max().unwrap_or(0);
        self.counter = self.counter.max(highest) + 1;
        self.counter
    }

    /// Append a pending invitation.
    ///
    /// A pair may hold one live invitation: re-sending in the same direction
    /// is refused whatever its status, and a reverse invitation blocks while it
    /// is pending or accepted.
    pub fn create(&mut self, from: &str, to: &str, match_score: f64) -> Result<Invitation> {
        if from == to {
            return Err(BuddyError::SamePerson(from.to_string()));
        }

        let duplicate = self.records.iter().any(|inv| {
            (inv.from_username == from && inv.to_username == to)
                || (inv.from_username == to && inv.to_username == from && inv.is_active())
        });
        if duplicate {
            return Err(BuddyError::DuplicateInvitation {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let id = self.next_id();
        let invitation = Invitation {
            id,
            from_username: from.to_string(),
            to_username: to.to_string(),
            match_score,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        };
        self.records.push(invitation.clone());
        Ok(invitation)
    }

    pub fn get(&self, id: u64) -> Option<&Invitation> {
        self.records.iter().find(|inv| inv.id == id)
    }

    pub fn respond(&mut self, id: u64, decision: InvitationDecision) -> Result<Invitation> {
        let invitation = self
            .records
            .iter_mut()
            .find(|inv| inv.id == id)
            .ok_or_else(|| BuddyError::NotFound(format!("invitation {}", id)))?;

        if invitation.status != InvitationStatus::Pending {
            return Err(BuddyError::InvalidTransition(format!(
                "invitation {} is already {}",
                id, invitation.status
            )));
        }

        invitation.status = decision.status();
        Ok(invitation.clone())
    }

    /// Other party of every accepted invitation naming `username`
    pub fn accepted_buddies_of(&self, username: &str) -> BTreeSet<String> {
        self.records
            .iter()
            .filter(|inv| inv.status == InvitationStatus::Accepted)
            .filter_map(|inv| {
                if inv.from_username == username {
                    Some(inv.to_username.clone())
                } else if inv.to_username == username {
                    Some(inv.from_username.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn are_buddies(&self, a: &str, b: &str) -> bool {
        self.records.iter().any(|inv| {
            inv.status == InvitationStatus::Accepted && inv.involves(a) && inv.involves(b)
        })
    }

    pub fn received_by(&self, username: &str) -> Vec<&Invitation> {
        self.records
            .iter()
            .filter(|inv| inv.to_username == username)
            .collect()
    }

    pub fn sent_by(&self, username: &str) -> Vec<&Invitation> {
        self.records
            .iter()
            .filter(|inv| inv.from_username == username)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
