use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{BuddyError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    fn between(&self, a: &str, b: &str) -> bool {
        (self.from_username == a && self.to_username == b)
            || (self.from_username == b && self.to_username == a)
    }

    fn addressed(&self, recipient: &str, sender: &str) -> bool {
        self.to_username == recipient && self.from_username == sender
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLedger {
    #[serde(default)]
    records: Vec<Message>,
    #[serde(default)]
    counter: u64,
}

impl MessageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // A stored counter below the highest id is raised past it
    fn next_id(&mut self) -> u64 {
        let highest = self.records.iter().map(|r| r.id).max().unwrap_or(0);
        self.counter = self.counter.max(highest) + 1;
        self.counter
    }

    pub fn send(&mut self, from: &str, to: &str, body: &str) -> Result<Message> {
        if body.trim().is_empty() {
            return Err(BuddyError::EmptyBody);
        }

        let id = self.next_id();
        let message = Message {
            id,
            from_username: from.to_string(),
            to_username: to.to_string(),
            body: body.to_string(),
            sent_at: Utc::now(),
            read: false,
        };
        self.records.push(message.clone());
        Ok(message)
    }

    /// Messages in both directions, oldest first; ties keep send order
    pub fn conversation(&self, a: &str, b: &str) -> Vec<&Message> {
        let mut messages: Vec<_> = self.records.iter().filter(|m| m.between(a, b)).collect();
        messages.sort_by_key(|m| m.sent_at);
        messages
    }

    /// Flag everything `sender` sent to `recipient` as read; returns how many flipped
    pub fn mark_read(&mut self, recipient: &str, sender: &str) -> usize {
        let mut flipped = 0;
        for message in self
            .records
            .iter_mut()
            .filter(|m| m.addressed(recipient, sender) && !m.read)
        {
            message.read = true;
            flipped += 1;
        }
        flipped
    }

    pub fn unread_count(&self, recipient: &str, sender: &str) -> usize {
        self.records
            .iter()
            .filter(|m| m.addressed(recipient, sender) && !m.read)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
