use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Static study attributes of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub subjects: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    pub study_style: String,
    pub availability: BTreeSet<String>,
}

impl UserProfile {
    pub fn new(username: &str, name: &str, study_style: &str) -> Self {
        Self {
            username: username.to_string(),
            name: name.to_string(),
            subjects: BTreeSet::new(),
            interests: BTreeSet::new(),
            study_style: study_style.to_string(),
            availability: BTreeSet::new(),
        }
    }

    pub fn with_subjects(mut self, subjects: &[&str]) -> Self {
        self.subjects = subjects.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_interests(mut self, interests: &[&str]) -> Self {
        self.interests = interests.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_availability(mut self, availability: &[&str]) -> Self {
        self.availability = availability.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Ordered collection of profiles keyed by username.
///
/// Iteration follows insertion order. Candidate ranking relies on it to
/// break score ties, so the order is part of the persisted form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileStore {
    profiles: Vec<UserProfile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a profile, replacing any existing one with the same username in place
    pub fn insert(&mut self, profile: UserProfile) {
        match self.profiles.iter_mut().find(|p| p.username == profile.username) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn get(&self, username: &str) -> Option<&UserProfile> {
        self.profiles.iter().find(|p| p.username == username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.get(username).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<UserProfile> for ProfileStore {
    fn from_iter<I: IntoIterator<Item = UserProfile>>(iter: I) -> Self {
        let mut store = ProfileStore::new();
        for profile in iter {
            store.insert(profile);
        }
        store
    }
}
