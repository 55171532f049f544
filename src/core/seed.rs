use std::collections::BTreeMap;

use super::data::BuddyData;
use super::profile::{ProfileStore, UserProfile};

/// Dataset used when nothing usable has been persisted yet
pub fn seed_data() -> BuddyData {
    let accounts: BTreeMap<String, String> = [
        ("admin", "password123"),
        ("alice", "alice123"),
        ("bob", "bob123"),
        ("carol", "carol123"),
        ("david", "david123"),
        ("emma", "emma123"),
    ]
    .into_iter()
    .map(|(user, secret)| (user.to_string(), secret.to_string()))
    .collect();

    BuddyData {
        accounts,
        profiles: seed_profiles(),
        ..BuddyData::default()
    }
}

pub fn seed_profiles() -> ProfileStore {
    [
        UserProfile::new("alice", "Alice Chen", "Visual")
            .with_subjects(&["Math", "Physics"])
            .with_interests(&["Technology", "Reading"])
            .with_availability(&["Morning", "Evening"]),
        UserProfile::new("bob", "Bob Martinez", "Kinesthetic")
            .with_subjects(&["Computer Science", "Math"])
            .with_interests(&["Gaming", "Technology"])
            .with_availability(&["Afternoon", "Evening"]),
        UserProfile::new("carol", "Carol Johnson", "Auditory")
            .with_subjects(&["Biology", "Chemistry"])
            .with_interests(&["Sports", "Music"])
            .with_availability(&["Morning", "Weekend"]),
        UserProfile::new("david", "David Kim", "Visual")
            .with_subjects(&["Physics", "Math"])
            .with_interests(&["Technology", "Movies"])
            .with_availability(&["Evening", "Weekend"]),
        UserProfile::new("emma", "Emma Wilson", "Reading/Writing")
            .with_subjects(&["Literature", "History"])
            .with_interests(&["Reading", "Art"])
            .with_availability(&["Morning", "Afternoon"]),
    ]
    .into_iter()
    .collect()
}
