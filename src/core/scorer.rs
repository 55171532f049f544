use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::profile::UserProfile;

// Weights in hundredths, divided once at the end: a perfect match must be exactly 1.0
const SUBJECT_WEIGHT: f64 = 40.0;
const AVAILABILITY_WEIGHT: f64 = 30.0;
const INTEREST_WEIGHT: f64 = 20.0;
const STYLE_MATCH_BONUS: f64 = 10.0;
const STYLE_MISMATCH_BONUS: f64 = 5.0;

const EXCELLENT_THRESHOLD: f64 = 0.70;
const GOOD_THRESHOLD: f64 = 0.50;

/// Compatibility between two profiles in [0, 1].
///
/// Weighted Jaccard overlap of subjects, availability and interests plus a
/// study-style bonus that never drops to zero.
pub fn compatibility(a: &UserProfile, b: &UserProfile) -> f64 {
    let mut score = 0.0;
    score += jaccard(&a.subjects, &b.subjects) * SUBJECT_WEIGHT;
    score += jaccard(&a.availability, &b.availability) * AVAILABILITY_WEIGHT;
    score += jaccard(&a.interests, &b.interests) * INTEREST_WEIGHT;
    score += if a.study_style == b.study_style {
        STYLE_MATCH_BONUS
    } else {
        STYLE_MISMATCH_BONUS
    };
    score / 100.0
}

/// |a ∩ b| / |a ∪ b|, zero when both are empty
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchBadge {
    Excellent,
    Good,
    Fair,
}

impl MatchBadge {
    pub fn classify(score: f64) -> Self {
        match score {
            s if s >= EXCELLENT_THRESHOLD => MatchBadge::Excellent,
            s if s >= GOOD_THRESHOLD => MatchBadge::Good,
            _ => MatchBadge::Fair,
        }
    }
}

impl fmt::Display for MatchBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchBadge::Excellent => write!(f, "Excellent"),
            MatchBadge::Good => write!(f, "Good"),
            MatchBadge::Fair => write!(f, "Fair"),
        }
    }
}
