use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::feedback::FeedbackLedger;
use super::invitation::InvitationLedger;
use super::message::MessageLedger;
use super::profile::ProfileStore;
use super::session::SessionLedger;

/// Everything the application persists, as one aggregate.
///
/// Each ledger owns its own id counter so that assigning an id and
/// appending the record happen in the same call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuddyData {
    /// Login credentials. Checked outside the engine; carried here so a
    /// save never drops them.
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
    #[serde(default)]
    pub profiles: ProfileStore,
    #[serde(default)]
    pub invitations: InvitationLedger,
    #[serde(default)]
    pub messages: MessageLedger,
    #[serde(default)]
    pub sessions: SessionLedger,
    #[serde(default)]
    pub feedback: FeedbackLedger,
}
