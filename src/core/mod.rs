pub mod data;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod invitation;
pub mod message;
pub mod profile;
pub mod scorer;
pub mod seed;
pub mod session;
pub mod store;

pub use data::BuddyData;
pub use engine::{Candidate, ChatSummary, DashboardMetrics, PartnerSummary, RelationshipEngine, MAX_CANDIDATES};
pub use error::{BuddyError, Result};
pub use feedback::{Feedback, FeedbackForm, FeedbackLedger, Performance, WouldStudyAgain};
pub use invitation::{Invitation, InvitationDecision, InvitationLedger, InvitationStatus};
pub use message::{Message, MessageLedger};
pub use profile::{ProfileStore, UserProfile};
pub use scorer::{compatibility, MatchBadge};
pub use session::{SessionDuration, SessionLedger, SessionLocation, SessionPlan, SessionStatus, StudySession};
pub use store::{load_or_seed, BlobStore, JsonFileStore, MemoryBlobStore};
