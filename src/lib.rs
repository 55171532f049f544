pub mod config;
pub mod core;

pub use crate::config::Config;
pub use crate::core::{BuddyError, RelationshipEngine, Result};
