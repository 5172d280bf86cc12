//! Application services for the message subsystem.
//!
//! Services orchestrate domain operations and coordinate between ports,
//! implementing business workflows that span multiple aggregates.

mod commit;
mod config;
mod error;

pub use commit::{CommitOrchestrator, SaveMessageRequest};
pub use config::CommitConfig;
pub use error::{SaveContext, SaveMessageError, SaveResult, WriteFailure};
