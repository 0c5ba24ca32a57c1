//! Docket core domain logic.
//!
//! Pure, I/O-free building blocks shared by the persistence and
//! notification crates: identifiers, the error type, the dispatch status
//! state machine, notification groups and runtime tags, delivery
//! preferences, and content template rendering.

pub mod channels;
pub mod dispatch_status;
pub mod error;
pub mod notification_groups;
pub mod preferences;
pub mod roles;
pub mod runtime_tags;
pub mod template;
pub mod types;
