//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create/update DTOs where the table is written to

pub mod device;
pub mod notification;
pub mod outbox;
pub mod target;
pub mod user;
