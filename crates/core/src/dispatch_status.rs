//! Delivery status of a notification dispatch.
//!
//! A dispatch is the per-recipient record of one notification. Its status
//! moves through:
//!
//! ```text
//! prepared --send--> sent
//! prepared | sent --read--> read
//! read --unread--> sent
//! ```
//!
//! There is no terminal state. `unread` always lands on `sent`, so a dispatch
//! that was delivered and read can never fall back to `prepared` and be
//! picked up by a resend.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STATUS_PREPARED: &str = "prepared";
pub const STATUS_SENT: &str = "sent";
pub const STATUS_READ: &str = "read";

/// Status column of `notification_dispatches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    /// Created but not yet delivered on every allowed channel.
    Prepared,
    /// Delivered on every allowed channel, not read by the recipient.
    Sent,
    /// Read by the recipient.
    Read,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepared => STATUS_PREPARED,
            Self::Sent => STATUS_SENT,
            Self::Read => STATUS_READ,
        }
    }

    /// Parse a stored status value.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_PREPARED => Ok(Self::Prepared),
            STATUS_SENT => Ok(Self::Sent),
            STATUS_READ => Ok(Self::Read),
            other => Err(CoreError::Validation(format!(
                "Unknown dispatch status '{other}'. Must be one of: {STATUS_PREPARED}, {STATUS_SENT}, {STATUS_READ}"
            ))),
        }
    }

    /// Mark the dispatch as delivered.
    pub fn send(self) -> Result<Self, CoreError> {
        match self {
            Self::Prepared => Ok(Self::Sent),
            other => Err(transition_error("send", other)),
        }
    }

    /// Mark the dispatch as read.
    ///
    /// Allowed from `prepared` as well as `sent`: a recipient may open an
    /// in-app notification whose external delivery failed.
    pub fn read(self) -> Result<Self, CoreError> {
        match self {
            Self::Prepared | Self::Sent => Ok(Self::Read),
            other => Err(transition_error("read", other)),
        }
    }

    /// Mark a read dispatch as unread again.
    pub fn unread(self) -> Result<Self, CoreError> {
        match self {
            Self::Read => Ok(Self::Sent),
            other => Err(transition_error("unread", other)),
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read)
    }
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn transition_error(transition: &str, from: DispatchStatus) -> CoreError {
    CoreError::Conflict(format!(
        "Transition '{transition}' is not allowed from status '{from}'"
    ))
}
