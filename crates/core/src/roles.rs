//! Well-known user role names.
//!
//! These must match the values stored in `users.role` and the
//! `is_for_<role>` columns of `notification_types`.

use serde::{Deserialize, Serialize};

pub const ROLE_CLIENT: &str = "client";
pub const ROLE_ATTORNEY: &str = "attorney";
pub const ROLE_PARALEGAL: &str = "paralegal";
pub const ROLE_ENTERPRISE: &str = "enterprise";
pub const ROLE_OTHER: &str = "other";
pub const ROLE_SUPPORT: &str = "support";

/// Legacy single-value recipient type for types available to everyone.
pub const RECIPIENT_TYPE_ALL: &str = "all";

/// A platform user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Attorney,
    Paralegal,
    Enterprise,
    Other,
    Support,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => ROLE_CLIENT,
            Self::Attorney => ROLE_ATTORNEY,
            Self::Paralegal => ROLE_PARALEGAL,
            Self::Enterprise => ROLE_ENTERPRISE,
            Self::Other => ROLE_OTHER,
            Self::Support => ROLE_SUPPORT,
        }
    }

    /// Parse a stored role name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            ROLE_CLIENT => Some(Self::Client),
            ROLE_ATTORNEY => Some(Self::Attorney),
            ROLE_PARALEGAL => Some(Self::Paralegal),
            ROLE_ENTERPRISE => Some(Self::Enterprise),
            ROLE_OTHER => Some(Self::Other),
            ROLE_SUPPORT => Some(Self::Support),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
