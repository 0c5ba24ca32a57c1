//! User entity model.

use docket_core::roles::UserRole;
use docket_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `users` table (the columns notifications care about).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub uuid: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_staff: bool,
    pub is_active: bool,
}

impl User {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        [self.first_name.as_str(), self.last_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn role(&self) -> Option<UserRole> {
        UserRole::parse(&self.role)
    }

    pub fn is_attorney(&self) -> bool {
        self.role() == Some(UserRole::Attorney)
    }

    pub fn is_client(&self) -> bool {
        self.role() == Some(UserRole::Client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str, role: &str) -> User {
        User {
            id: 1,
            uuid: Uuid::nil(),
            email: "u@example.com".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            role: role.to_string(),
            is_staff: false,
            is_active: true,
        }
    }

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(user("Ada", "Lovelace", "client").full_name(), "Ada Lovelace");
    }

    #[test]
    fn full_name_skips_empty_parts() {
        assert_eq!(user("Ada", "", "client").full_name(), "Ada");
        assert_eq!(user("", "", "client").full_name(), "");
    }

    #[test]
    fn role_helpers() {
        assert!(user("A", "B", "attorney").is_attorney());
        assert!(user("A", "B", "client").is_client());
        assert!(user("A", "B", "unknown").role().is_none());
    }
}
