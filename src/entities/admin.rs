//! Operator allowlist entity.

use super::truthy;
use crate::store::Record;

/// Operator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full access, including settings surfaces
    Owner,
    /// Day-to-day operator
    Admin,
}

impl Role {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().to_uppercase() == "OWNER" {
            Self::Owner
        } else {
            Self::Admin
        }
    }
}

/// Allowlist status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStatus {
    /// May operate the bot
    Active,
    /// Locked out
    Inactive,
}

/// One row of the `ADMIN_USERS` table.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminUser {
    /// Chat username, compared case-insensitively
    pub username: String,
    /// Role
    pub role: Role,
    /// Allowlist status
    pub status: AdminStatus,
}

impl AdminUser {
    /// Parses an `ADMIN_USERS` record.
    #[must_use]
    pub fn from_record(rec: &Record<'_>) -> Self {
        Self {
            username: rec.get("telegram_username").to_string(),
            role: Role::parse(rec.get("role")),
            status: if truthy(rec.get("status")) {
                AdminStatus::Active
            } else {
                AdminStatus::Inactive
            },
        }
    }
}
