//! Authorization boundary - resolves a caller to an active admin.
//!
//! The engine trusts the actor string it is handed everywhere else; this is
//! the single gate in front of it. A configured owner username passes even
//! when absent from the `ADMIN_USERS` table, so a wiped sheet can never
//! lock the owner out.

use crate::{
    entities::{AdminStatus, AdminUser, Role},
    errors::{Error, Result},
    store::{TableStore, tables},
};

/// Resolves `username` to an active admin, or denies access.
///
/// Usernames compare case-insensitively. The optional `owner_username`
/// (from configuration) authenticates as OWNER regardless of the table.
pub async fn ensure_active<S: TableStore>(
    store: &S,
    owner_username: Option<&str>,
    username: &str,
) -> Result<AdminUser> {
    let normalized = username.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::AccessDenied {
            username: String::new(),
            reason: "caller has no username".to_string(),
        });
    }
    let owner_fallback = owner_username
        .is_some_and(|owner| owner.to_lowercase() == normalized)
        .then(|| AdminUser {
            username: normalized.clone(),
            role: Role::Owner,
            status: AdminStatus::Active,
        });

    let table = store.get_table(tables::ADMIN_USERS).await?;
    let found = table
        .records()
        .map(|(_, rec)| AdminUser::from_record(&rec))
        .find(|admin| admin.username.to_lowercase() == normalized);

    match found {
        Some(admin) if admin.status == AdminStatus::Active => Ok(admin),
        Some(_) => owner_fallback.ok_or_else(|| Error::AccessDenied {
            username: normalized,
            reason: "admin is deactivated".to_string(),
        }),
        None => owner_fallback.ok_or_else(|| Error::AccessDenied {
            username: normalized,
            reason: "not on the admin allowlist".to_string(),
        }),
    }
}

/// Whether this admin may reach owner-only surfaces.
#[must_use]
pub const fn is_owner(admin: &AdminUser) -> bool {
    matches!(admin.role, Role::Owner)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::store::{MemoryStore, RowPatch};
    use crate::test_utils::seed_tables;

    async fn seed_admin(store: &MemoryStore, username: &str, role: &str, status: &str) {
        let table = store.get_table(tables::ADMIN_USERS).await.unwrap();
        store
            .append_row(
                tables::ADMIN_USERS,
                &table.headers,
                &RowPatch::new()
                    .set("telegram_username", username)
                    .set("role", role)
                    .set("status", status),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn active_admin_passes_case_insensitively() -> Result<()> {
        let store = seed_tables().await;
        seed_admin(&store, "Alice", "ADMIN", "active").await;

        let admin = ensure_active(&store, None, "ALICE").await?;
        assert_eq!(admin.role, Role::Admin);
        assert!(!is_owner(&admin));
        Ok(())
    }

    #[tokio::test]
    async fn inactive_and_unknown_are_denied() -> Result<()> {
        let store = seed_tables().await;
        seed_admin(&store, "bob", "ADMIN", "inactive").await;

        assert!(matches!(
            ensure_active(&store, None, "bob").await.unwrap_err(),
            Error::AccessDenied { .. }
        ));
        assert!(matches!(
            ensure_active(&store, None, "mallory").await.unwrap_err(),
            Error::AccessDenied { .. }
        ));
        assert!(matches!(
            ensure_active(&store, None, "").await.unwrap_err(),
            Error::AccessDenied { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn configured_owner_passes_without_a_row() -> Result<()> {
        let store = seed_tables().await;
        let admin = ensure_active(&store, Some("Root"), "root").await?;
        assert_eq!(admin.role, Role::Owner);
        assert!(is_owner(&admin));
        Ok(())
    }
}
