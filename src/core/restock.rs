//! Restock/Dedup Engine - bulk account input without duplicate inventory.
//!
//! Dedup is two-phase because other operators may restock concurrently:
//! once against the identity set when the operator finishes typing (so the
//! confirmation screen shows honest numbers), and again inside
//! [`restock_accounts`] immediately before the append, discarding
//! identities that appeared in the meantime. The second pass reports a
//! skipped count instead of failing - the race is expected, not an error.

use super::audit;
use crate::{
    entities::{SeatMode, format_datetime},
    errors::Result,
    store::{RowPatch, TableStore, tables},
};
use chrono::Utc;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Splits operator input into candidate identity lines.
///
/// One line per account, free format (`email`, `email|password`,
/// `email|password|profile|pin`); the whole trimmed line is the identity.
/// In-input duplicates collapse, first occurrence wins.
#[must_use]
pub fn parse_restock_lines(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert((*line).to_string()))
        .map(ToString::to_string)
        .collect()
}

/// Drops lines whose identity is already stored. Returns the survivors and
/// how many were dropped.
#[must_use]
pub fn dedupe_against(lines: &[String], existing: &HashSet<String>) -> (Vec<String>, usize) {
    let kept: Vec<String> = lines
        .iter()
        .filter(|line| !existing.contains(*line))
        .cloned()
        .collect();
    let skipped = lines.len() - kept.len();
    (kept, skipped)
}

/// Identity strings currently stored for `platform`, optionally narrowed
/// to one seat mode. This is the dedup universe.
pub async fn list_account_identities<S: TableStore>(
    store: &S,
    platform: &str,
    mode: Option<SeatMode>,
) -> Result<HashSet<String>> {
    let accounts = store.get_table(tables::ACCOUNTS).await?;
    Ok(accounts
        .records()
        .filter(|(_, rec)| rec.get("platform") == platform)
        .filter(|(_, rec)| mode.is_none_or(|m| SeatMode::parse(rec.get("mode")) == Some(m)))
        .filter_map(|(_, rec)| rec.get_opt("email").map(ToString::to_string))
        .collect())
}

/// One account to add to inventory.
#[derive(Debug, Clone)]
pub struct RestockAccountInput {
    /// Platform the login belongs to (dedup scope)
    pub platform: String,
    /// Capacity policy for the new account
    pub mode: SeatMode,
    /// Identity line as entered by the operator
    pub identity: String,
    /// Slot capacity; 1 unless the operator says otherwise
    pub max_slot: u32,
}

/// Outcome of [`restock_accounts`].
#[derive(Debug, Clone)]
pub struct RestockOutcome {
    /// Ids of the account rows actually appended
    pub created: Vec<String>,
    /// Entries dropped by the write-time dedup re-check (concurrent
    /// restock by another operator)
    pub skipped_existing: usize,
}

/// Appends one ACCOUNTS row per entry, re-checking the identity set
/// immediately before writing. Identities that appeared since the
/// operator's confirmation are skipped and counted, never duplicated.
pub async fn restock_accounts<S: TableStore>(
    store: &S,
    entries: &[RestockAccountInput],
    actor: &str,
) -> Result<RestockOutcome> {
    let accounts = store.get_table(tables::ACCOUNTS).await?;
    let platforms: HashSet<&str> = entries.iter().map(|e| e.platform.as_str()).collect();
    let mut existing = HashSet::new();
    for platform in platforms {
        existing.extend(list_account_identities(store, platform, None).await?);
    }

    let mut created = Vec::new();
    let mut skipped = 0usize;
    for entry in entries {
        if !entry.identity.is_empty() && !existing.insert(entry.identity.clone()) {
            skipped += 1;
            continue;
        }
        let account_id = format!("ACC-{}", Uuid::new_v4());
        let patch = RowPatch::new()
            .set("account_id", &*account_id)
            .set("platform", &*entry.platform)
            .set("mode", entry.mode.as_str())
            .set("email", &*entry.identity)
            .set("max_slot", entry.max_slot.max(1).to_string())
            .set("status", "active")
            .set("created_at", format_datetime(Utc::now()));
        store
            .append_row(tables::ACCOUNTS, &accounts.headers, &patch)
            .await?;
        audit::log_action(
            store,
            audit::actions::ACCOUNT_RESTOCK,
            actor,
            &account_id,
            &format!("{} {}", entry.platform, entry.mode.as_str()),
        )
        .await;
        created.push(account_id);
    }
    info!(
        created = created.len(),
        skipped, "restock appended account rows"
    );
    Ok(RestockOutcome {
        created,
        skipped_existing: skipped,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{AccountSpec, seed_tables};

    fn entry(platform: &str, identity: &str) -> RestockAccountInput {
        RestockAccountInput {
            platform: platform.to_string(),
            mode: SeatMode::Sharing,
            identity: identity.to_string(),
            max_slot: 1,
        }
    }

    #[test]
    fn parsing_trims_and_collapses_duplicates() {
        let lines = parse_restock_lines("a@x|pass\n\n  a@x|pass  \nb@x\n");
        assert_eq!(lines, vec!["a@x|pass".to_string(), "b@x".to_string()]);
    }

    #[test]
    fn dedupe_reports_dropped_count() {
        let existing: HashSet<String> = ["x@x".to_string()].into();
        let (kept, skipped) =
            dedupe_against(&["x@x".to_string(), "y@x".to_string()], &existing);
        assert_eq!(kept, vec!["y@x".to_string()]);
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn identities_scope_by_platform_and_mode() -> Result<()> {
        let store = seed_tables().await;
        AccountSpec::sharing("ACC-1")
            .platform("netflix")
            .email("n1@x")
            .insert(&store)
            .await?;
        AccountSpec::private("ACC-2")
            .platform("netflix")
            .email("n2@x")
            .insert(&store)
            .await?;
        AccountSpec::sharing("ACC-3")
            .platform("spotify")
            .email("s1@x")
            .insert(&store)
            .await?;

        let all = list_account_identities(&store, "netflix", None).await?;
        assert_eq!(all.len(), 2);
        let sharing_only =
            list_account_identities(&store, "netflix", Some(SeatMode::Sharing)).await?;
        assert_eq!(sharing_only, ["n1@x".to_string()].into());
        Ok(())
    }

    #[tokio::test]
    async fn write_time_recheck_absorbs_concurrent_restock() -> Result<()> {
        let store = seed_tables().await;
        // Input [x, x, y] deduped at input time to [x, y].
        let lines = parse_restock_lines("x@mail\nx@mail\ny@mail");
        let existing = list_account_identities(&store, "netflix", None).await?;
        let (kept, skipped) = dedupe_against(&lines, &existing);
        assert_eq!(kept.len(), 2);
        assert_eq!(skipped, 0);

        // Another operator inserts `x` between confirmation and write.
        AccountSpec::sharing("ACC-RACE")
            .platform("netflix")
            .email("x@mail")
            .insert(&store)
            .await?;

        let entries: Vec<RestockAccountInput> =
            kept.iter().map(|l| entry("netflix", l)).collect();
        let outcome = restock_accounts(&store, &entries, "alice").await?;
        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.skipped_existing, 1);

        // Final stored set for the platform is {x, y} with no duplicate x.
        let final_set = list_account_identities(&store, "netflix", None).await?;
        assert_eq!(final_set.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn restock_stamps_active_rows_with_defaults() -> Result<()> {
        let store = seed_tables().await;
        let outcome = restock_accounts(&store, &[entry("netflix", "a@x|pw")], "alice").await?;
        assert_eq!(outcome.created.len(), 1);

        let accounts = store.get_table(tables::ACCOUNTS).await?;
        let (_, rec) = accounts.find_by("email", "a@x|pw").unwrap();
        assert_eq!(rec.get("status"), "active");
        assert_eq!(rec.get("max_slot"), "1");
        assert!(rec.get("account_id").starts_with("ACC-"));
        Ok(())
    }
}
