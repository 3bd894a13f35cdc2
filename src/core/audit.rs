//! Append-only audit trail.
//!
//! Every state-changing operation appends one LOGS row. Audit writes are
//! best-effort: a failed append is logged locally and swallowed so it can
//! never block a primary operation.

use crate::{
    entities::format_datetime,
    errors::Result,
    store::{RowPatch, TableStore, tables},
};
use chrono::Utc;
use tracing::warn;

/// Action names written to the `action` column.
pub mod actions {
    pub const ORDER_CREATED: &str = "ORDER_CREATED";
    pub const ORDER_ASSIGN: &str = "ORDER_ASSIGN";
    pub const ORDER_SENT: &str = "ORDER_SENT";
    pub const ORDER_CANCELLED: &str = "ORDER_CANCELLED";
    pub const SEAT_ASSIGNED: &str = "SEAT_ASSIGNED";
    pub const SEAT_MARK_PROBLEM: &str = "SEAT_MARK_PROBLEM";
    pub const SEAT_REPLACED: &str = "SEAT_REPLACED";
    pub const SEAT_RENEWED: &str = "SEAT_RENEWED";
    pub const SEAT_SKIP_RENEW: &str = "SEAT_SKIP_RENEW";
    pub const SEAT_RELEASE: &str = "SEAT_RELEASE";
    pub const ACCOUNT_RESTOCK: &str = "ACCOUNT_RESTOCK";
    pub const ACCOUNT_FALLBACK_PROMOTED: &str = "ACCOUNT_FALLBACK_PROMOTED";
}

/// Appends one audit record `{timestamp, action, actor, ref_id, note}`.
/// Failures are swallowed after a local warning.
pub async fn log_action<S: TableStore>(
    store: &S,
    action: &str,
    actor: &str,
    ref_id: &str,
    note: &str,
) {
    if let Err(err) = try_log(store, action, actor, ref_id, note).await {
        warn!(action, ref_id, %err, "audit append failed; continuing");
    }
}

async fn try_log<S: TableStore>(
    store: &S,
    action: &str,
    actor: &str,
    ref_id: &str,
    note: &str,
) -> Result<()> {
    let table = store.get_table(tables::LOGS).await?;
    let patch = RowPatch::new()
        .set("timestamp", format_datetime(Utc::now()))
        .set("action", action)
        .set("actor", actor)
        .set("ref_id", ref_id)
        .set("note", note);
    store.append_row(tables::LOGS, &table.headers, &patch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn appends_one_row_per_action() -> Result<()> {
        let store = MemoryStore::new();
        store
            .create_table(
                tables::LOGS,
                &["timestamp", "action", "actor", "ref_id", "note"],
            )
            .await;

        log_action(&store, actions::SEAT_ASSIGNED, "alice", "ORD-1", "seat S1").await;
        log_action(&store, actions::SEAT_RELEASE, "alice", "SEAT-1", "").await;

        let logs = store.get_table(tables::LOGS).await?;
        assert_eq!(logs.rows.len(), 2);
        let (_, rec) = logs.records().next().unwrap();
        assert_eq!(rec.get("action"), actions::SEAT_ASSIGNED);
        assert_eq!(rec.get("actor"), "alice");
        Ok(())
    }

    #[tokio::test]
    async fn missing_log_table_is_swallowed() {
        // No LOGS table at all: the append fails internally, the caller
        // never sees it.
        let store = MemoryStore::new();
        log_action(&store, actions::ORDER_CREATED, "alice", "ORD-1", "").await;
    }
}
