//! Account inventory entity.

use super::{SeatMode, truthy};
use crate::store::{Record, RowId};

/// One row of the ACCOUNTS table: a platform login that seats draw
/// capacity from.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Handle of the backing row, needed for in-place promotion
    pub row: RowId,
    /// Stable identifier referenced by seats
    pub account_id: String,
    /// Platform this login belongs to
    pub platform: String,
    /// Login identity; doubles as the restock dedup key
    pub email: String,
    /// Capacity policy; HEAD accounts are invite-capable
    pub mode: SeatMode,
    /// Stored slot capacity (PRIVATE/HEAD are clamped to 1 at decision time)
    pub max_slot: u32,
    /// Inactive accounts never receive seats
    pub active: bool,
}

impl Account {
    /// Parses an ACCOUNTS record. Mode defaults to SHARING and capacity to
    /// 1, matching how half-filled inventory rows behave in the sheet.
    #[must_use]
    pub fn from_record(row: RowId, rec: &Record<'_>) -> Self {
        Self {
            row,
            account_id: rec.get("account_id").to_string(),
            platform: rec.get("platform").to_string(),
            email: rec.get("email").to_string(),
            mode: SeatMode::parse(rec.get("mode")).unwrap_or(SeatMode::Sharing),
            max_slot: rec.get("max_slot").trim().parse().unwrap_or(1),
            active: truthy(rec.get("status")),
        }
    }
}
