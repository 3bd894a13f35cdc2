//! Capacity Counter - per-account used-slot math.
//!
//! Pure functions over a snapshot of the SEATS table. The view is
//! recomputed from a fresh full read on every allocation call; there is no
//! cache, so staleness is bounded by one store round-trip.

use crate::entities::{Account, Product, SeatMode, SeatStatus};
use crate::store::Table;
use std::collections::HashMap;

/// Counts, per account id, the seats currently holding a slot
/// (RESERVED, `PENDING_CONFIRM`, or ACTIVE). O(seats), no side effects.
#[must_use]
pub fn used_slots(seats: &Table) -> HashMap<String, u32> {
    let mut used: HashMap<String, u32> = HashMap::new();
    for (_, rec) in seats.records() {
        let holds = SeatStatus::parse(rec.get("status")).is_some_and(SeatStatus::holds_slot);
        if holds {
            *used.entry(rec.get("account_id").to_string()).or_default() += 1;
        }
    }
    used
}

/// Effective slot capacity of `account` when allocating for `product`.
///
/// PRIVATE and HEAD accounts are exclusive regardless of the stored value.
/// For SHARING, the product's `sharing_max_slot` overrides the account's
/// own capacity; both default to 1.
#[must_use]
pub fn effective_max_slot(product: &Product, account: &Account) -> u32 {
    match account.mode {
        SeatMode::Private | SeatMode::Head => 1,
        SeatMode::Sharing => product
            .sharing_max_slot
            .unwrap_or_else(|| account.max_slot.max(1)),
    }
}
