//! Core business logic - the seat/account allocation engine.
//!
//! Everything in here is framework-agnostic: free async functions over a
//! [`TableStore`](crate::store::TableStore) plus plain arguments, so the
//! chat layer, cron jobs, and tests all call the same code paths.
//!
//! There are no cross-write transactions. Multi-step operations (mark
//! problem + reassign, cancel + release-all) run as sequences of idempotent
//! single-row writes; a failure in the middle leaves detectable state (a
//! PROBLEM seat with no successor) that the audit trail and seat listings
//! surface to an operator.

/// Authorization boundary over the `ADMIN_USERS` table
pub mod admin;
/// Seat Allocator - find-or-create a seat for an order
pub mod allocator;
/// Best-effort append-only audit trail
pub mod audit;
/// Capacity Counter - per-account used-slot math
pub mod capacity;
/// Catalog Reader - active product definitions
pub mod catalog;
/// Seat Lifecycle Manager - send, replace, renew, release, expire, cancel
pub mod lifecycle;
/// Order creation and listings
pub mod orders;
/// Stock and sales summaries
pub mod report;
/// Restock/Dedup Engine - bulk inventory input
pub mod restock;

use crate::{
    entities::{Order, Seat},
    errors::{Error, Result},
    store::{Table, TableStore, tables},
};

/// Loads the ORDERS table and the order row for `order_id`.
pub(crate) async fn load_order<S: TableStore>(
    store: &S,
    order_id: &str,
) -> Result<(Table, Order)> {
    let table = store.get_table(tables::ORDERS).await?;
    let found = table
        .find_by("order_id", order_id)
        .map(|(row, rec)| Order::from_record(row, &rec));
    match found {
        Some(order) => Ok((table, order)),
        None => Err(Error::OrderNotFound {
            order_id: order_id.to_string(),
        }),
    }
}

/// Loads the SEATS table and the seat row for `seat_id`.
pub(crate) async fn load_seat<S: TableStore>(store: &S, seat_id: &str) -> Result<(Table, Seat)> {
    let table = store.get_table(tables::SEATS).await?;
    let found = table
        .find_by("seat_id", seat_id)
        .map(|(row, rec)| Seat::from_record(row, &rec));
    match found {
        Some(seat) => Ok((table, seat)),
        None => Err(Error::SeatNotFound {
            seat_id: seat_id.to_string(),
        }),
    }
}

/// Login identity (email) of an account, for operator display. Unknown
/// accounts read as an empty identity rather than failing a primary flow.
pub(crate) async fn account_email<S: TableStore>(store: &S, account_id: &str) -> Result<String> {
    let table = store.get_table(tables::ACCOUNTS).await?;
    Ok(table
        .find_by("account_id", account_id)
        .map(|(_, rec)| rec.get("email").to_string())
        .unwrap_or_default())
}
