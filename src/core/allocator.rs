//! Seat Allocator - finds or creates the seat that fulfills an order.
//!
//! The decision sequence, in order:
//! 1. idempotent reuse of the order's existing held seat (zero writes),
//! 2. FIFO reuse of RELEASED capacity (SHARING + LOGIN only),
//! 3. first-available candidate account in table row order,
//! 4. fallback promotion of an idle PRIVATE account into the SHARING pool
//!    when the product's policy allows it,
//! 5. `NeedNewAccount` - the operator must restock.
//!
//! No lock is held across the read-candidates/write-seat window; a true
//! concurrent double-assignment is accepted as a rare, low-consequence race
//! reconciled manually via the audit trail.

use super::{account_email, audit, capacity, catalog, load_order};
use crate::{
    entities::{
        Account, FallbackPolicy, Fulfillment, Order, OrderStatus, Product, Seat, SeatMode,
        SeatStatus, format_datetime,
    },
    errors::{Error, Result},
    store::{RowPatch, Table, TableStore, tables},
};
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

/// Arguments for one allocation call.
#[derive(Debug, Clone)]
pub struct AssignSeatRequest {
    /// Order to fulfill; must exist and (for the public entry point) be
    /// PENDING_SEND
    pub order_id: String,
    /// Buyer identifier stamped onto the seat
    pub buyer_id: String,
    /// Buyer contact stamped onto the seat
    pub buyer_email: String,
    /// Override for the product's own duration, in days
    pub duration_days: Option<i64>,
    /// Invite address for INVITE fulfillment; defaults to the buyer email
    pub invite_email: Option<String>,
    /// Operator performing the allocation
    pub actor: String,
}

/// Which path produced the returned seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSource {
    /// The order already held a seat; nothing was written
    ExistingSeat,
    /// A RELEASED seat was re-stamped for this order
    ReleasedReuse,
    /// A fresh seat row was appended
    NewSeat,
}

/// Outcome of a successful allocation.
#[derive(Debug, Clone)]
pub struct SeatAssignment {
    /// The seat now bound to the order
    pub seat: Seat,
    /// Login identity of the backing account, for operator display
    pub account_email: String,
    /// Whether a PRIVATE account was promoted to serve this allocation
    pub fallback_used: bool,
    /// Which path produced the seat
    pub source: AssignmentSource,
}

/// Assigns a seat to an order.
///
/// # Errors
/// `InvalidState` unless the order is PENDING_SEND; `ProductNotFound` if
/// the order references an inactive product; `NeedNewAccount` when
/// capacity is exhausted and no fallback applies.
pub async fn assign_seat<S: TableStore>(
    store: &S,
    req: AssignSeatRequest,
) -> Result<SeatAssignment> {
    let (_, order) = load_order(store, &req.order_id).await?;
    if order.status != OrderStatus::PendingSend {
        return Err(Error::InvalidState {
            message: format!(
                "seat assignment requires order status PENDING_SEND, {} is {}",
                order.order_id,
                order.status.as_str()
            ),
        });
    }
    allocate(store, &order, &req).await
}

/// Allocation behind the status gate. The replacement flow enters here
/// directly because a replacement targets an order that was already sent.
pub(crate) async fn allocate<S: TableStore>(
    store: &S,
    order: &Order,
    req: &AssignSeatRequest,
) -> Result<SeatAssignment> {
    let product = catalog::find_product_by_id(store, &order.product_id).await?;
    let duration_days = req.duration_days.unwrap_or(product.duration_days);
    let seats = store.get_table(tables::SEATS).await?;

    // 1. Idempotent reuse: at most one held seat may exist per order.
    let existing = seats
        .records()
        .map(|(row, rec)| Seat::from_record(row, &rec))
        .find(|seat| seat.order_id == order.order_id && seat.status.holds_slot());
    if let Some(seat) = existing {
        let email = account_email(store, &seat.account_id).await?;
        return Ok(SeatAssignment {
            seat,
            account_email: email,
            fallback_used: false,
            source: AssignmentSource::ExistingSeat,
        });
    }

    let accounts = store.get_table(tables::ACCOUNTS).await?;
    let used = capacity::used_slots(&seats);

    // 2. FIFO reuse of released capacity, SHARING + LOGIN only.
    if product.fulfillment == Fulfillment::Login && product.seat_mode == SeatMode::Sharing {
        if let Some(seat) = oldest_released(&seats, &accounts, &used, &product) {
            return reuse_released(store, &seats, seat, order, req, &product, duration_days).await;
        }
    }

    // 3./4. Candidate selection, falling back to promotion when allowed.
    let (account, fallback_used) = match pick_candidate(&accounts, &used, &product) {
        Some(account) => (account, false),
        None => {
            let promoted = promote_private_account(store, &accounts, &used, &product, req).await?;
            match promoted {
                Some(account) => (account, true),
                None => {
                    return Err(Error::NeedNewAccount {
                        product_id: product.product_id.clone(),
                    });
                }
            }
        }
    };

    // 6. Fresh seat row.
    create_seat(
        store,
        &seats,
        order,
        req,
        &product,
        &account,
        duration_days,
        fallback_used,
    )
    .await
}

/// Oldest-released seat whose backing account can still serve the product:
/// active, SHARING, same platform, capacity left (a released row holds no
/// slot, so re-stamping it adds one). Unset `released_at` is treated as
/// epoch; earlier row order breaks ties so drain order is deterministic.
fn oldest_released(
    seats: &Table,
    accounts: &Table,
    used: &std::collections::HashMap<String, u32>,
    product: &Product,
) -> Option<Seat> {
    let eligible: std::collections::HashMap<String, Account> = accounts
        .records()
        .map(|(row, rec)| Account::from_record(row, &rec))
        .filter(|acc| {
            acc.active && acc.mode == SeatMode::Sharing && acc.platform == product.platform
        })
        .map(|acc| (acc.account_id.clone(), acc))
        .collect();

    seats
        .records()
        .map(|(row, rec)| Seat::from_record(row, &rec))
        .filter(|seat| seat.status == SeatStatus::Released)
        .filter(|seat| {
            eligible.get(&seat.account_id).is_some_and(|acc| {
                used.get(&acc.account_id).copied().unwrap_or(0)
                    < capacity::effective_max_slot(product, acc)
            })
        })
        .min_by_key(|seat| seat.released_at.map_or(0, |dt| dt.timestamp_millis()))
}

async fn reuse_released<S: TableStore>(
    store: &S,
    seats: &Table,
    seat: Seat,
    order: &Order,
    req: &AssignSeatRequest,
    product: &Product,
    duration_days: i64,
) -> Result<SeatAssignment> {
    let now = Utc::now();
    let end = now + Duration::days(duration_days);
    let patch = RowPatch::new()
        .set("status", SeatStatus::Reserved.as_str())
        .set("order_id", &*order.order_id)
        .set("buyer_id", &*req.buyer_id)
        .set("buyer_email", &*req.buyer_email)
        .set("start_date", format_datetime(now))
        .set("end_date", format_datetime(end))
        .set("released_at", "")
        .set("seat_mode", product.seat_mode.as_str())
        .set("invite_email", "")
        .set("invite_status", "");
    store
        .update_row(tables::SEATS, seat.row, &seats.headers, &patch)
        .await?;
    info!(
        seat_id = %seat.seat_id,
        order_id = %order.order_id,
        "reused released seat"
    );
    audit::log_action(
        store,
        audit::actions::SEAT_ASSIGNED,
        &req.actor,
        &order.order_id,
        &format!("reuse seat {}", seat.seat_id),
    )
    .await;

    let email = account_email(store, &seat.account_id).await?;
    Ok(SeatAssignment {
        seat: Seat {
            status: SeatStatus::Reserved,
            order_id: order.order_id.clone(),
            buyer_id: req.buyer_id.clone(),
            buyer_email: req.buyer_email.clone(),
            start_date: Some(now),
            end_date: Some(end),
            released_at: None,
            seat_mode: Some(product.seat_mode),
            invite_email: None,
            invite_status: None,
            ..seat
        },
        account_email: email,
        fallback_used: false,
        source: AssignmentSource::ReleasedReuse,
    })
}

/// First active account, in table row order, matching the product's
/// fulfillment/mode filter with capacity left.
fn pick_candidate(
    accounts: &Table,
    used: &std::collections::HashMap<String, u32>,
    product: &Product,
) -> Option<Account> {
    accounts
        .records()
        .map(|(row, rec)| Account::from_record(row, &rec))
        .filter(|acc| acc.active)
        .find(|acc| {
            let current = used.get(&acc.account_id).copied().unwrap_or(0);
            match (product.fulfillment, product.seat_mode) {
                (Fulfillment::Invite, _) => acc.mode == SeatMode::Head && current == 0,
                (Fulfillment::Login, SeatMode::Sharing) => {
                    acc.mode == SeatMode::Sharing
                        && current < capacity::effective_max_slot(product, acc)
                }
                // PRIVATE orders, and HEAD products explicitly flagged LOGIN
                (Fulfillment::Login, SeatMode::Private | SeatMode::Head) => {
                    acc.mode == SeatMode::Private && current == 0
                }
            }
        })
}

/// Promotes the first unused PRIVATE account into the SHARING pool,
/// mutating the account row in place. Applies only to SHARING + LOGIN
/// products whose policy opts in.
async fn promote_private_account<S: TableStore>(
    store: &S,
    accounts: &Table,
    used: &std::collections::HashMap<String, u32>,
    product: &Product,
    req: &AssignSeatRequest,
) -> Result<Option<Account>> {
    let applies = product.fulfillment == Fulfillment::Login
        && product.seat_mode == SeatMode::Sharing
        && product.fallback_policy == FallbackPolicy::PrivateUnusedToSharing;
    if !applies {
        return Ok(None);
    }

    let candidate = accounts
        .records()
        .map(|(row, rec)| Account::from_record(row, &rec))
        .filter(|acc| acc.active && acc.mode == SeatMode::Private)
        .find(|acc| used.get(&acc.account_id).copied().unwrap_or(0) == 0);
    let Some(mut account) = candidate else {
        return Ok(None);
    };

    let new_max = product
        .sharing_max_slot
        .unwrap_or_else(|| account.max_slot.max(1));
    let patch = RowPatch::new()
        .set("mode", SeatMode::Sharing.as_str())
        .set("max_slot", new_max.to_string());
    store
        .update_row(tables::ACCOUNTS, account.row, &accounts.headers, &patch)
        .await?;
    info!(
        account_id = %account.account_id,
        max_slot = new_max,
        "promoted idle private account into the sharing pool"
    );
    audit::log_action(
        store,
        audit::actions::ACCOUNT_FALLBACK_PROMOTED,
        &req.actor,
        &account.account_id,
        &format!("private -> sharing for product {}", product.product_id),
    )
    .await;

    account.mode = SeatMode::Sharing;
    account.max_slot = new_max;
    Ok(Some(account))
}

#[allow(clippy::too_many_arguments)]
async fn create_seat<S: TableStore>(
    store: &S,
    seats: &Table,
    order: &Order,
    req: &AssignSeatRequest,
    product: &Product,
    account: &Account,
    duration_days: i64,
    fallback_used: bool,
) -> Result<SeatAssignment> {
    let seat_id = format!("SEAT-{}", Uuid::new_v4());
    let now = Utc::now();
    let end = now + Duration::days(duration_days);

    let mut patch = RowPatch::new()
        .set("seat_id", &*seat_id)
        .set("account_id", &*account.account_id)
        .set("order_id", &*order.order_id)
        .set("buyer_id", &*req.buyer_id)
        .set("buyer_email", &*req.buyer_email)
        .set("start_date", format_datetime(now))
        .set("end_date", format_datetime(end))
        .set("status", SeatStatus::Reserved.as_str())
        .set("released_at", "")
        .set("seat_mode", product.seat_mode.as_str());

    let mut invite_email = None;
    let mut invite_status = None;
    if product.fulfillment == Fulfillment::Invite {
        let email = req
            .invite_email
            .clone()
            .unwrap_or_else(|| req.buyer_email.clone());
        patch = patch
            .set("invite_email", &*email)
            .set("invite_status", "PENDING_INVITE");
        invite_email = Some(email);
        invite_status = Some(crate::entities::InviteStatus::PendingInvite);
    }

    store.append_row(tables::SEATS, &seats.headers, &patch).await?;
    info!(
        seat_id = %seat_id,
        account_id = %account.account_id,
        order_id = %order.order_id,
        fallback_used,
        "created seat"
    );
    audit::log_action(
        store,
        audit::actions::SEAT_ASSIGNED,
        &req.actor,
        &order.order_id,
        &format!("seat {seat_id} acc {}", account.account_id),
    )
    .await;

    // Re-read to hand back the row handle the store actually assigned.
    let (_, seat) = super::load_seat(store, &seat_id).await?;
    debug_assert_eq!(seat.invite_email, invite_email);
    debug_assert_eq!(seat.invite_status, invite_status);

    Ok(SeatAssignment {
        seat,
        account_email: account.email.clone(),
        fallback_used,
        source: AssignmentSource::NewSeat,
    })
}
