//! Seat Lifecycle Manager - everything that happens to a seat after
//! allocation: send, replace, renew, release, the daily expiry sweep, and
//! order cancellation.
//!
//! Repeat invocations are acknowledged, not failed: the outcome structs
//! carry `already_*` flags the chat layer surfaces as friendly
//! confirmations instead of errors.

use super::{allocator, audit, catalog, load_order, load_seat};
use crate::{
    entities::{
        Fulfillment, InviteStatus, OrderStatus, Seat, SeatMode, SeatStatus, format_datetime,
    },
    errors::{Error, Result},
    store::{RowPatch, Table, TableStore, tables},
};
use chrono::{Duration, NaiveDate, Utc};
use tracing::info;

/// Outcome of [`mark_order_sent`].
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// True when no seat needed updating and nothing was written
    pub already_sent: bool,
    /// Seats flipped to ACTIVE (or invite-sent) by this call
    pub updated_seats: usize,
}

/// Marks an order's access as delivered.
///
/// Every seat under the order still RESERVED (or, for INVITE fulfillment,
/// still pending its invite) gets its dates stamped if unset and flips to
/// ACTIVE / `INVITE_SENT`; the order itself goes ACTIVE. Idempotent: when
/// no seat needs updating the call reports `already_sent` and writes
/// nothing.
pub async fn mark_order_sent<S: TableStore>(
    store: &S,
    order_id: &str,
    actor: &str,
) -> Result<SendOutcome> {
    let (orders, order) = load_order(store, order_id).await?;
    let product = catalog::find_product_by_id(store, &order.product_id).await?;
    let seats = store.get_table(tables::SEATS).await?;

    let mut updated = 0usize;
    for (row, rec) in seats.records() {
        let seat = Seat::from_record(row, &rec);
        if seat.order_id != order_id {
            continue;
        }
        let invite_pending = product.fulfillment == Fulfillment::Invite
            && seat.invite_status == Some(InviteStatus::PendingInvite);
        if seat.status != SeatStatus::Reserved && !invite_pending {
            continue;
        }

        let mut patch = RowPatch::new().set("status", SeatStatus::Active.as_str());
        let now = Utc::now();
        if seat.start_date.is_none() {
            patch = patch.set("start_date", format_datetime(now));
        }
        if seat.end_date.is_none() {
            patch = patch.set(
                "end_date",
                format_datetime(now + Duration::days(product.duration_days)),
            );
        }
        if invite_pending {
            patch = patch.set("invite_status", InviteStatus::InviteSent.as_str());
        }
        store
            .update_row(tables::SEATS, seat.row, &seats.headers, &patch)
            .await?;
        updated += 1;
    }

    if updated == 0 {
        return Ok(SendOutcome {
            already_sent: true,
            updated_seats: 0,
        });
    }

    store
        .update_row(
            tables::ORDERS,
            order.row,
            &orders.headers,
            &RowPatch::new().set("status", OrderStatus::Active.as_str()),
        )
        .await?;
    info!(order_id, updated, "order marked sent");
    audit::log_action(store, audit::actions::ORDER_SENT, actor, order_id, "").await;
    Ok(SendOutcome {
        already_sent: false,
        updated_seats: updated,
    })
}

/// Outcome of [`replace_seat`].
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    /// The successor seat now serving the order
    pub seat: Seat,
    /// Login identity of the successor's account
    pub account_email: String,
    /// True when a live replacement already existed and nothing new was
    /// allocated
    pub already_replaced: bool,
    /// Whether the replacement consumed a fallback promotion
    pub fallback_used: bool,
}

/// Marks a seat PROBLEM and allocates a successor for the same order.
///
/// The successor inherits the buyer identity and any invite address from
/// the broken seat. For LOGIN modes the successor is activated immediately
/// (the buyer already had access and gets new credentials on the spot);
/// HEAD seats stay RESERVED until the invite is confirmed sent.
///
/// The mark-problem and reassign writes are not atomic. If the second
/// fails, the PROBLEM seat without a successor is left visible to
/// operators by design.
pub async fn replace_seat<S: TableStore>(
    store: &S,
    seat_id: &str,
    actor: &str,
    reason: &str,
) -> Result<ReplaceOutcome> {
    let reason = if reason.is_empty() { "problem" } else { reason };
    let (seats, seat) = load_seat(store, seat_id).await?;
    let (_, order) = load_order(store, &seat.order_id).await?;
    if order.status == OrderStatus::Cancelled {
        return Err(Error::InvalidState {
            message: format!("cannot replace a seat of cancelled order {}", order.order_id),
        });
    }
    let product = catalog::find_product_by_id(store, &order.product_id).await?;

    store
        .update_row(
            tables::SEATS,
            seat.row,
            &seats.headers,
            &RowPatch::new().set("status", SeatStatus::Problem.as_str()),
        )
        .await?;
    audit::log_action(store, audit::actions::SEAT_MARK_PROBLEM, actor, seat_id, reason).await;

    let req = allocator::AssignSeatRequest {
        order_id: order.order_id.clone(),
        buyer_id: if seat.buyer_id.is_empty() {
            order.buyer_id.clone()
        } else {
            seat.buyer_id.clone()
        },
        buyer_email: if seat.buyer_email.is_empty() {
            order.buyer_email.clone()
        } else {
            seat.buyer_email.clone()
        },
        duration_days: None,
        invite_email: seat.invite_email.clone(),
        actor: actor.to_string(),
    };
    let assignment = allocator::allocate(store, &order, &req).await?;
    let already_replaced = assignment.source == allocator::AssignmentSource::ExistingSeat;

    let seat = if product.seat_mode == SeatMode::Head || already_replaced {
        assignment.seat
    } else {
        activate_seat(store, &assignment.seat.seat_id).await?
    };

    if !already_replaced {
        info!(old = seat_id, new = %seat.seat_id, "seat replaced");
        audit::log_action(
            store,
            audit::actions::SEAT_REPLACED,
            actor,
            &order.order_id,
            &format!("old {seat_id} -> {}", seat.seat_id),
        )
        .await;
    }
    Ok(ReplaceOutcome {
        seat,
        account_email: assignment.account_email,
        already_replaced,
        fallback_used: assignment.fallback_used,
    })
}

/// Flips a seat to ACTIVE, stamping start/end with now when unset.
async fn activate_seat<S: TableStore>(store: &S, seat_id: &str) -> Result<Seat> {
    let (seats, mut seat) = load_seat(store, seat_id).await?;
    let now = Utc::now();
    let mut patch = RowPatch::new().set("status", SeatStatus::Active.as_str());
    if seat.start_date.is_none() {
        patch = patch.set("start_date", format_datetime(now));
        seat.start_date = Some(now);
    }
    if seat.end_date.is_none() {
        patch = patch.set("end_date", format_datetime(now));
        seat.end_date = Some(now);
    }
    store
        .update_row(tables::SEATS, seat.row, &seats.headers, &patch)
        .await?;
    seat.status = SeatStatus::Active;
    Ok(seat)
}

/// Outcome of [`confirm_renew`].
#[derive(Debug, Clone)]
pub struct RenewOutcome {
    /// The renewed seat
    pub seat: Seat,
    /// True when the seat was already ACTIVE and nothing was written
    pub already_renewed: bool,
}

/// Extends a seat by the product's duration counted from its current end
/// date (never from now: a renewal paid early must not shorten the
/// window), flips it back to ACTIVE, and clears any stale `released_at`.
pub async fn confirm_renew<S: TableStore>(
    store: &S,
    seat_id: &str,
    actor: &str,
) -> Result<RenewOutcome> {
    let (seats, mut seat) = load_seat(store, seat_id).await?;
    if seat.status == SeatStatus::Active {
        return Ok(RenewOutcome {
            seat,
            already_renewed: true,
        });
    }
    let (_, order) = load_order(store, &seat.order_id).await?;
    let product = catalog::find_product_by_id(store, &order.product_id).await?;

    let current_end = seat.end_date.unwrap_or_else(Utc::now);
    let new_end = current_end + Duration::days(product.duration_days);
    store
        .update_row(
            tables::SEATS,
            seat.row,
            &seats.headers,
            &RowPatch::new()
                .set("status", SeatStatus::Active.as_str())
                .set("end_date", format_datetime(new_end))
                .set("released_at", ""),
        )
        .await?;
    audit::log_action(
        store,
        audit::actions::SEAT_RENEWED,
        actor,
        seat_id,
        &format!("order {}", seat.order_id),
    )
    .await;

    seat.status = SeatStatus::Active;
    seat.end_date = Some(new_end);
    seat.released_at = None;
    Ok(RenewOutcome {
        seat,
        already_renewed: false,
    })
}

/// Outcome of [`skip_renew`].
#[derive(Debug, Clone)]
pub struct SkipOutcome {
    /// The (now released) seat
    pub seat: Seat,
    /// True when the seat was already RELEASED and nothing was written
    pub already_skipped: bool,
}

/// Declines a renewal: the seat is released and its capacity returns to
/// the recyclable pool.
pub async fn skip_renew<S: TableStore>(store: &S, seat_id: &str, actor: &str) -> Result<SkipOutcome> {
    let (_, seat) = load_seat(store, seat_id).await?;
    if seat.status == SeatStatus::Released {
        return Ok(SkipOutcome {
            seat,
            already_skipped: true,
        });
    }
    let seat = release_seat(store, seat_id, "skip_renew", actor).await?;
    audit::log_action(store, audit::actions::SEAT_SKIP_RENEW, actor, seat_id, "").await;
    Ok(SkipOutcome {
        seat,
        already_skipped: false,
    })
}

/// Releases a seat: status RELEASED, `released_at` stamped now. The row
/// stays in the table as a recyclable capacity marker.
pub async fn release_seat<S: TableStore>(
    store: &S,
    seat_id: &str,
    reason: &str,
    actor: &str,
) -> Result<Seat> {
    let (seats, mut seat) = load_seat(store, seat_id).await?;
    let now = Utc::now();
    store
        .update_row(
            tables::SEATS,
            seat.row,
            &seats.headers,
            &RowPatch::new()
                .set("status", SeatStatus::Released.as_str())
                .set("released_at", format_datetime(now)),
        )
        .await?;
    info!(seat_id, reason, "seat released");
    audit::log_action(store, audit::actions::SEAT_RELEASE, actor, seat_id, reason).await;
    seat.status = SeatStatus::Released;
    seat.released_at = Some(now);
    Ok(seat)
}

/// A seat surfaced by the expiry sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiringSeat {
    pub seat_id: String,
    pub order_id: String,
    pub account_id: String,
    pub buyer_id: String,
    pub buyer_email: String,
    pub end_date: Option<chrono::DateTime<Utc>>,
}

/// Pure half of the sweep: ACTIVE seats whose end date falls on `date`.
#[must_use]
pub fn find_expiring(seats: &Table, date: NaiveDate) -> Vec<Seat> {
    seats
        .records()
        .map(|(row, rec)| Seat::from_record(row, &rec))
        .filter(|seat| {
            seat.status == SeatStatus::Active
                && seat.end_date.is_some_and(|end| end.date_naive() == date)
        })
        .collect()
}

/// Lists seats expiring today and flips each to `PENDING_CONFIRM` as it is
/// listed.
///
/// The listing is deliberately side-effecting: a second sweep the same day
/// returns only seats that went ACTIVE since the first one, because
/// already-PENDING_CONFIRM seats no longer match. Callers depend on that
/// exclusion to avoid double-prompting operators.
pub async fn list_expiring_today<S: TableStore>(store: &S) -> Result<Vec<ExpiringSeat>> {
    let seats = store.get_table(tables::SEATS).await?;
    let today = Utc::now().date_naive();
    let mut expiring = Vec::new();
    for seat in find_expiring(&seats, today) {
        store
            .update_row(
                tables::SEATS,
                seat.row,
                &seats.headers,
                &RowPatch::new().set("status", SeatStatus::PendingConfirm.as_str()),
            )
            .await?;
        expiring.push(ExpiringSeat {
            seat_id: seat.seat_id,
            order_id: seat.order_id,
            account_id: seat.account_id,
            buyer_id: seat.buyer_id,
            buyer_email: seat.buyer_email,
            end_date: seat.end_date,
        });
    }
    if !expiring.is_empty() {
        info!(count = expiring.len(), "seats moved to PENDING_CONFIRM");
    }
    Ok(expiring)
}

/// Outcome of [`cancel_order`].
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    /// Seats released by the cancellation
    pub released_seats: usize,
}

/// Cancels an order and releases every seat attached to it, whatever state
/// each seat is in. Released capacity becomes reusable immediately.
pub async fn cancel_order<S: TableStore>(
    store: &S,
    order_id: &str,
    reason: &str,
    actor: &str,
) -> Result<CancelOutcome> {
    let (orders, order) = load_order(store, order_id).await?;
    store
        .update_row(
            tables::ORDERS,
            order.row,
            &orders.headers,
            &RowPatch::new().set("status", OrderStatus::Cancelled.as_str()),
        )
        .await?;

    let seats = store.get_table(tables::SEATS).await?;
    let now = format_datetime(Utc::now());
    let mut released = 0usize;
    for (row, rec) in seats.records() {
        if rec.get("order_id") != order_id {
            continue;
        }
        store
            .update_row(
                tables::SEATS,
                row,
                &seats.headers,
                &RowPatch::new()
                    .set("status", SeatStatus::Released.as_str())
                    .set("released_at", &*now),
            )
            .await?;
        released += 1;
    }
    info!(order_id, released, reason, "order cancelled");
    audit::log_action(store, audit::actions::ORDER_CANCELLED, actor, order_id, reason).await;
    Ok(CancelOutcome {
        released_seats: released,
    })
}
