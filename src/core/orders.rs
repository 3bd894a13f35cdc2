//! Order creation and listings.

use super::{allocator, audit, catalog};
use crate::{
    entities::{Order, OrderStatus, Seat, SeatStatus, format_datetime},
    errors::Result,
    store::{RowPatch, TableStore, tables},
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// Arguments for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrderRequest {
    /// Product being sold; must be active
    pub product_id: String,
    /// Sales channel the order came through
    pub channel: String,
    /// Buyer identifier from the channel
    pub buyer_id: String,
    /// Buyer contact
    pub buyer_email: String,
    /// Operator taking the order
    pub actor: String,
}

/// Creates a PENDING_SEND order for an active product and returns its id.
pub async fn create_order<S: TableStore>(store: &S, req: &NewOrderRequest) -> Result<String> {
    let product = catalog::find_product_by_id(store, &req.product_id).await?;
    let orders = store.get_table(tables::ORDERS).await?;
    let order_id = format!("ORD-{}", Uuid::new_v4());
    let patch = RowPatch::new()
        .set("order_id", &*order_id)
        .set("product_id", &*req.product_id)
        .set("platform", &*product.platform)
        .set("channel", &*req.channel)
        .set("buyer_id", &*req.buyer_id)
        .set("buyer_email", &*req.buyer_email)
        .set("status", OrderStatus::PendingSend.as_str())
        .set("assigned_admin", &*req.actor)
        .set("created_at", format_datetime(Utc::now()));
    store.append_row(tables::ORDERS, &orders.headers, &patch).await?;
    info!(order_id, product_id = %req.product_id, "order created");
    audit::log_action(
        store,
        audit::actions::ORDER_CREATED,
        &req.actor,
        &order_id,
        &format!("product {}", product.product_id),
    )
    .await;
    Ok(order_id)
}

/// Creates an order and allocates its first seat in one call - the
/// new-order chat flow. Returns the order id with the allocation outcome.
pub async fn create_and_assign<S: TableStore>(
    store: &S,
    req: &NewOrderRequest,
    duration_days: Option<i64>,
) -> Result<(String, allocator::SeatAssignment)> {
    let order_id = create_order(store, req).await?;
    let assignment = allocator::assign_seat(
        store,
        allocator::AssignSeatRequest {
            order_id: order_id.clone(),
            buyer_id: req.buyer_id.clone(),
            buyer_email: req.buyer_email.clone(),
            duration_days,
            invite_email: None,
            actor: req.actor.clone(),
        },
    )
    .await?;
    audit::log_action(
        store,
        audit::actions::ORDER_ASSIGN,
        &req.actor,
        &order_id,
        &format!("seat {}", assignment.seat.seat_id),
    )
    .await;
    Ok((order_id, assignment))
}

/// One line of the recent-orders picker.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub order_id: String,
    pub product_id: String,
    pub buyer_id: String,
    pub buyer_email: String,
    /// Current (non-RELEASED) seat, when one exists
    pub seat_id: String,
    pub account_id: String,
    pub status: OrderStatus,
}

/// Newest-first PENDING_SEND/ACTIVE orders joined with their current seat,
/// at most `limit` entries.
pub async fn list_recent_active_orders<S: TableStore>(
    store: &S,
    limit: usize,
) -> Result<Vec<OrderSummary>> {
    let orders = store.get_table(tables::ORDERS).await?;
    let seats = store.get_table(tables::SEATS).await?;
    let seat_rows: Vec<Seat> = seats
        .records()
        .map(|(row, rec)| Seat::from_record(row, &rec))
        .collect();

    let mut recent: Vec<Order> = orders
        .records()
        .map(|(row, rec)| Order::from_record(row, &rec))
        .filter(|o| matches!(o.status, OrderStatus::PendingSend | OrderStatus::Active))
        .collect();
    recent.sort_by_key(|o| std::cmp::Reverse(o.created_at.map_or(0, |dt| dt.timestamp_millis())));
    recent.truncate(limit);

    Ok(recent
        .into_iter()
        .map(|order| {
            let seat = seat_rows
                .iter()
                .find(|s| s.order_id == order.order_id && s.status != SeatStatus::Released);
            OrderSummary {
                seat_id: seat.map(|s| s.seat_id.clone()).unwrap_or_default(),
                account_id: seat.map(|s| s.account_id.clone()).unwrap_or_default(),
                order_id: order.order_id,
                product_id: order.product_id,
                buyer_id: order.buyer_id,
                buyer_email: order.buyer_email,
                status: order.status,
            }
        })
        .collect())
}
