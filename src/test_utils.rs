//! Shared fixtures for the test suite: a fully-seeded [`MemoryStore`] plus
//! small builders for product, account, and order rows.
//!
//! The builders write rows the same way the live sheet holds them (all
//! strings, header-keyed), so tests exercise the tolerant parsing paths the
//! engine uses in production.

use crate::{
    core::allocator::AssignSeatRequest,
    core::orders::NewOrderRequest,
    entities::{Fulfillment, Order, Product, Seat, SeatMode, format_datetime},
    errors::Result,
    store::{MemoryStore, RowPatch, TableStore, tables},
};
use chrono::{DateTime, Duration, Utc};

/// A [`MemoryStore`] with every table created empty, full header rows in
/// place.
pub async fn seed_tables() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .create_table(
            tables::ACCOUNTS,
            &[
                "account_id",
                "platform",
                "mode",
                "email",
                "max_slot",
                "status",
                "expired_at",
                "created_at",
            ],
        )
        .await;
    store
        .create_table(
            tables::PRODUCTS,
            &[
                "product_id",
                "product_name",
                "platform",
                "seat_mode",
                "fulfillment",
                "duration_days",
                "sharing_max_slot",
                "fallback_policy",
                "active",
            ],
        )
        .await;
    store
        .create_table(
            tables::ORDERS,
            &[
                "order_id",
                "product_id",
                "platform",
                "channel",
                "buyer_id",
                "buyer_email",
                "status",
                "assigned_admin",
                "created_at",
            ],
        )
        .await;
    store
        .create_table(
            tables::SEATS,
            &[
                "seat_id",
                "account_id",
                "order_id",
                "buyer_id",
                "buyer_email",
                "start_date",
                "end_date",
                "status",
                "released_at",
                "seat_mode",
                "invite_email",
                "invite_status",
            ],
        )
        .await;
    store
        .create_table(tables::ADMIN_USERS, &["telegram_username", "role", "status"])
        .await;
    store
        .create_table(
            tables::LOGS,
            &["timestamp", "action", "actor", "ref_id", "note"],
        )
        .await;
    store
}

/// Builder for a PRODUCTS row.
#[derive(Debug, Clone)]
pub struct ProductSpec {
    product_id: String,
    seat_mode: SeatMode,
    duration_days: i64,
    sharing_max_slot: Option<u32>,
    fallback: bool,
    active: bool,
}

impl ProductSpec {
    fn with_mode(product_id: &str, seat_mode: SeatMode) -> Self {
        Self {
            product_id: product_id.to_string(),
            seat_mode,
            duration_days: 30,
            sharing_max_slot: None,
            fallback: false,
            active: true,
        }
    }

    pub fn sharing(product_id: &str) -> Self {
        Self::with_mode(product_id, SeatMode::Sharing)
    }

    pub fn private(product_id: &str) -> Self {
        Self::with_mode(product_id, SeatMode::Private)
    }

    pub fn head(product_id: &str) -> Self {
        Self::with_mode(product_id, SeatMode::Head)
    }

    pub fn sharing_max_slot(mut self, max: u32) -> Self {
        self.sharing_max_slot = Some(max);
        self
    }

    pub fn duration(mut self, days: i64) -> Self {
        self.duration_days = days;
        self
    }

    /// Opts the product into private-to-sharing promotion.
    pub fn fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// The parsed entity, without touching any store.
    pub fn build(&self) -> Product {
        Product {
            product_id: self.product_id.clone(),
            product_name: None,
            platform: "netflix".to_string(),
            seat_mode: self.seat_mode,
            fulfillment: Fulfillment::default_for(self.seat_mode),
            duration_days: self.duration_days,
            sharing_max_slot: self.sharing_max_slot,
            fallback_policy: if self.fallback {
                crate::entities::FallbackPolicy::PrivateUnusedToSharing
            } else {
                crate::entities::FallbackPolicy::Strict
            },
            active: self.active,
        }
    }

    /// Appends the row to PRODUCTS.
    pub async fn insert(&self, store: &MemoryStore) -> Result<()> {
        let table = store.get_table(tables::PRODUCTS).await?;
        let patch = RowPatch::new()
            .set("product_id", &*self.product_id)
            .set("platform", "netflix")
            .set("seat_mode", self.seat_mode.as_str())
            .set(
                "fulfillment",
                Fulfillment::default_for(self.seat_mode).as_str(),
            )
            .set("duration_days", self.duration_days.to_string())
            .set(
                "sharing_max_slot",
                self.sharing_max_slot.map(|m| m.to_string()).unwrap_or_default(),
            )
            .set(
                "fallback_policy",
                if self.fallback {
                    "FALLBACK_PRIVATE_UNUSED_TO_SHARING"
                } else {
                    ""
                },
            )
            .set("active", if self.active { "true" } else { "" });
        store.append_row(tables::PRODUCTS, &table.headers, &patch).await
    }
}

/// Builder for an ACCOUNTS row. The email defaults to the lowercased id at
/// `@mail.example` so tests can predict it.
#[derive(Debug, Clone)]
pub struct AccountSpec {
    account_id: String,
    mode: SeatMode,
    platform: String,
    email: String,
    max_slot: u32,
    active: bool,
}

impl AccountSpec {
    fn with_mode(account_id: &str, mode: SeatMode) -> Self {
        Self {
            account_id: account_id.to_string(),
            mode,
            platform: "netflix".to_string(),
            email: format!("{}@mail.example", account_id.to_lowercase()),
            max_slot: 1,
            active: true,
        }
    }

    pub fn sharing(account_id: &str) -> Self {
        Self::with_mode(account_id, SeatMode::Sharing)
    }

    pub fn private(account_id: &str) -> Self {
        Self::with_mode(account_id, SeatMode::Private)
    }

    pub fn head(account_id: &str) -> Self {
        Self::with_mode(account_id, SeatMode::Head)
    }

    pub fn max_slot(mut self, max: u32) -> Self {
        self.max_slot = max;
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Appends the row to ACCOUNTS.
    pub async fn insert(&self, store: &MemoryStore) -> Result<()> {
        let table = store.get_table(tables::ACCOUNTS).await?;
        let patch = RowPatch::new()
            .set("account_id", &*self.account_id)
            .set("platform", &*self.platform)
            .set("mode", self.mode.as_str())
            .set("email", &*self.email)
            .set("max_slot", self.max_slot.to_string())
            .set("status", if self.active { "active" } else { "inactive" })
            .set("created_at", format_datetime(Utc::now()));
        store.append_row(tables::ACCOUNTS, &table.headers, &patch).await
    }
}

/// Builder for an ORDERS row, PENDING_SEND unless told otherwise.
#[derive(Debug, Clone)]
pub struct OrderSpec {
    order_id: String,
    product_id: String,
    channel: String,
    status: &'static str,
}

impl OrderSpec {
    pub fn new(order_id: &str, product_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            channel: "Shopee".to_string(),
            status: "PENDING_SEND",
        }
    }

    pub fn active(mut self) -> Self {
        self.status = "ACTIVE";
        self
    }

    pub fn channel(mut self, channel: &str) -> Self {
        self.channel = channel.to_string();
        self
    }

    /// Appends the row to ORDERS.
    pub async fn insert(&self, store: &MemoryStore) -> Result<()> {
        let table = store.get_table(tables::ORDERS).await?;
        let patch = RowPatch::new()
            .set("order_id", &*self.order_id)
            .set("product_id", &*self.product_id)
            .set("platform", "netflix")
            .set("channel", &*self.channel)
            .set("buyer_id", "buyer")
            .set("buyer_email", "buyer@example.com")
            .set("status", self.status)
            .set("assigned_admin", "alice")
            .set("created_at", format_datetime(Utc::now()));
        store.append_row(tables::ORDERS, &table.headers, &patch).await
    }
}

/// Standard allocation request for `order_id`, actor "alice".
pub fn assign_request(order_id: &str) -> AssignSeatRequest {
    AssignSeatRequest {
        order_id: order_id.to_string(),
        buyer_id: "buyer".to_string(),
        buyer_email: "buyer@example.com".to_string(),
        duration_days: None,
        invite_email: None,
        actor: "alice".to_string(),
    }
}

/// Standard new-order request for `product_id`, channel Shopee.
pub fn order_request(product_id: &str) -> NewOrderRequest {
    NewOrderRequest {
        product_id: product_id.to_string(),
        channel: "Shopee".to_string(),
        buyer_id: "buyer".to_string(),
        buyer_email: "buyer@example.com".to_string(),
        actor: "alice".to_string(),
    }
}

/// Appends a RELEASED seat with the given release timestamp (empty string
/// leaves the cell unset).
pub async fn released_seat_row(
    store: &MemoryStore,
    seat_id: &str,
    account_id: &str,
    released_at: &str,
) -> Result<()> {
    let table = store.get_table(tables::SEATS).await?;
    let patch = RowPatch::new()
        .set("seat_id", seat_id)
        .set("account_id", account_id)
        .set("status", "RELEASED")
        .set("released_at", released_at);
    store.append_row(tables::SEATS, &table.headers, &patch).await
}

/// Appends an ACTIVE seat bound to `order_id`, expiring at `end`.
pub async fn active_seat_row(
    store: &MemoryStore,
    seat_id: &str,
    account_id: &str,
    order_id: &str,
    end: DateTime<Utc>,
) -> Result<()> {
    let table = store.get_table(tables::SEATS).await?;
    let patch = RowPatch::new()
        .set("seat_id", seat_id)
        .set("account_id", account_id)
        .set("order_id", order_id)
        .set("buyer_id", "buyer")
        .set("buyer_email", "buyer@example.com")
        .set("start_date", format_datetime(end - Duration::days(30)))
        .set("end_date", format_datetime(end))
        .set("status", "ACTIVE");
    store.append_row(tables::SEATS, &table.headers, &patch).await
}

/// Fresh read of one seat by id.
pub async fn seat_by_id(store: &MemoryStore, seat_id: &str) -> Result<Seat> {
    crate::core::load_seat(store, seat_id).await.map(|(_, seat)| seat)
}

/// Fresh read of one order by id.
pub async fn order_by_id(store: &MemoryStore, order_id: &str) -> Result<Order> {
    crate::core::load_order(store, order_id).await.map(|(_, order)| order)
}
