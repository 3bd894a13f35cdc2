//! Buyer order entity.

use super::parse_datetime;
use crate::store::{Record, RowId};
use chrono::{DateTime, Utc};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Created; seat may be allocated but access not yet delivered
    PendingSend,
    /// Access delivered
    Active,
    /// Cancelled/refunded; all seats released
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "PENDING_SEND" => Some(Self::PendingSend),
            "ACTIVE" => Some(Self::Active),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingSend => "PENDING_SEND",
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// One row of the ORDERS table.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Handle of the backing row
    pub row: RowId,
    /// Stable identifier (`ORD-` uuid)
    pub order_id: String,
    /// Product the buyer purchased
    pub product_id: String,
    /// Platform, denormalized from the product for reporting
    pub platform: String,
    /// Sales channel the order came through
    pub channel: String,
    /// Buyer identifier from the channel
    pub buyer_id: String,
    /// Buyer contact; also the default invite address
    pub buyer_email: String,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Operator who took the order
    pub assigned_admin: String,
    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Parses an ORDERS record. An unreadable status cell reads as
    /// CANCELLED so that a corrupted row can never receive a seat.
    #[must_use]
    pub fn from_record(row: RowId, rec: &Record<'_>) -> Self {
        Self {
            row,
            order_id: rec.get("order_id").to_string(),
            product_id: rec.get("product_id").to_string(),
            platform: rec.get("platform").to_string(),
            channel: rec.get("channel").to_string(),
            buyer_id: rec.get("buyer_id").to_string(),
            buyer_email: rec.get("buyer_email").to_string(),
            status: OrderStatus::parse(rec.get("status")).unwrap_or(OrderStatus::Cancelled),
            assigned_admin: rec.get("assigned_admin").to_string(),
            created_at: parse_datetime(rec.get("created_at")),
        }
    }
}
