//! Data models for the spreadsheet tables.
//!
//! Each entity is a plain struct parsed from a header-keyed [`Record`](crate::store::Record);
//! parsing is tolerant by construction because legacy sheets miss optional
//! columns and hold free-form operator input ("aktif", lowercase modes,
//! date-only cells).

pub mod account;
pub mod admin;
pub mod order;
pub mod product;
pub mod seat;

pub use account::Account;
pub use admin::{AdminStatus, AdminUser, Role};
pub use order::{Order, OrderStatus};
pub use product::{FallbackPolicy, Fulfillment, Product, SeatMode};
pub use seat::{InviteStatus, Seat, SeatStatus};

use chrono::{DateTime, NaiveDate, Utc};

/// Truthiness of an operator-entered status cell.
/// The live sheets hold `active`, `aktif`, `TRUE`, and `1` interchangeably.
#[must_use]
pub fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "active" | "aktif" | "true" | "1"
    )
}

/// Parses a date cell: RFC 3339 first, then a bare `YYYY-MM-DD` entered by
/// hand in the sheet (read as midnight UTC). Empty or unparseable cells are
/// `None`.
#[must_use]
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    value
        .parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical cell encoding for timestamps (what `Date.toISOString` wrote in
/// the sheets this replaces).
#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
