//! Product catalog entity and its capacity-policy vocabulary.
//!
//! A product row decides how its seats behave: the seat mode (capacity
//! policy), the fulfillment type (how access reaches the buyer), the
//! subscription length, and whether exhausted sharing capacity may be
//! backfilled by promoting an idle private account.

use super::truthy;
use crate::store::Record;

/// Capacity policy for an account or seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatMode {
    /// Exclusive: one buyer per account
    Private,
    /// Pooled: up to `max_slot` concurrent buyers per account
    Sharing,
    /// Invite-capable head account; exclusive like `Private`
    Head,
}

impl SeatMode {
    /// Tolerant parse; the sheets hold both uppercase and legacy lowercase.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "PRIVATE" => Some(Self::Private),
            "SHARING" => Some(Self::Sharing),
            "HEAD" => Some(Self::Head),
            _ => None,
        }
    }

    /// Canonical cell value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Sharing => "SHARING",
            Self::Head => "HEAD",
        }
    }
}

/// How access is delivered to the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fulfillment {
    /// Credentials are handed over
    Login,
    /// The account owner sends a platform invite
    Invite,
}

impl Fulfillment {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "LOGIN" => Some(Self::Login),
            "INVITE" => Some(Self::Invite),
            _ => None,
        }
    }

    /// Default when the column is absent: head accounts invite, everything
    /// else hands over a login.
    #[must_use]
    pub const fn default_for(mode: SeatMode) -> Self {
        match mode {
            SeatMode::Head => Self::Invite,
            SeatMode::Private | SeatMode::Sharing => Self::Login,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Invite => "INVITE",
        }
    }
}

/// What to do when every sharing account is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Fail with `NeedNewAccount`
    #[default]
    Strict,
    /// Promote the first unused private account into the sharing pool
    PrivateUnusedToSharing,
}

impl FallbackPolicy {
    /// Anything other than the explicit fallback marker reads as strict.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().to_uppercase() == "FALLBACK_PRIVATE_UNUSED_TO_SHARING" {
            Self::PrivateUnusedToSharing
        } else {
            Self::Strict
        }
    }
}

/// One row of the PRODUCTS table.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Stable identifier referenced by orders
    pub product_id: String,
    /// Display name; falls back to the platform when unset
    pub product_name: Option<String>,
    /// Platform the accounts belong to (dedup scope for restock)
    pub platform: String,
    /// Capacity policy for seats of this product
    pub seat_mode: SeatMode,
    /// Delivery mechanism
    pub fulfillment: Fulfillment,
    /// Subscription length; the default when the operator picks no override
    pub duration_days: i64,
    /// Per-account slot override for SHARING products
    pub sharing_max_slot: Option<u32>,
    /// Behavior under capacity exhaustion
    pub fallback_policy: FallbackPolicy,
    /// Inactive products are invisible to the catalog
    pub active: bool,
}

impl Product {
    /// Parses a PRODUCTS record, applying the legacy-column derivations:
    /// `seat_mode` falls back to the old `mode` column (default SHARING),
    /// `fulfillment` defaults from the seat mode.
    #[must_use]
    pub fn from_record(rec: &Record<'_>) -> Self {
        let seat_mode = rec
            .get_opt("seat_mode")
            .and_then(SeatMode::parse)
            .or_else(|| rec.get_opt("mode").and_then(SeatMode::parse))
            .unwrap_or(SeatMode::Sharing);
        let fulfillment = rec
            .get_opt("fulfillment")
            .and_then(Fulfillment::parse)
            .unwrap_or_else(|| Fulfillment::default_for(seat_mode));

        Self {
            product_id: rec.get("product_id").to_string(),
            product_name: rec.get_opt("product_name").map(ToString::to_string),
            platform: rec.get("platform").to_string(),
            seat_mode,
            fulfillment,
            duration_days: rec.get("duration_days").trim().parse().unwrap_or(0),
            sharing_max_slot: rec.get("sharing_max_slot").trim().parse().ok(),
            fallback_policy: FallbackPolicy::parse(rec.get("fallback_policy")),
            active: truthy(rec.get("active")),
        }
    }

    /// Name shown to operators.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or(&self.platform)
    }
}
