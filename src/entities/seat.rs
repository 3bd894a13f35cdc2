//! Seat entity - the time-bounded binding of one order to one
//! account-slot.

use super::{SeatMode, parse_datetime};
use crate::store::{Record, RowId};
use chrono::{DateTime, Utc};

/// Seat lifecycle status.
///
/// RESERVED -(send)-> ACTIVE -(expiry sweep)-> PENDING_CONFIRM, which
/// renews back to ACTIVE or drops to RELEASED; any state can be flagged
/// PROBLEM. RELEASED rows stay in the table as recyclable capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    /// Allocated, access not yet delivered
    Reserved,
    /// Access delivered, within the paid window
    Active,
    /// End date reached; awaiting the renew-or-release decision
    PendingConfirm,
    /// Freed; reusable by a later SHARING/LOGIN allocation
    Released,
    /// Flagged broken; replaced by a successor seat
    Problem,
}

impl SeatStatus {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "RESERVED" => Some(Self::Reserved),
            "ACTIVE" => Some(Self::Active),
            "PENDING_CONFIRM" => Some(Self::PendingConfirm),
            "RELEASED" => Some(Self::Released),
            "PROBLEM" => Some(Self::Problem),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Active => "ACTIVE",
            Self::PendingConfirm => "PENDING_CONFIRM",
            Self::Released => "RELEASED",
            Self::Problem => "PROBLEM",
        }
    }

    /// Whether a seat in this status holds one of its account's slots.
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        matches!(self, Self::Reserved | Self::Active | Self::PendingConfirm)
    }
}

/// Delivery state of an invite-fulfilled seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteStatus {
    /// Invite not yet sent by the account owner
    PendingInvite,
    /// Invite confirmed sent
    InviteSent,
}

impl InviteStatus {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "PENDING_INVITE" => Some(Self::PendingInvite),
            "INVITE_SENT" => Some(Self::InviteSent),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingInvite => "PENDING_INVITE",
            Self::InviteSent => "INVITE_SENT",
        }
    }
}

/// One row of the SEATS table.
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    /// Handle of the backing row
    pub row: RowId,
    /// Stable identifier (`SEAT-` uuid)
    pub seat_id: String,
    /// Account whose capacity this seat consumes
    pub account_id: String,
    /// Order this seat fulfills
    pub order_id: String,
    /// Buyer identifier, denormalized for listings
    pub buyer_id: String,
    /// Buyer contact
    pub buyer_email: String,
    /// When access started
    pub start_date: Option<DateTime<Utc>>,
    /// When the paid window ends
    pub end_date: Option<DateTime<Utc>>,
    /// Current lifecycle status
    pub status: SeatStatus,
    /// When the seat was released; orders FIFO reuse
    pub released_at: Option<DateTime<Utc>>,
    /// Capacity policy stamped at allocation (optional legacy column)
    pub seat_mode: Option<SeatMode>,
    /// Invite address for INVITE fulfillment
    pub invite_email: Option<String>,
    /// Invite delivery state for INVITE fulfillment
    pub invite_status: Option<InviteStatus>,
}

impl Seat {
    /// Parses a SEATS record. An unreadable status cell reads as PROBLEM so
    /// corrupted rows neither hold capacity nor get silently recycled.
    #[must_use]
    pub fn from_record(row: RowId, rec: &Record<'_>) -> Self {
        Self {
            row,
            seat_id: rec.get("seat_id").to_string(),
            account_id: rec.get("account_id").to_string(),
            order_id: rec.get("order_id").to_string(),
            buyer_id: rec.get("buyer_id").to_string(),
            buyer_email: rec.get("buyer_email").to_string(),
            start_date: parse_datetime(rec.get("start_date")),
            end_date: parse_datetime(rec.get("end_date")),
            status: SeatStatus::parse(rec.get("status")).unwrap_or(SeatStatus::Problem),
            released_at: parse_datetime(rec.get("released_at")),
            seat_mode: SeatMode::parse(rec.get("seat_mode")),
            invite_email: rec.get_opt("invite_email").map(ToString::to_string),
            invite_status: InviteStatus::parse(rec.get("invite_status")),
        }
    }
}
