//! Unified error types for `seatkeeper`.
//!
//! Core operations fail fast on the first error; nothing is retried here.
//! The dedup race during restock is deliberately not an error: it surfaces
//! as a skipped count in [`crate::core::restock::RestockOutcome`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Table store transport or protocol failure (bridge rejected the
    /// request, malformed payload, unknown table).
    #[error("Table store error: {message}")]
    Store { message: String },

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Seat not found: {seat_id}")]
    SeatNotFound { seat_id: String },

    #[error("Product not found or inactive: {product_id}")]
    ProductNotFound { product_id: String },

    #[error("Access denied for {username}: {reason}")]
    AccessDenied { username: String, reason: String },

    /// An operation was attempted against an order or seat whose current
    /// status does not permit it (e.g. assigning a seat to an order that
    /// is not PENDING_SEND).
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Every candidate account is at capacity and no fallback promotion
    /// applies. Operator-actionable: restock is needed.
    #[error("No account with free capacity for product {product_id}; restock needed")]
    NeedNewAccount { product_id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
