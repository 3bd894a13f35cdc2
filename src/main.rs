//! Operational entry point: connects to the spreadsheet bridge, runs the
//! daily expiry sweep, and prints the stock summary. The chat transport
//! drives the library directly; this binary exists for cron and manual
//! runs.

use dotenvy::dotenv;
use seatkeeper::{
    config,
    core::{lifecycle, report},
    errors::Result,
    store::BridgeStore,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Connect the spreadsheet bridge store
    let store = BridgeStore::new(
        app_config.bridge_url.clone(),
        app_config.bridge_secret.clone(),
    );

    // 5. Flip today's expiring seats to pending-confirm and report them
    let expiring = lifecycle::list_expiring_today(&store).await?;
    if expiring.is_empty() {
        info!("no seats expire today");
    } else {
        warn!(count = expiring.len(), "seats awaiting renewal decisions");
        for seat in &expiring {
            info!(
                seat_id = %seat.seat_id,
                order_id = %seat.order_id,
                buyer_id = %seat.buyer_id,
                account_id = %seat.account_id,
                "expiring today"
            );
        }
    }

    // 6. Print the stock picture so operators know when to restock
    let stock = report::stock_summary(&store).await?;
    info!(
        total_accounts = stock.total_accounts,
        full_accounts = stock.full_accounts,
        available_slots = stock.available_slots,
        active_seats = stock.active_seats,
        released_seats = stock.released_seats,
        "stock summary"
    );

    Ok(())
}
