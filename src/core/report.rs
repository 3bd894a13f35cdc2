//! Stock and sales summaries for the report menu.

use super::capacity;
use crate::{
    entities::{Account, OrderStatus, SeatStatus},
    errors::Result,
    store::{TableStore, tables},
};
use std::collections::BTreeMap;

/// Inventory-side numbers: how much capacity is left before a restock is
/// due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSummary {
    /// All account rows, active or not
    pub total_accounts: usize,
    /// Active accounts with no free slot left
    pub full_accounts: usize,
    /// Free slots across active accounts
    pub available_slots: u32,
    /// Seats currently ACTIVE
    pub active_seats: usize,
    /// RELEASED seats (recyclable capacity markers)
    pub released_seats: usize,
}

/// Computes the stock summary from fresh ACCOUNTS and SEATS reads.
pub async fn stock_summary<S: TableStore>(store: &S) -> Result<StockSummary> {
    let accounts = store.get_table(tables::ACCOUNTS).await?;
    let seats = store.get_table(tables::SEATS).await?;
    let used = capacity::used_slots(&seats);

    let mut full_accounts = 0usize;
    let mut available_slots = 0u32;
    for (row, rec) in accounts.records() {
        let account = Account::from_record(row, &rec);
        if !account.active {
            continue;
        }
        let max_slot = account.max_slot.max(1);
        let current = used.get(&account.account_id).copied().unwrap_or(0);
        if current >= max_slot {
            full_accounts += 1;
        } else {
            available_slots += max_slot - current;
        }
    }

    let mut active_seats = 0usize;
    let mut released_seats = 0usize;
    for (_, rec) in seats.records() {
        match SeatStatus::parse(rec.get("status")) {
            Some(SeatStatus::Active) => active_seats += 1,
            Some(SeatStatus::Released) => released_seats += 1,
            _ => {}
        }
    }

    Ok(StockSummary {
        total_accounts: accounts.rows.len(),
        full_accounts,
        available_slots,
        active_seats,
        released_seats,
    })
}

/// Order-side numbers grouped for the report menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesSummary {
    pub total_orders: usize,
    pub active: usize,
    pub cancelled: usize,
    /// Order counts keyed by product id, alphabetical
    pub by_product: Vec<(String, usize)>,
    /// Order counts keyed by channel, alphabetical
    pub by_channel: Vec<(String, usize)>,
}

/// Computes the sales summary from a fresh ORDERS read.
pub async fn sales_summary<S: TableStore>(store: &S) -> Result<SalesSummary> {
    let orders = store.get_table(tables::ORDERS).await?;
    let mut active = 0usize;
    let mut cancelled = 0usize;
    let mut by_product: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_channel: BTreeMap<String, usize> = BTreeMap::new();

    for (_, rec) in orders.records() {
        match OrderStatus::parse(rec.get("status")) {
            Some(OrderStatus::Active) => active += 1,
            Some(OrderStatus::Cancelled) => cancelled += 1,
            _ => {}
        }
        let product = rec.get_opt("product_id").unwrap_or("UNKNOWN");
        let channel = rec.get_opt("channel").unwrap_or("UNKNOWN");
        *by_product.entry(product.to_string()).or_default() += 1;
        *by_channel.entry(channel.to_string()).or_default() += 1;
    }

    Ok(SalesSummary {
        total_orders: orders.rows.len(),
        active,
        cancelled,
        by_product: by_product.into_iter().collect(),
        by_channel: by_channel.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocator::assign_seat;
    use crate::core::lifecycle::{cancel_order, mark_order_sent};
    use crate::test_utils::{AccountSpec, OrderSpec, ProductSpec, assign_request, seed_tables};

    #[tokio::test]
    async fn stock_counts_full_accounts_and_free_slots() -> Result<()> {
        let store = seed_tables().await;
        ProductSpec::sharing("P1").sharing_max_slot(2).insert(&store).await?;
        AccountSpec::sharing("ACC-FULL").max_slot(2).insert(&store).await?;
        AccountSpec::sharing("ACC-FREE").max_slot(3).insert(&store).await?;
        AccountSpec::sharing("ACC-DEAD").inactive().insert(&store).await?;
        OrderSpec::new("ORD-1", "P1").insert(&store).await?;
        OrderSpec::new("ORD-2", "P1").insert(&store).await?;
        assign_seat(&store, assign_request("ORD-1")).await?;
        assign_seat(&store, assign_request("ORD-2")).await?;
        mark_order_sent(&store, "ORD-1", "alice").await?;

        let summary = stock_summary(&store).await?;
        assert_eq!(summary.total_accounts, 3);
        assert_eq!(summary.full_accounts, 1);
        assert_eq!(summary.available_slots, 3);
        assert_eq!(summary.active_seats, 1);
        assert_eq!(summary.released_seats, 0);
        Ok(())
    }

    #[tokio::test]
    async fn sales_groups_by_product_and_channel() -> Result<()> {
        let store = seed_tables().await;
        ProductSpec::sharing("P1").insert(&store).await?;
        ProductSpec::sharing("P2").insert(&store).await?;
        AccountSpec::sharing("ACC-A").max_slot(5).insert(&store).await?;
        OrderSpec::new("ORD-1", "P1").channel("Shopee").insert(&store).await?;
        OrderSpec::new("ORD-2", "P1").channel("Telegram").insert(&store).await?;
        OrderSpec::new("ORD-3", "P2").channel("Shopee").insert(&store).await?;
        assign_seat(&store, assign_request("ORD-3")).await?;
        cancel_order(&store, "ORD-3", "refund", "alice").await?;

        let summary = sales_summary(&store).await?;
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(
            summary.by_product,
            vec![("P1".to_string(), 2), ("P2".to_string(), 1)]
        );
        assert_eq!(
            summary.by_channel,
            vec![("Shopee".to_string(), 2), ("Telegram".to_string(), 1)]
        );
        Ok(())
    }
}
