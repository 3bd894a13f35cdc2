//! In-memory [`TableStore`] backed by a `tokio` `RwLock`.
//!
//! This is the store every test runs against and doubles as a dry-run
//! backend for exercising flows without touching the live spreadsheet. It
//! reproduces the bridge's semantics exactly: full-snapshot reads, append
//! mapped onto header order, partial update by opaque row handle.

use super::{RowId, RowPatch, Table, TableStore, unknown_table};
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Seedable in-memory table store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    /// Empty store with no tables at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) a table with the given header row and no data.
    pub async fn create_table(&self, name: &str, headers: &[&str]) {
        let table = Table::new(headers.iter().map(ToString::to_string).collect(), Vec::new());
        self.tables.write().await.insert(name.to_string(), table);
    }

    /// Number of data rows currently in `name`; 0 for unknown tables.
    pub async fn row_count(&self, name: &str) -> usize {
        self.tables
            .read()
            .await
            .get(name)
            .map_or(0, |t| t.rows.len())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn get_table(&self, name: &str) -> Result<Table> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| unknown_table(name))
    }

    async fn append_row(&self, name: &str, headers: &[String], patch: &RowPatch) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(name).ok_or_else(|| unknown_table(name))?;
        table.rows.push(patch.to_row(headers));
        Ok(())
    }

    async fn update_row(
        &self,
        name: &str,
        row: RowId,
        headers: &[String],
        patch: &RowPatch,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(name).ok_or_else(|| unknown_table(name))?;
        let index = row.sheet_row().saturating_sub(2);
        let Some(cells) = table.rows.get_mut(index) else {
            return Err(unknown_table(&format!("{name} row {}", row.sheet_row())));
        };
        // Short rows grow to full header width before the patch lands.
        if cells.len() < headers.len() {
            cells.resize(headers.len(), String::new());
        }
        for (header, value) in patch.iter() {
            if let Some(i) = headers.iter().position(|h| h == header) {
                cells[i] = value.to_string();
            }
        }
        Ok(())
    }
}
