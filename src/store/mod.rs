//! Table Accessor boundary - narrow interface over the header-driven row store.
//!
//! The system of record is a spreadsheet: every table is a named tab with a
//! header row followed by data rows, and every cell is an opaque string keyed
//! by its header. This module abstracts that behind [`TableStore`] so the
//! allocation engine never knows whether it is talking to the live
//! spreadsheet bridge, or the in-memory store the tests run against.
//!
//! Row addressing is deliberately opaque: reads hand out [`RowId`] handles
//! and updates take them back, so no caller ever computes a raw sheet index.

use crate::errors::{Error, Result};
use async_trait::async_trait;

/// In-memory store, used by tests and as a dry-run backend
pub mod memory;

/// Spreadsheet web-app bridge store speaking JSON over HTTP
pub mod bridge;

pub use bridge::BridgeStore;
pub use memory::MemoryStore;

/// Well-known table (sheet tab) names.
pub mod tables {
    /// Account inventory
    pub const ACCOUNTS: &str = "ACCOUNTS";
    /// Product catalog
    pub const PRODUCTS: &str = "PRODUCTS";
    /// Buyer orders
    pub const ORDERS: &str = "ORDERS";
    /// Seat bindings (order x account-slot)
    pub const SEATS: &str = "SEATS";
    /// Operator allowlist
    pub const ADMIN_USERS: &str = "ADMIN_USERS";
    /// Append-only audit trail
    pub const LOGS: &str = "LOGS";
}

/// Opaque handle to one data row of one table.
///
/// Minted by the [`Table`] that read the row and only meaningful when handed
/// back to the same store for an update. Internally it is the 1-based sheet
/// row number (data index + 2 to account for the header row), but callers
/// must not rely on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(pub(crate) usize);

impl RowId {
    /// Sheet row number for stores that address rows positionally.
    pub(crate) const fn sheet_row(self) -> usize {
        self.0
    }
}

/// A full read of one table: header row plus all data rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Header row, in column order
    pub headers: Vec<String>,
    /// Data rows; short rows are tolerated and read as empty cells
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from a header row and data rows.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Column index of `header`, if the table carries that column at all.
    /// Optional feature-flagged columns (seat mode, invite fields) may be
    /// absent from older sheets.
    #[must_use]
    pub fn col(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Opaque handle for the data row at `index` (0-based position in
    /// [`Self::rows`]).
    #[must_use]
    pub fn handle(&self, index: usize) -> RowId {
        RowId(index + 2)
    }

    /// Iterates `(handle, record)` pairs over all data rows.
    pub fn records(&self) -> impl Iterator<Item = (RowId, Record<'_>)> {
        self.rows.iter().enumerate().map(|(i, cells)| {
            (
                self.handle(i),
                Record {
                    headers: &self.headers,
                    cells,
                },
            )
        })
    }

    /// Finds the first record where `header` equals `value`.
    #[must_use]
    pub fn find_by(&self, header: &str, value: &str) -> Option<(RowId, Record<'_>)> {
        self.records().find(|(_, rec)| rec.get(header) == value)
    }
}

/// Header-keyed view of one data row.
///
/// Missing columns and short rows both read as `""`; the engine treats empty
/// and absent identically, which is what makes feature-flagged columns safe
/// to roll out sheet by sheet.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl Record<'_> {
    /// Cell value under `header`, or `""` when the column or cell is absent.
    #[must_use]
    pub fn get(&self, header: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == header)
            .and_then(|i| self.cells.get(i))
            .map_or("", String::as_str)
    }

    /// Non-empty cell value under `header`.
    #[must_use]
    pub fn get_opt(&self, header: &str) -> Option<&str> {
        let v = self.get(header);
        (!v.is_empty()).then_some(v)
    }
}

/// Partial row write, keyed by header name.
///
/// Only headers that exist in the target table are materialized; values for
/// unknown headers are dropped, mirroring how the sheet bridge maps objects
/// onto columns.
#[derive(Debug, Clone, Default)]
pub struct RowPatch {
    entries: Vec<(String, String)>,
}

impl RowPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `header` to `value`, replacing any earlier entry. Chains.
    #[must_use]
    pub fn set(mut self, header: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(h, _)| h == header) {
            entry.1 = value;
        } else {
            self.entries.push((header.to_string(), value));
        }
        self
    }

    /// Value for `header`, if set.
    #[must_use]
    pub fn get(&self, header: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates `(header, value)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    /// Materializes a full row for `headers`, using `""` for unset columns.
    #[must_use]
    pub fn to_row(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.get(h).unwrap_or("").to_string())
            .collect()
    }
}

/// The read/append/update contract every backing store implements.
///
/// Reads return a full snapshot of the table; there is no caching layer, so
/// an allocation decision is at most one round-trip stale.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Reads the whole table: header row plus all data rows.
    async fn get_table(&self, name: &str) -> Result<Table>;

    /// Appends one row, mapping `patch` onto the given header order.
    async fn append_row(&self, name: &str, headers: &[String], patch: &RowPatch) -> Result<()>;

    /// Partially updates the row behind `row`; only headers present in
    /// `patch` change, all other cells keep their current value.
    async fn update_row(
        &self,
        name: &str,
        row: RowId,
        headers: &[String],
        patch: &RowPatch,
    ) -> Result<()>;
}

pub(crate) fn unknown_table(name: &str) -> Error {
    Error::Store {
        message: format!("unknown table: {name}"),
    }
}
