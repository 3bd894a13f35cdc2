//! Spreadsheet web-app bridge store.
//!
//! The live deployment keeps its tables in a spreadsheet fronted by a tiny
//! web-app bridge: one POST endpoint accepting `{action, table, ...}` JSON
//! and answering `{success, data, error}`. This store speaks that protocol
//! with `reqwest` and translates failures into [`Error::Store`].

use super::{RowId, RowPatch, Table, TableStore};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// HTTP client for the spreadsheet bridge endpoint.
#[derive(Debug, Clone)]
pub struct BridgeStore {
    client: reqwest::Client,
    endpoint: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<serde_json::Value>>,
}

impl BridgeStore {
    /// New store talking to `endpoint`, authenticating with `secret`.
    #[must_use]
    pub fn new(endpoint: String, secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            secret,
        }
    }

    async fn call<T, B>(&self, action: &str, body: &B) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        B: Serialize + Sync,
    {
        debug!(action, "bridge call");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "secret": self.secret,
                "action": action,
                "payload": body,
            }))
            .send()
            .await?
            .error_for_status()?;

        let parsed: BridgeResponse<T> = response.json().await?;
        if !parsed.success {
            return Err(Error::Store {
                message: parsed
                    .error
                    .unwrap_or_else(|| format!("bridge rejected action {action}")),
            });
        }
        parsed.data.ok_or_else(|| Error::Store {
            message: format!("bridge returned no data for action {action}"),
        })
    }

    /// Spreadsheet cells arrive as strings or bare numbers; everything is a
    /// string to the engine.
    fn cell_to_string(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl TableStore for BridgeStore {
    async fn get_table(&self, name: &str) -> Result<Table> {
        let raw: RawTable = self.call("getTable", &json!({ "table": name })).await?;
        let rows = raw
            .rows
            .iter()
            .map(|row| row.iter().map(Self::cell_to_string).collect())
            .collect();
        Ok(Table::new(raw.headers, rows))
    }

    async fn append_row(&self, name: &str, headers: &[String], patch: &RowPatch) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "appendRow",
                &json!({
                    "table": name,
                    "values": [patch.to_row(headers)],
                }),
            )
            .await?;
        Ok(())
    }

    async fn update_row(
        &self,
        name: &str,
        row: RowId,
        headers: &[String],
        patch: &RowPatch,
    ) -> Result<()> {
        let updates: serde_json::Map<String, serde_json::Value> = patch
            .iter()
            .map(|(h, v)| (h.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        let _: serde_json::Value = self
            .call(
                "updateRow",
                &json!({
                    "table": name,
                    "row": row.sheet_row(),
                    "headers": headers,
                    "updates": updates,
                }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_null_cells_stringify() {
        assert_eq!(BridgeStore::cell_to_string(&json!("x")), "x");
        assert_eq!(BridgeStore::cell_to_string(&json!(3)), "3");
        assert_eq!(BridgeStore::cell_to_string(&serde_json::Value::Null), "");
    }
}
