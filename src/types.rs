use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Raw cell value as returned by the base host. Cells come back in several
/// shapes (plain string, string array, rich-text segment array, bare
/// object); classification happens in [`crate::normalize`].
pub type CellValue = serde_json::Value;

/// Identifying metadata for a table in the base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMeta {
    pub id: String,
    pub name: String,
}

/// Identifying metadata for a field within a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMeta {
    pub id: String,
    pub name: String,
}

/// Snapshot of the four user selections a split run operates on.
///
/// The run takes this by value so nothing can mutate the selection while
/// records are being processed.
#[derive(Debug, Clone)]
pub struct Selection {
    pub source_table: String,
    pub source_field: String,
    pub target_table: String,
    pub target_field: String,
}

impl Selection {
    /// Rejects selections with any blank id. Runs must fail here, before
    /// any host call is made.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("source table", &self.source_table),
            ("source field", &self.source_field),
            ("target table", &self.target_table),
            ("target field", &self.target_field),
        ];
        for (label, id) in required {
            if id.trim().is_empty() {
                return Err(crate::error::SplitterError::Selection(format!(
                    "{label} is not selected"
                )));
            }
        }
        Ok(())
    }
}

/// Seam to the base host SDK. Both connectors (HTTP and in-memory) speak
/// this surface; the pipeline and CLI never touch the host directly.
#[async_trait::async_trait]
pub trait BaseConnector: Send + Sync {
    /// All tables visible in the base.
    async fn get_table_meta_list(&self) -> Result<Vec<TableMeta>>;

    /// Fields of one table.
    async fn get_field_meta_list(&self, table_id: &str) -> Result<Vec<FieldMeta>>;

    /// Record ids of one table, in the host's iteration order.
    async fn get_record_id_list(&self, table_id: &str) -> Result<Vec<String>>;

    /// Raw value of one cell. Absent cells come back as `Value::Null`.
    async fn get_cell_value(
        &self,
        table_id: &str,
        field_id: &str,
        record_id: &str,
    ) -> Result<CellValue>;

    /// Creates a record with a single text field set; returns the new
    /// record's id.
    async fn add_record(&self, table_id: &str, field_id: &str, value: &str) -> Result<String>;
}
