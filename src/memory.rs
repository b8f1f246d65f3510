use crate::error::{Result, SplitterError};
use crate::types::{BaseConnector, CellValue, FieldMeta, TableMeta};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// One stored record. Field values keep whatever JSON shape they were
/// seeded or written with.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub fields: serde_json::Map<String, CellValue>,
    pub created_at: DateTime<Utc>,
}

/// In-memory base implementation for development and testing.
///
/// Records per table are kept in insertion order, matching the iteration
/// order a real host exposes. `fail_writes_after` arms a write-failure
/// switch so tests can observe mid-run abort behavior.
#[derive(Default)]
pub struct InMemoryBase {
    tables: Mutex<Vec<TableMeta>>,
    fields: Mutex<HashMap<String, Vec<FieldMeta>>>,
    records: Mutex<HashMap<String, Vec<StoredRecord>>>,
    write_budget: Mutex<Option<usize>>,
}

impl InMemoryBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table and returns its generated id.
    pub fn add_table(&self, name: &str) -> String {
        let id = format!("tbl_{}", Uuid::new_v4().simple());
        self.tables.lock().unwrap().push(TableMeta {
            id: id.clone(),
            name: name.to_string(),
        });
        debug!("Created table {} with id {}", name, id);
        id
    }

    /// Registers a field on a table and returns its generated id.
    pub fn add_field(&self, table_id: &str, name: &str) -> String {
        let id = format!("fld_{}", Uuid::new_v4().simple());
        self.fields
            .lock()
            .unwrap()
            .entry(table_id.to_string())
            .or_default()
            .push(FieldMeta {
                id: id.clone(),
                name: name.to_string(),
            });
        debug!("Created field {} with id {} in table {}", name, id, table_id);
        id
    }

    /// Seeds one record with a single field set to an arbitrary cell value.
    pub fn seed_record(&self, table_id: &str, field_id: &str, value: CellValue) -> String {
        let id = format!("rec_{}", Uuid::new_v4().simple());
        let mut fields = serde_json::Map::new();
        fields.insert(field_id.to_string(), value);
        self.records
            .lock()
            .unwrap()
            .entry(table_id.to_string())
            .or_default()
            .push(StoredRecord {
                id: id.clone(),
                fields,
                created_at: Utc::now(),
            });
        id
    }

    /// All values of one field in one table, in insertion order. Records
    /// without that field are skipped.
    pub fn field_values(&self, table_id: &str, field_id: &str) -> Vec<CellValue> {
        let records = self.records.lock().unwrap();
        records
            .get(table_id)
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| r.fields.get(field_id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn record_count(&self, table_id: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .get(table_id)
            .map_or(0, Vec::len)
    }

    /// Arms the failure switch: the next `n` writes succeed, every write
    /// after that errors.
    pub fn fail_writes_after(&self, n: usize) {
        *self.write_budget.lock().unwrap() = Some(n);
    }

    fn table_exists(&self, table_id: &str) -> bool {
        self.tables.lock().unwrap().iter().any(|t| t.id == table_id)
    }

    fn unknown_table(table_id: &str) -> SplitterError {
        SplitterError::Api {
            message: format!("table '{table_id}' does not exist"),
        }
    }
}

#[async_trait]
impl BaseConnector for InMemoryBase {
    async fn get_table_meta_list(&self) -> Result<Vec<TableMeta>> {
        Ok(self.tables.lock().unwrap().clone())
    }

    async fn get_field_meta_list(&self, table_id: &str) -> Result<Vec<FieldMeta>> {
        if !self.table_exists(table_id) {
            return Err(Self::unknown_table(table_id));
        }
        let fields = self.fields.lock().unwrap();
        Ok(fields.get(table_id).cloned().unwrap_or_default())
    }

    async fn get_record_id_list(&self, table_id: &str) -> Result<Vec<String>> {
        if !self.table_exists(table_id) {
            return Err(Self::unknown_table(table_id));
        }
        let records = self.records.lock().unwrap();
        Ok(records
            .get(table_id)
            .map(|rows| rows.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_cell_value(
        &self,
        table_id: &str,
        field_id: &str,
        record_id: &str,
    ) -> Result<CellValue> {
        let records = self.records.lock().unwrap();
        let rows = records
            .get(table_id)
            .ok_or_else(|| Self::unknown_table(table_id))?;
        let record = rows.iter().find(|r| r.id == record_id).ok_or_else(|| {
            SplitterError::Api {
                message: format!("record '{record_id}' does not exist in table '{table_id}'"),
            }
        })?;
        Ok(record.fields.get(field_id).cloned().unwrap_or(CellValue::Null))
    }

    async fn add_record(&self, table_id: &str, field_id: &str, value: &str) -> Result<String> {
        if !self.table_exists(table_id) {
            return Err(Self::unknown_table(table_id));
        }

        {
            let mut budget = self.write_budget.lock().unwrap();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(SplitterError::Api {
                        message: "write failure injected".to_string(),
                    });
                }
                *remaining -= 1;
            }
        }

        let id = format!("rec_{}", Uuid::new_v4().simple());
        let mut fields = serde_json::Map::new();
        fields.insert(field_id.to_string(), CellValue::String(value.to_string()));
        self.records
            .lock()
            .unwrap()
            .entry(table_id.to_string())
            .or_default()
            .push(StoredRecord {
                id: id.clone(),
                fields,
                created_at: Utc::now(),
            });
        debug!("Created record {} in table {}", id, table_id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_come_back_in_insertion_order() {
        let base = InMemoryBase::new();
        let table = base.add_table("t");
        let field = base.add_field(&table, "f");
        base.seed_record(&table, &field, json!("first"));
        base.seed_record(&table, &field, json!("second"));

        let ids = base.get_record_id_list(&table).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(
            base.get_cell_value(&table, &field, &ids[0]).await.unwrap(),
            json!("first")
        );
        assert_eq!(
            base.get_cell_value(&table, &field, &ids[1]).await.unwrap(),
            json!("second")
        );
    }

    #[tokio::test]
    async fn missing_field_reads_as_null() {
        let base = InMemoryBase::new();
        let table = base.add_table("t");
        let field = base.add_field(&table, "f");
        let other = base.add_field(&table, "g");
        let record = base.seed_record(&table, &field, json!("x"));

        let cell = base.get_cell_value(&table, &other, &record).await.unwrap();
        assert!(cell.is_null());
    }

    #[tokio::test]
    async fn write_budget_fails_after_limit() {
        let base = InMemoryBase::new();
        let table = base.add_table("t");
        let field = base.add_field(&table, "f");
        base.fail_writes_after(1);

        assert!(base.add_record(&table, &field, "ok").await.is_ok());
        assert!(base.add_record(&table, &field, "boom").await.is_err());
        assert_eq!(base.record_count(&table), 1);
    }
}
