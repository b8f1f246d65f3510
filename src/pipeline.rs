use crate::error::{Result, SplitterError};
use crate::normalize::normalize;
use crate::types::{BaseConnector, Selection};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Outcome of one completed split run.
#[derive(Debug, Serialize)]
pub struct SplitSummary {
    /// Source records enumerated.
    pub source_records: usize,
    /// Source records whose cell produced no lines.
    pub skipped_records: usize,
    /// Target records created. One per non-blank line.
    pub records_created: usize,
    pub duration_secs: f64,
}

pub struct SplitRun;

impl SplitRun {
    /// Runs the full source-to-target split for one selection snapshot.
    ///
    /// Strictly sequential: each record's read and its resulting writes
    /// complete before the next record starts, so target order follows
    /// source iteration order. A failed host call aborts the remaining
    /// loop; records already written stay (no rollback, no retries).
    #[instrument(skip(connector, selection), fields(
        source_table = %selection.source_table,
        target_table = %selection.target_table,
    ))]
    pub async fn execute(
        connector: &dyn BaseConnector,
        selection: &Selection,
    ) -> Result<SplitSummary> {
        selection.validate()?;
        Self::check_fields_exist(connector, selection).await?;

        counter!("splitter_runs_total").increment(1);
        let t_run = std::time::Instant::now();

        info!("Enumerating source records");
        let record_ids = connector
            .get_record_id_list(&selection.source_table)
            .await?;
        info!("Found {} source records", record_ids.len());

        let mut records_created = 0usize;
        let mut skipped_records = 0usize;

        for (i, record_id) in record_ids.iter().enumerate() {
            let cell = connector
                .get_cell_value(&selection.source_table, &selection.source_field, record_id)
                .await?;

            let lines = normalize(&cell);
            if lines.is_empty() {
                debug!("Record {} has no splittable text, skipping", record_id);
                skipped_records += 1;
                continue;
            }

            for line in &lines {
                connector
                    .add_record(&selection.target_table, &selection.target_field, line)
                    .await?;
                records_created += 1;
            }

            if (i + 1) % 10 == 0 {
                debug!("Processed {}/{} source records", i + 1, record_ids.len());
            }
        }

        let duration_secs = t_run.elapsed().as_secs_f64();
        counter!("splitter_records_created_total").increment(records_created as u64);
        histogram!("splitter_run_duration_seconds").record(duration_secs);

        info!(
            "Split complete: {} records created from {} sources ({} skipped)",
            records_created,
            record_ids.len(),
            skipped_records
        );

        Ok(SplitSummary {
            source_records: record_ids.len(),
            skipped_records,
            records_created,
            duration_secs,
        })
    }

    /// Counts the lines a run would write, without creating any records.
    #[instrument(skip(connector, selection))]
    pub async fn dry_run(
        connector: &dyn BaseConnector,
        selection: &Selection,
    ) -> Result<SplitSummary> {
        selection.validate()?;
        Self::check_fields_exist(connector, selection).await?;

        let t_run = std::time::Instant::now();
        let record_ids = connector
            .get_record_id_list(&selection.source_table)
            .await?;

        let mut records_created = 0usize;
        let mut skipped_records = 0usize;
        for record_id in &record_ids {
            let cell = connector
                .get_cell_value(&selection.source_table, &selection.source_field, record_id)
                .await?;
            let lines = normalize(&cell);
            if lines.is_empty() {
                skipped_records += 1;
            } else {
                records_created += lines.len();
            }
        }

        Ok(SplitSummary {
            source_records: record_ids.len(),
            skipped_records,
            records_created,
            duration_secs: t_run.elapsed().as_secs_f64(),
        })
    }

    /// Verifies both selected fields belong to their tables before any
    /// record is touched.
    async fn check_fields_exist(
        connector: &dyn BaseConnector,
        selection: &Selection,
    ) -> Result<()> {
        for (table_id, field_id, label) in [
            (&selection.source_table, &selection.source_field, "source"),
            (&selection.target_table, &selection.target_field, "target"),
        ] {
            let fields = connector.get_field_meta_list(table_id).await?;
            if !fields.iter().any(|f| &f.id == field_id) {
                warn!("{} field {} not found in table {}", label, field_id, table_id);
                return Err(SplitterError::Selection(format!(
                    "{label} field '{field_id}' does not exist in table '{table_id}'"
                )));
            }
        }
        Ok(())
    }
}
