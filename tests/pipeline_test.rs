use anyhow::Result;
use serde_json::json;

use multiline_splitter::memory::InMemoryBase;
use multiline_splitter::pipeline::SplitRun;
use multiline_splitter::types::Selection;

struct Fixture {
    base: InMemoryBase,
    selection: Selection,
}

impl Fixture {
    fn new() -> Self {
        let base = InMemoryBase::new();
        let source_table = base.add_table("Source");
        let source_field = base.add_field(&source_table, "Text");
        let target_table = base.add_table("Target");
        let target_field = base.add_field(&target_table, "Line");
        Self {
            base,
            selection: Selection {
                source_table,
                source_field,
                target_table,
                target_field,
            },
        }
    }

    fn seed(&self, value: serde_json::Value) {
        self.base
            .seed_record(&self.selection.source_table, &self.selection.source_field, value);
    }

    fn target_lines(&self) -> Vec<String> {
        self.base
            .field_values(&self.selection.target_table, &self.selection.target_field)
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

#[tokio::test]
async fn splits_two_records_and_skips_the_empty_one() -> Result<()> {
    let fx = Fixture::new();
    fx.seed(json!("a\nb"));
    fx.seed(json!(""));

    let summary = SplitRun::execute(&fx.base, &fx.selection).await?;

    assert_eq!(summary.source_records, 2);
    assert_eq!(summary.skipped_records, 1);
    assert_eq!(summary.records_created, 2);
    assert_eq!(fx.target_lines(), vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn target_order_follows_source_iteration_order() -> Result<()> {
    let fx = Fixture::new();
    fx.seed(json!("one\ntwo"));
    fx.seed(json!("three"));
    fx.seed(json!(["four", "five"]));

    let summary = SplitRun::execute(&fx.base, &fx.selection).await?;

    assert_eq!(summary.records_created, 5);
    assert_eq!(fx.target_lines(), vec!["one", "two", "three", "four", "five"]);
    Ok(())
}

#[tokio::test]
async fn rerunning_appends_duplicates() -> Result<()> {
    // Re-running the same selection is expected to append, not dedup.
    let fx = Fixture::new();
    fx.seed(json!("a\nb"));

    SplitRun::execute(&fx.base, &fx.selection).await?;
    SplitRun::execute(&fx.base, &fx.selection).await?;

    assert_eq!(fx.target_lines(), vec!["a", "b", "a", "b"]);
    Ok(())
}

#[tokio::test]
async fn heterogeneous_cell_shapes_all_produce_lines() -> Result<()> {
    let fx = Fixture::new();
    fx.seed(json!([
        {"type": "text", "text": "x\n"},
        {"type": "text", "text": "y"}
    ]));
    fx.seed(json!({"title": "foo"}));
    fx.seed(json!(null));

    let summary = SplitRun::execute(&fx.base, &fx.selection).await?;

    assert_eq!(summary.records_created, 3);
    assert_eq!(summary.skipped_records, 1);
    assert_eq!(fx.target_lines(), vec!["x", "y", "foo"]);
    Ok(())
}

#[tokio::test]
async fn unknown_field_fails_before_any_write() -> Result<()> {
    let fx = Fixture::new();
    fx.seed(json!("a\nb"));

    let mut bad = fx.selection.clone();
    bad.target_field = "fld_missing".to_string();

    let result = SplitRun::execute(&fx.base, &bad).await;
    assert!(result.is_err());
    assert_eq!(fx.base.record_count(&fx.selection.target_table), 0);
    Ok(())
}

#[tokio::test]
async fn blank_selection_is_rejected_up_front() -> Result<()> {
    let fx = Fixture::new();
    fx.seed(json!("a"));

    let mut bad = fx.selection.clone();
    bad.source_field = String::new();

    let result = SplitRun::execute(&fx.base, &bad).await;
    assert!(result.is_err());
    assert_eq!(fx.base.record_count(&fx.selection.target_table), 0);
    Ok(())
}

#[tokio::test]
async fn midrun_failure_keeps_earlier_writes() -> Result<()> {
    let fx = Fixture::new();
    fx.seed(json!("a\nb\nc"));
    fx.base.fail_writes_after(1);

    let result = SplitRun::execute(&fx.base, &fx.selection).await;

    assert!(result.is_err());
    // The first line landed before the failure; nothing is rolled back.
    assert_eq!(fx.target_lines(), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn dry_run_counts_without_writing() -> Result<()> {
    let fx = Fixture::new();
    fx.seed(json!("a\nb"));
    fx.seed(json!(""));

    let summary = SplitRun::dry_run(&fx.base, &fx.selection).await?;

    assert_eq!(summary.records_created, 2);
    assert_eq!(summary.skipped_records, 1);
    assert_eq!(fx.base.record_count(&fx.selection.target_table), 0);
    Ok(())
}
