//! Run report JSON generation.

use crate::pipeline::PipelineResult;
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

pub fn write_report(
    report_path: &Path,
    result: &PipelineResult,
    model: &str,
    include_timestamp: bool,
) -> Result<()> {
    let analysis = &result.analysis;
    let docs = &result.docs;

    let planned: BTreeSet<&str> = result.plan.files.iter().map(|f| f.path.as_str()).collect();
    let discovered: Vec<&str> = docs
        .plan
        .files
        .iter()
        .map(|f| f.path.as_str())
        .filter(|p| !planned.contains(p))
        .collect();

    let plan_files = result
        .plan
        .sorted_files()
        .into_iter()
        .map(|f| {
            json!({
                "path": f.path,
                "title": f.title,
                "order": f.order,
                "source_files": f.source_files,
            })
        })
        .collect::<Vec<_>>();

    let total = result.total_usage();

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert("model".to_string(), Value::String(model.to_string()));
    report.insert("repository".to_string(), serde_json::to_value(&analysis.repository)?);
    report.insert(
        "analysis".to_string(),
        json!({
            "files_included": analysis.files.len(),
            "total_tokens": analysis.total_tokens,
            "truncated": analysis.truncated,
            "listing_truncated": analysis.listing_truncated,
            "skipped_files": analysis.skipped_files,
            "failed_files": analysis.failed_files,
            "redactions": analysis.redactions,
        }),
    );
    report.insert(
        "audience".to_string(),
        json!({
            "audience": result.audience.audience.as_str(),
            "confidence": (result.audience.confidence * 100.0).round() / 100.0,
            "signals": result.audience.signals,
        }),
    );
    report.insert(
        "plan".to_string(),
        json!({
            "fallback": result.plan_fallback,
            "rationale": result.plan.rationale,
            "files": plan_files,
        }),
    );
    report.insert(
        "generation".to_string(),
        json!({
            "strategy": docs.strategy.as_str(),
            "calls": docs.calls,
            "pages": docs.files.keys().collect::<Vec<_>>(),
            "discovered_pages": discovered,
            "failures": docs.failures,
            "total_chars": docs.total_chars(),
        }),
    );
    report.insert(
        "usage".to_string(),
        json!({
            "planning": result.planning_usage,
            "generation": {
                "input_tokens": docs.total_input_tokens,
                "output_tokens": docs.total_output_tokens,
            },
            "total": total,
        }),
    );

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(report))?)?;
    Ok(())
}
