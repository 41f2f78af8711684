// qualis/src/commands/run.rs
//
// USE CASE: Execute quality rules.

use comfy_table::Table;
use std::path::Path;
use tracing::info;

use qualis_core::application::{BatchError, BatchReport};
use qualis_core::domain::rules::RuleExecutionResult;

use super::context::Workspace;

pub async fn execute(
    project_dir: &Path,
    rule: Option<String>,
    table: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let workspace = Workspace::open(project_dir)?;
    let service = &workspace.service;
    if !json {
        println!("⚙️  Project: {} (v{})", workspace.config.name, workspace.config.version);
    }

    let report = match (rule, table) {
        (Some(rule_id), _) => single_report(vec![service.execute_rule(&rule_id).await?]),
        (None, Some(table_id)) => single_report(service.execute_all_for_table(&table_id).await?),
        (None, None) => service.execute_all_active().await,
    };
    info!(
        executed = report.executed_count,
        errors = report.errors.len(),
        "Run finished"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_results(&report.results, &report.errors);
        println!(
            "\n⏱️  {} rule(s) in {:.2?}",
            report.results.len() + report.errors.len(),
            start.elapsed()
        );
    }

    if !report.is_clean() {
        if !json {
            let failed = report.results.iter().filter(|r| !r.passed).count() + report.errors.len();
            eprintln!("\n❌ FAILURE. {} rule(s) did not pass.", failed);
        }
        // Exit with error code for CI/CD
        std::process::exit(1);
    }
    if !json {
        println!("✨ All rules passed.");
    }
    Ok(())
}

/// Report for single-rule and per-table runs, where rejections come back inline.
fn single_report(results: Vec<RuleExecutionResult>) -> BatchReport {
    BatchReport {
        executed_count: results.iter().filter(|r| !is_rejected(r)).count(),
        errors: Vec::new(),
        results,
    }
}

/// Rejected rules never reached their source and were not persisted.
fn is_rejected(result: &RuleExecutionResult) -> bool {
    matches!(
        result.details.get("error_kind").and_then(|k| k.as_str()),
        Some("configuration" | "rule_not_found" | "table_not_found" | "source_not_found")
    )
}

fn print_results(results: &[RuleExecutionResult], errors: &[BatchError]) {
    let mut out = Table::new();
    out.set_header(vec!["Rule", "Status", "Score", "Violations", "Total", "Time (ms)"]);
    for r in results {
        let status = match (r.passed, r.error()) {
            (_, Some(_)) => "💥 error",
            (true, None) => "✅ pass",
            (false, None) => "❌ fail",
        };
        out.add_row(vec![
            r.rule_id.clone(),
            status.to_string(),
            format!("{}%", r.score),
            r.violation_count.to_string(),
            r.total_count.to_string(),
            r.execution_time_ms.to_string(),
        ]);
    }
    println!("{out}");

    for r in results {
        if let Some(err) = r.error() {
            eprintln!("   ⚠️  {}: {}", r.rule_id, err);
        }
    }
    for e in errors {
        eprintln!("   ⚠️  {} ({}): {}", e.rule_name, e.rule_id, e.message);
    }
}
