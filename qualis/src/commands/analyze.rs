// qualis/src/commands/analyze.rs
//
// USE CASE: Grade the performance of an ad-hoc read-only query.

use comfy_table::Table;
use serde_json::json;
use std::path::Path;

use qualis_core::application::{AnalyzeOptions, QueryExecutionResult};

use super::context::Workspace;

pub async fn execute(
    project_dir: &Path,
    query: &str,
    source: &str,
    explain: bool,
    repeat: u32,
    json: bool,
) -> anyhow::Result<()> {
    let workspace = Workspace::open(project_dir)?;
    let service = &workspace.service;

    let mut runs = Vec::with_capacity(repeat as usize);
    for _ in 0..repeat {
        runs.push(
            service
                .analyze_query(query, source, AnalyzeOptions { explain })
                .await?,
        );
    }
    let Some(last) = runs.last() else {
        return Ok(());
    };

    let history = service.query_history(&last.query_id)?;
    let stats = service.performance_stats()?;
    let alerts = service.alerts()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "result": last,
                "history": history,
                "stats": stats,
                "alerts": alerts,
            }))?
        );
    } else {
        print_result(last);
        println!(
            "\n📈 {} run(s) retained, average {:.1} ms",
            stats.total_queries, stats.average_execution_time_ms
        );
        for alert in &alerts {
            println!(
                "🚨 Slow query {} on {}: grade {} after {} ms ({} occurrence(s))",
                alert.query_id,
                alert.source_id,
                alert.last_grade,
                alert.last_execution_time_ms,
                alert.occurrences
            );
        }
    }

    if !last.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_result(result: &QueryExecutionResult) {
    println!("⚡ Query {} on {}", result.query_id, result.source_id);
    if let Some(err) = &result.error {
        eprintln!("❌ Query failed: {}", err);
    }

    let m = &result.metrics;
    let mut out = Table::new();
    out.set_header(vec!["Metric", "Value"]);
    out.add_row(vec!["Grade".to_string(), format!("{} ({}/100)", result.grade, result.performance_score)]);
    out.add_row(vec!["Execution time".to_string(), format!("{} ms", m.execution_time_ms)]);
    out.add_row(vec!["Rows returned".to_string(), m.rows_returned.to_string()]);
    out.add_row(vec!["Rows scanned (est.)".to_string(), m.rows_scanned.to_string()]);
    out.add_row(vec!["Memory (est.)".to_string(), format!("{:.3} MB", m.memory_usage_mb)]);
    out.add_row(vec!["CPU (est.)".to_string(), format!("{:.1} ms", m.cpu_time_ms)]);
    out.add_row(vec!["I/O ops (est.)".to_string(), m.io_operations.to_string()]);
    out.add_row(vec!["Cache hits (est.)".to_string(), m.cache_hits.to_string()]);
    if !m.indexes_used.is_empty() {
        let indexes: Vec<&str> = m.indexes_used.iter().map(String::as_str).collect();
        out.add_row(vec!["Indexes".to_string(), indexes.join(", ")]);
    }
    println!("{out}");

    if let Some(plan) = &result.plan {
        let label = if plan.degraded { " (unavailable)" } else { "" };
        println!("🗺️  Plan{}:", label);
        for node in plan.nodes() {
            match &node.relation {
                Some(rel) => println!("   ➜ {} [{}]", node.node_type, rel),
                None => println!("   ➜ {}", node.node_type),
            }
        }
    }

    for warning in &m.warnings {
        println!("⚠️  {}", warning);
    }
    for suggestion in &result.suggestions {
        println!("💡 {}", suggestion);
    }
}
