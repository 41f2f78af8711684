// qualis/src/commands/scores.rs
//
// USE CASE: Per-table score cards, also saved to target/scorecards.json.

use comfy_table::Table;
use std::path::Path;
use tracing::info;

use qualis_core::domain::scoring::Trend;
use qualis_core::infrastructure::fs::atomic_write;

use super::context::Workspace;

pub async fn execute(project_dir: &Path, json: bool) -> anyhow::Result<()> {
    let workspace = Workspace::open(project_dir)?;
    let cards = workspace.service.score_cards().await?;

    let rendered = serde_json::to_string_pretty(&cards)?;
    std::fs::create_dir_all(&workspace.target_dir)?;
    let out_path = workspace.target_dir.join("scorecards.json");
    atomic_write(&out_path, &rendered)?;
    info!(path = ?out_path, tables = cards.len(), "Score cards saved");

    if json {
        println!("{}", rendered);
        return Ok(());
    }

    if cards.is_empty() {
        println!("No table has rules yet.");
        return Ok(());
    }

    let mut out = Table::new();
    out.set_header(vec![
        "Table", "Source", "Rules", "Passed", "Failed", "Score", "Trend", "Last run",
    ]);
    for card in &cards {
        out.add_row(vec![
            card.table_name.clone(),
            card.source_name.clone(),
            card.rule_count.to_string(),
            card.passed_rules.to_string(),
            card.failed_rules.to_string(),
            format!("{}%", card.overall_score),
            trend_label(card.trend).to_string(),
            card.last_executed
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".into()),
        ]);
    }
    println!("{out}");
    println!("📄 Saved to {}", out_path.display());
    Ok(())
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Improving => "📈 improving",
        Trend::Declining => "📉 declining",
        Trend::Stable => "➡️ stable",
        Trend::New => "🆕 new",
    }
}
