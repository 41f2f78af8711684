// qualis/src/commands/rules.rs
//
// USE CASE: List the configured rules.

use comfy_table::Table;
use std::path::Path;

use super::context;

pub fn execute(project_dir: &Path, table: Option<String>, json: bool) -> anyhow::Result<()> {
    let config = context::load_config(project_dir)?;
    let catalog = context::catalog(&config, project_dir);

    let rules: Vec<_> = match &table {
        Some(table_id) => {
            catalog.table(table_id)?;
            catalog.rules_for_table(table_id).collect()
        }
        None => catalog.rules().iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules configured.");
        return Ok(());
    }

    let mut out = Table::new();
    out.set_header(vec!["ID", "Name", "Kind", "Table", "Field", "Active"]);
    for rule in &rules {
        out.add_row(vec![
            rule.id.clone(),
            rule.name.clone(),
            rule.kind.to_string(),
            rule.table.clone(),
            rule.field.clone().unwrap_or_else(|| "-".into()),
            if rule.active { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{out}");
    Ok(())
}
