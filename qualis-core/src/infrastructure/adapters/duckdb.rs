// qualis-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::types::Value as DuckValue;
use duckdb::{AccessMode, Config, Connection, InterruptHandle};
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

// Hexagonal Imports
use crate::domain::catalog::{SourceDescriptor, SourceEngine};
use crate::domain::performance::PlanNode;
use crate::error::QualisError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::{Row, SourceConnector, SourceSession};

/// DuckDB-backed source connector.
///
/// Each database file is opened once (read-only) and kept as the root handle;
/// every session is a fresh connection cloned from it and closed on drop.
pub struct DuckDBConnector {
    databases: Mutex<HashMap<String, Connection>>,
}

impl Default for DuckDBConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDBConnector {
    pub fn new() -> Self {
        Self {
            databases: Mutex::new(HashMap::new()),
        }
    }

    /// Registers an already-open database under `location`.
    /// Used for in-memory databases, which cannot be reopened by path.
    pub fn attach(&self, location: &str, conn: Connection) -> Result<(), QualisError> {
        self.lock()?.insert(location.to_string(), conn);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Connection>>, QualisError> {
        self.databases
            .lock()
            .map_err(|_| QualisError::Connector("DuckDB Mutex Poisoned".into()))
    }

    fn connect(&self, location: &str) -> Result<Connection, QualisError> {
        let mut databases = self.lock()?;
        if let Some(root) = databases.get(location) {
            return Ok(root.try_clone()?);
        }

        let root = if location == ":memory:" {
            Connection::open_in_memory()?
        } else {
            let config = Config::default().access_mode(AccessMode::ReadOnly)?;
            Connection::open_with_flags(location, config)?
        };
        let session = root.try_clone()?;
        databases.insert(location.to_string(), root);
        Ok(session)
    }
}

#[async_trait]
impl SourceConnector for DuckDBConnector {
    async fn open(&self, source: &SourceDescriptor) -> Result<Box<dyn SourceSession>, QualisError> {
        match source.engine {
            SourceEngine::DuckDB => {
                debug!(source = %source.id, location = %source.location, "Opening DuckDB session");
                let conn = self.connect(&source.location)?;
                Ok(Box::new(DuckDBSession { conn }))
            }
        }
    }
}

pub struct DuckDBSession {
    conn: Connection,
}

#[async_trait]
impl SourceSession for DuckDBSession {
    /// Runs on the blocking pool. If the caller stops waiting (timeout),
    /// the running statement is interrupted.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, QualisError> {
        let conn = self.conn.try_clone()?;
        let mut guard = InterruptOnDrop {
            handle: conn.interrupt_handle(),
            armed: true,
        };
        let sql = sql.to_string();

        let rows = tokio::task::spawn_blocking(move || fetch_rows(&conn, &sql))
            .await
            .map_err(|e| QualisError::InternalError(format!("DuckDB worker failed: {}", e)))??;
        guard.armed = false;
        Ok(rows)
    }

    async fn explain(&mut self, sql: &str) -> Result<PlanNode, QualisError> {
        let rows = self.query(&format!("EXPLAIN (FORMAT JSON) {}", sql)).await?;
        let raw = rows
            .iter()
            .find_map(|r| r.get("explain_value").and_then(Value::as_str))
            .ok_or_else(|| QualisError::Connector("EXPLAIN returned no plan".into()))?;

        let parsed: Value = serde_json::from_str(raw).map_err(InfrastructureError::from)?;
        let root = match parsed {
            Value::Array(mut nodes) if !nodes.is_empty() => nodes.swap_remove(0),
            node @ Value::Object(_) => node,
            _ => return Err(QualisError::Connector("EXPLAIN returned an empty plan".into())),
        };
        Ok(plan_node(&root))
    }
}

/// Interrupts the statement unless it completed.
struct InterruptOnDrop {
    handle: Arc<InterruptHandle>,
    armed: bool,
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if self.armed {
            debug!("Interrupting abandoned DuckDB statement");
            self.handle.interrupt();
        }
    }
}

impl Drop for DuckDBSession {
    fn drop(&mut self) {
        debug!("Closing DuckDB session");
    }
}

fn fetch_rows(conn: &Connection, sql: &str) -> Result<Vec<Row>, QualisError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let names: Vec<String> = rows.as_ref().map(|s| s.column_names()).unwrap_or_default();

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, name) in names.iter().enumerate() {
            let value: DuckValue = row.get(idx)?;
            record.insert(name.clone(), to_json(value));
        }
        out.push(record);
    }
    Ok(out)
}

fn to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => i.into(),
        DuckValue::SmallInt(i) => i.into(),
        DuckValue::Int(i) => i.into(),
        DuckValue::BigInt(i) => i.into(),
        DuckValue::HugeInt(i) => i64::try_from(i)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(i.to_string())),
        DuckValue::UTinyInt(i) => i.into(),
        DuckValue::USmallInt(i) => i.into(),
        DuckValue::UInt(i) => i.into(),
        DuckValue::UBigInt(i) => i.into(),
        DuckValue::Float(f) => float(f64::from(f)),
        DuckValue::Double(f) => float(f),
        DuckValue::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(float)
            .unwrap_or_else(|_| Value::String(d.to_string())),
        DuckValue::Text(s) => Value::String(s),
        other => Value::String(format!("{:?}", other)),
    }
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Maps DuckDB's JSON plan (`name`, `extra_info`, `children`) onto a plan node.
fn plan_node(value: &Value) -> PlanNode {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN");
    let mut node = PlanNode::new(name.trim());

    if let Some(extra) = value.get("extra_info").and_then(Value::as_object) {
        node.relation = extra.get("Table").and_then(text);
        node.join_type = extra.get("Join Type").and_then(text);
        node.filter = extra
            .get("Filters")
            .or_else(|| extra.get("Conditions"))
            .and_then(text);
        node.index_name = extra.get("Index").and_then(text);
        node.estimated_rows = extra
            .get("Estimated Cardinality")
            .and_then(text)
            .and_then(|s| s.trim_start_matches('~').parse().ok());
        node.operation = extra.get("Aggregates").and_then(text);
    }

    node.children = value
        .get("children")
        .and_then(Value::as_array)
        .map(|children| children.iter().map(plan_node).collect())
        .unwrap_or_default();
    node
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(" AND "))
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn memory_source() -> SourceDescriptor {
        SourceDescriptor {
            id: "mem".into(),
            name: "Memory".into(),
            engine: SourceEngine::DuckDB,
            dialect: None,
            location: ":memory:".into(),
        }
    }

    fn seeded() -> Result<DuckDBConnector> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER, name VARCHAR, score DOUBLE);
             INSERT INTO users VALUES (1, 'Alice', 9.5), (2, NULL, 7.0);",
        )?;
        let connector = DuckDBConnector::new();
        connector.attach(":memory:", conn)?;
        Ok(connector)
    }

    #[tokio::test]
    async fn test_duckdb_query_rows() -> Result<()> {
        let connector = seeded()?;
        let mut session = connector.open(&memory_source()).await?;

        let rows = session
            .query("SELECT id, name, score FROM users ORDER BY id")
            .await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&json!(1)));
        assert_eq!(rows[0].get("name"), Some(&json!("Alice")));
        assert_eq!(rows[1].get("name"), Some(&Value::Null));
        assert_eq!(rows[1].get("score"), Some(&json!(7.0)));

        let counts = session.query("SELECT COUNT(*) AS total_count FROM users").await?;
        assert_eq!(counts[0].get("total_count"), Some(&json!(2)));
        Ok(())
    }

    #[tokio::test]
    async fn test_sessions_share_the_attached_database() -> Result<()> {
        let connector = seeded()?;
        let mut a = connector.open(&memory_source()).await?;
        let mut b = connector.open(&memory_source()).await?;
        assert_eq!(a.query("SELECT * FROM users").await?.len(), 2);
        drop(a);
        assert_eq!(b.query("SELECT * FROM users").await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_error() -> Result<()> {
        let connector = seeded()?;
        let mut session = connector.open(&memory_source()).await?;
        let result = session.query("SELECT * FROM non_existent_table").await;
        assert!(matches!(result, Err(ref e) if e.is_operational()));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_a_connector_failure() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let source = SourceDescriptor {
            location: tmp.path().join("absent.duckdb").to_string_lossy().into_owned(),
            ..memory_source()
        };
        let result = DuckDBConnector::new().open(&source).await;
        assert!(matches!(result, Err(ref e) if e.is_operational()));
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_explain() -> Result<()> {
        let connector = seeded()?;
        let mut session = connector.open(&memory_source()).await?;
        let plan = session.explain("SELECT name FROM users WHERE id > 1").await?;
        assert!(!plan.node_type.is_empty());
        assert!(plan.iter().count() >= 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_abandoned_statement_is_interrupted() -> Result<()> {
        let connector = seeded()?;
        let mut session = connector.open(&memory_source()).await?;

        let start = std::time::Instant::now();
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            session.query("SELECT COUNT(*) FROM range(40000) a, range(40000) b WHERE a.range <> b.range"),
        )
        .await;
        assert!(outcome.is_err());
        assert!(start.elapsed() < std::time::Duration::from_secs(2));

        // the session stays usable once the interrupted statement unwinds
        let rows = session.query("SELECT COUNT(*) AS n FROM users").await?;
        assert_eq!(rows[0].get("n"), Some(&json!(2)));
        Ok(())
    }

    #[test]
    fn test_plan_node_mapping() {
        let raw = json!({
            "name": "HASH_JOIN ",
            "extra_info": {"Join Type": "INNER", "Conditions": ["a = b"], "Estimated Cardinality": "~12"},
            "children": [
                {"name": "SEQ_SCAN ", "extra_info": {"Table": "orders", "Filters": ["x > 1", "y < 2"]}, "children": []}
            ]
        });
        let node = plan_node(&raw);
        assert_eq!(node.node_type, "HASH_JOIN");
        assert_eq!(node.join_type.as_deref(), Some("INNER"));
        assert_eq!(node.estimated_rows, Some(12));
        assert_eq!(node.children.len(), 1);
        let scan = &node.children[0];
        assert!(scan.is_sequential_scan());
        assert_eq!(scan.relation.as_deref(), Some("orders"));
        assert_eq!(scan.filter.as_deref(), Some("x > 1 AND y < 2"));
    }
}
