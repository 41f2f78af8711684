// qualis-core/src/application/mock.rs
// Scriptable connector shared by the application tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::activity::ActivityEntry;
use crate::domain::catalog::{Catalog, SourceDescriptor, SourceEngine, TableRef};
use crate::domain::performance::PlanNode;
use crate::domain::rules::{Rule, RuleConfig, RuleKind};
use crate::error::QualisError;
use crate::ports::connector::{Row, SourceConnector, SourceSession};
use crate::ports::store::ActivityLog;

type Responder = dyn Fn(&str) -> Result<Vec<Row>, QualisError> + Send + Sync;

pub(crate) struct MockConnector {
    pub issued: Arc<Mutex<Vec<String>>>,
    responder: Arc<Responder>,
    plan: Option<PlanNode>,
    delay: Duration,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<Row>, QualisError> + Send + Sync + 'static,
    {
        Self {
            issued: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
            plan: None,
            delay: Duration::ZERO,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answers count queries: `total` for total_count, `violations` for violation_count.
    pub fn counts(total: u64, violations: u64) -> Self {
        Self::new(move |sql| {
            if sql.contains("violation_count") {
                Ok(vec![row("violation_count", json!(violations))])
            } else {
                Ok(vec![row("total_count", json!(total))])
            }
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_plan(mut self, plan: PlanNode) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Most sessions ever open at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn open_now(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SourceConnector for MockConnector {
    async fn open(&self, _source: &SourceDescriptor) -> Result<Box<dyn SourceSession>, QualisError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            issued: self.issued.clone(),
            responder: self.responder.clone(),
            plan: self.plan.clone(),
            delay: self.delay,
            active: self.active.clone(),
        }))
    }
}

struct MockSession {
    issued: Arc<Mutex<Vec<String>>>,
    responder: Arc<Responder>,
    plan: Option<PlanNode>,
    delay: Duration,
    active: Arc<AtomicUsize>,
}

#[async_trait]
impl SourceSession for MockSession {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, QualisError> {
        if let Ok(mut issued) = self.issued.lock() {
            issued.push(sql.to_string());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(sql)
    }

    async fn explain(&mut self, sql: &str) -> Result<PlanNode, QualisError> {
        self.plan
            .clone()
            .ok_or_else(|| QualisError::Connector(format!("no plan for {}", sql)))
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) fn row(column: &str, value: Value) -> Row {
    let mut r = Row::new();
    r.insert(column.to_string(), value);
    r
}

pub(crate) fn rule(id: &str, kind: RuleKind, field: Option<&str>, config: RuleConfig) -> Rule {
    Rule {
        id: id.to_string(),
        name: format!("{}_rule", id),
        owner: String::new(),
        description: None,
        kind,
        table: "t1".to_string(),
        field: field.map(str::to_string),
        config,
        active: true,
    }
}

pub(crate) fn catalog(rules: Vec<Rule>) -> Catalog {
    Catalog::new(
        vec![SourceDescriptor {
            id: "s1".into(),
            name: "warehouse".into(),
            engine: SourceEngine::DuckDB,
            dialect: None,
            location: ":memory:".into(),
        }],
        vec![TableRef {
            id: "t1".into(),
            name: "people".into(),
            source: "s1".into(),
        }],
        rules,
    )
}

/// Activity log whose writes always fail.
pub(crate) struct BrokenActivityLog;

#[async_trait]
impl ActivityLog for BrokenActivityLog {
    async fn record(&self, _entry: ActivityEntry) -> Result<(), QualisError> {
        Err(QualisError::InternalError("activity log unavailable".into()))
    }

    async fn entries(&self) -> Result<Vec<ActivityEntry>, QualisError> {
        Ok(Vec::new())
    }
}
