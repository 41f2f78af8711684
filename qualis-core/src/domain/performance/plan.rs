// qualis-core/src/domain/performance/plan.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One operator of a source-supplied execution plan.
/// The engine only reads these trees; connectors build them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanNode {
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_width: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_loops: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    /// Depth-first, pre-order walk over the subtree.
    pub fn iter(&self) -> PlanIter<'_> {
        PlanIter { stack: vec![self] }
    }

    /// Upper-cased node type with separators unified, so `Seq Scan`,
    /// `SEQ_SCAN` and `seq-scan` compare equal.
    fn normalized_type(&self) -> String {
        self.node_type
            .trim()
            .to_ascii_uppercase()
            .replace(&['_', '-'][..], " ")
    }

    pub fn is_sequential_scan(&self) -> bool {
        let t = self.normalized_type();
        t == "SEQ SCAN" || t == "SEQUENTIAL SCAN" || t == "TABLE SCAN" || t == "FULL TABLE SCAN"
    }

    pub fn is_nested_loop(&self) -> bool {
        let t = self.normalized_type();
        t.starts_with("NESTED LOOP")
    }
}

pub struct PlanIter<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> Iterator for PlanIter<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Plan attached to an analysis. `degraded` marks the placeholder used
/// when the source could not explain the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub root: PlanNode,
    pub degraded: bool,
}

impl ExecutionPlan {
    pub fn from_source(root: PlanNode) -> Self {
        Self {
            root,
            degraded: false,
        }
    }

    pub fn placeholder(reason: &str) -> Self {
        let mut root = PlanNode::new("Unknown");
        root.operation = Some(format!("plan unavailable: {}", reason));
        Self {
            root,
            degraded: true,
        }
    }

    pub fn nodes(&self) -> PlanIter<'_> {
        self.root.iter()
    }

    pub fn indexes_used(&self) -> BTreeSet<String> {
        self.nodes()
            .filter_map(|n| n.index_name.clone())
            .collect()
    }
}
