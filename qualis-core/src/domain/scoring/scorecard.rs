// qualis-core/src/domain/scoring/scorecard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::catalog::Catalog;
use crate::domain::rules::RuleExecutionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    New,
}

/// Per-table aggregate of the latest score of each rule. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScoreCard {
    pub table_id: String,
    pub table_name: String,
    pub source_id: String,
    pub source_name: String,
    pub rule_count: usize,
    pub passed_rules: usize,
    pub failed_rules: usize,
    pub overall_score: u8,
    pub last_executed: Option<DateTime<Utc>>,
    pub trend: Trend,
}

pub struct ScoreAggregator;

impl ScoreAggregator {
    /// One card per table that has at least one rule; tables without rules are omitted.
    pub fn score_cards(catalog: &Catalog, results: &[RuleExecutionResult]) -> Vec<QualityScoreCard> {
        // rule id -> its runs, oldest first
        let mut history: HashMap<&str, Vec<&RuleExecutionResult>> = HashMap::new();
        for result in results {
            history.entry(result.rule_id.as_str()).or_default().push(result);
        }
        for runs in history.values_mut() {
            runs.sort_by_key(|r| r.executed_at);
        }

        let mut cards = Vec::new();
        for table in catalog.tables() {
            let rules: Vec<_> = catalog.rules_for_table(&table.id).collect();
            if rules.is_empty() {
                continue;
            }
            let source_name = catalog
                .source(&table.source)
                .map(|s| s.name.clone())
                .unwrap_or_else(|_| table.source.clone());

            let mut latest = Vec::new();
            let mut previous = Vec::new();
            for rule in &rules {
                if let Some(runs) = history.get(rule.id.as_str()) {
                    let mut newest_first = runs.iter().rev();
                    if let Some(last) = newest_first.next() {
                        latest.push(*last);
                    }
                    if let Some(before) = newest_first.next() {
                        previous.push(*before);
                    }
                }
            }

            let current = Self::overall(latest.iter().map(|r| r.score));
            let prior = Self::overall(previous.iter().map(|r| r.score));
            let trend = match current {
                Some(score) => Self::classify(score, prior),
                None => Trend::New,
            };

            cards.push(QualityScoreCard {
                table_id: table.id.clone(),
                table_name: table.name.clone(),
                source_id: table.source.clone(),
                source_name,
                rule_count: rules.len(),
                passed_rules: latest.iter().filter(|r| r.passed).count(),
                failed_rules: latest.iter().filter(|r| !r.passed).count(),
                overall_score: current.unwrap_or(0),
                last_executed: latest.iter().map(|r| r.executed_at).max(),
                trend,
            });
        }
        cards
    }

    /// Rounded arithmetic mean, `None` for an empty window.
    pub fn overall(scores: impl Iterator<Item = u8>) -> Option<u8> {
        let (sum, count) = scores.fold((0u64, 0u64), |(s, c), v| (s + u64::from(v), c + 1));
        if count == 0 {
            return None;
        }
        Some((sum as f64 / count as f64).round() as u8)
    }

    pub fn classify(current: u8, prior: Option<u8>) -> Trend {
        match prior {
            None => Trend::New,
            Some(p) if current > p => Trend::Improving,
            Some(p) if current < p => Trend::Declining,
            Some(_) => Trend::Stable,
        }
    }
}
