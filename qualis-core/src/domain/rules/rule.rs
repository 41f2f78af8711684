// qualis-core/src/domain/rules/rule.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::DomainError;

/// Validation strategy of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    NonNull,
    Format,
    Range,
    Uniqueness,
    Custom,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::NonNull => "non_null",
            RuleKind::Format => "format",
            RuleKind::Range => "range",
            RuleKind::Uniqueness => "uniqueness",
            RuleKind::Custom => "custom",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw kind-specific payload, as written by the operator.
///
/// Nothing here is checked at load time: a rule with a missing pattern still
/// loads, and only fails when it is translated (see [`RuleCheck::from_rule`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default = "default_true")]
    pub min_inclusive: bool,
    #[serde(default = "default_true")]
    pub max_inclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            pattern: None,
            min: None,
            max: None,
            min_inclusive: true,
            max_inclusive: true,
            query: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: RuleKind,
    /// Target table id.
    pub table: String,
    /// Target field, required by every kind except `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub config: RuleConfig,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

/// A rule reduced to exactly what its kind needs.
///
/// Built from a [`Rule`] by [`RuleCheck::from_rule`], which is where every
/// configuration problem is caught, before any query exists.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck<'a> {
    NonNull {
        field: &'a str,
    },
    Format {
        field: &'a str,
        pattern: &'a str,
    },
    Range {
        field: &'a str,
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
    Uniqueness {
        field: &'a str,
    },
    Custom {
        query: &'a str,
    },
}

impl<'a> RuleCheck<'a> {
    pub fn from_rule(rule: &'a Rule) -> Result<Self, DomainError> {
        let config = &rule.config;
        let check = match rule.kind {
            RuleKind::NonNull => RuleCheck::NonNull {
                field: required_field(rule)?,
            },
            RuleKind::Format => {
                let field = required_field(rule)?;
                let pattern = non_blank(config.pattern.as_deref()).ok_or_else(|| {
                    DomainError::configuration(&rule.name, "format rule requires a pattern")
                })?;
                regex::Regex::new(pattern).map_err(|e| {
                    DomainError::configuration(&rule.name, format!("invalid pattern: {}", e))
                })?;
                RuleCheck::Format { field, pattern }
            }
            RuleKind::Range => {
                let field = required_field(rule)?;
                let lower = bound(rule, config.min, config.min_inclusive, "min")?;
                let upper = bound(rule, config.max, config.max_inclusive, "max")?;
                if lower.is_none() && upper.is_none() {
                    return Err(DomainError::configuration(
                        &rule.name,
                        "range rule requires at least one of min/max",
                    ));
                }
                if let (Some(lo), Some(hi)) = (lower, upper)
                    && lo.value > hi.value
                {
                    return Err(DomainError::configuration(
                        &rule.name,
                        format!("min ({}) is greater than max ({})", lo.value, hi.value),
                    ));
                }
                RuleCheck::Range {
                    field,
                    lower,
                    upper,
                }
            }
            RuleKind::Uniqueness => RuleCheck::Uniqueness {
                field: required_field(rule)?,
            },
            RuleKind::Custom => RuleCheck::Custom {
                query: non_blank(config.query.as_deref()).ok_or_else(|| {
                    DomainError::configuration(&rule.name, "custom rule requires a query")
                })?,
            },
        };
        Ok(check)
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RuleCheck::NonNull { .. } => RuleKind::NonNull,
            RuleCheck::Format { .. } => RuleKind::Format,
            RuleCheck::Range { .. } => RuleKind::Range,
            RuleCheck::Uniqueness { .. } => RuleKind::Uniqueness,
            RuleCheck::Custom { .. } => RuleKind::Custom,
        }
    }
}

fn required_field(rule: &Rule) -> Result<&str, DomainError> {
    non_blank(rule.field.as_deref()).ok_or_else(|| {
        DomainError::configuration(
            &rule.name,
            format!("{} rule requires a target field", rule.kind),
        )
    })
}

fn bound(
    rule: &Rule,
    value: Option<f64>,
    inclusive: bool,
    label: &str,
) -> Result<Option<Bound>, DomainError> {
    match value {
        None => Ok(None),
        Some(v) if !v.is_finite() => Err(DomainError::configuration(
            &rule.name,
            format!("{} must be a finite number", label),
        )),
        Some(v) => Ok(Some(Bound {
            value: v,
            inclusive,
        })),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
