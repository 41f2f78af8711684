// qualis-core/src/domain/rules/mod.rs

pub mod dialect;
pub mod result;
pub mod rule;
pub mod translator;

pub use dialect::SqlDialect;
pub use result::{RuleExecutionResult, compute_score};
pub use rule::{Bound, Rule, RuleCheck, RuleConfig, RuleKind};
pub use translator::{RuleQueries, RuleTranslator, TranslatedRule};
