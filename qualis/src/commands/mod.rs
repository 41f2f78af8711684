// qualis/src/commands/mod.rs

pub mod analyze;
pub mod context;
pub mod rules;
pub mod run;
pub mod scores;
