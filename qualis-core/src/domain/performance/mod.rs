// qualis-core/src/domain/performance/mod.rs

pub mod grader;
pub mod heuristics;
pub mod metrics;
pub mod plan;
pub mod shape;

pub use grader::{GradeReport, PerformanceGrade, PerformanceGrader};
pub use metrics::QueryMetrics;
pub use plan::{ExecutionPlan, PlanNode};
pub use shape::QueryShape;
