// End-to-end checks of rule scoring and query analysis against a real DuckDB file.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use qualis_core::QualisService;
use qualis_core::application::AnalyzeOptions;
use qualis_core::domain::catalog::{Catalog, SourceDescriptor, SourceEngine, TableRef};
use qualis_core::domain::performance::PerformanceGrade;
use qualis_core::domain::project::EngineSettings;
use qualis_core::domain::rules::{Rule, RuleConfig, RuleKind};
use qualis_core::domain::scoring::Trend;
use qualis_core::infrastructure::adapters::DuckDBConnector;
use qualis_core::infrastructure::store::{InMemoryActivityLog, InMemoryResultStore};
use qualis_core::ports::store::{ActivityLog, ResultStore};

fn seed(path: &Path) -> Result<()> {
    let conn = duckdb::Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE measures (reading INTEGER);
         INSERT INTO measures VALUES (-5), (0), (50), (120);
         CREATE TABLE contacts (email VARCHAR);
         INSERT INTO contacts VALUES ('a'), (''), (NULL), ('b'), (NULL);
         CREATE TABLE codes (code INTEGER);
         INSERT INTO codes VALUES (1), (1), (2), (3), (3), (3);",
    )?;
    Ok(())
}

fn rule(id: &str, kind: RuleKind, table: &str, field: Option<&str>, config: RuleConfig) -> Rule {
    Rule {
        id: id.into(),
        name: id.into(),
        owner: "data-team".into(),
        description: None,
        kind,
        table: table.into(),
        field: field.map(Into::into),
        config,
        active: true,
    }
}

fn catalog(location: &str, rules: Vec<Rule>) -> Catalog {
    let table = |id: &str| TableRef {
        id: id.into(),
        name: id.into(),
        source: "lake".into(),
    };
    Catalog::new(
        vec![SourceDescriptor {
            id: "lake".into(),
            name: "local lake".into(),
            engine: SourceEngine::DuckDB,
            dialect: None,
            location: location.into(),
        }],
        vec![table("measures"), table("contacts"), table("codes")],
        rules,
    )
}

struct Fixture {
    service: QualisService,
    results: Arc<InMemoryResultStore>,
    activity: Arc<InMemoryActivityLog>,
    _dir: tempfile::TempDir,
}

fn fixture(rules: Vec<Rule>) -> Result<Fixture> {
    fixture_with(&EngineSettings::default(), rules)
}

fn fixture_with(settings: &EngineSettings, rules: Vec<Rule>) -> Result<Fixture> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("lake.duckdb");
    seed(&db)?;

    let results = Arc::new(InMemoryResultStore::new());
    let activity = Arc::new(InMemoryActivityLog::new());
    let service = QualisService::new(
        catalog(&db.to_string_lossy(), rules),
        settings,
        Arc::new(DuckDBConnector::new()),
        results.clone(),
        activity.clone(),
    );
    Ok(Fixture {
        service,
        results,
        activity,
        _dir: dir,
    })
}

fn range_rule() -> Rule {
    rule(
        "reading_in_range",
        RuleKind::Range,
        "measures",
        Some("reading"),
        RuleConfig {
            min: Some(0.0),
            max: Some(100.0),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_range_rule_scores_half() -> Result<()> {
    let f = fixture(vec![range_rule()])?;
    let result = f.service.execute_rule("reading_in_range").await?;

    assert_eq!(result.total_count, 4);
    assert_eq!(result.violation_count, 2);
    assert_eq!(result.score, 50);
    assert!(!result.passed);
    Ok(())
}

#[tokio::test]
async fn test_exclusive_bounds_count_the_edges() -> Result<()> {
    let mut rule = range_rule();
    rule.config.min_inclusive = false;
    let f = fixture(vec![rule])?;

    // 0 now violates too
    let result = f.service.execute_rule("reading_in_range").await?;
    assert_eq!(result.violation_count, 3);
    Ok(())
}

#[tokio::test]
async fn test_non_null_ignores_empty_strings() -> Result<()> {
    let f = fixture(vec![rule(
        "email_present",
        RuleKind::NonNull,
        "contacts",
        Some("email"),
        RuleConfig::default(),
    )])?;
    let result = f.service.execute_rule("email_present").await?;

    assert_eq!((result.total_count, result.violation_count, result.score), (5, 2, 60));
    let entries = f.activity.entries().await?;
    assert_eq!(
        entries[0].message,
        "rule 'email_present' executed on contacts — score 60%"
    );
    Ok(())
}

#[tokio::test]
async fn test_uniqueness_counts_duplicates() -> Result<()> {
    let f = fixture(vec![rule(
        "code_unique",
        RuleKind::Uniqueness,
        "codes",
        Some("code"),
        RuleConfig::default(),
    )])?;
    let result = f.service.execute_rule("code_unique").await?;

    assert_eq!((result.total_count, result.violation_count, result.score), (6, 3, 50));
    Ok(())
}

#[tokio::test]
async fn test_format_and_custom_rules() -> Result<()> {
    let f = fixture(vec![
        rule(
            "email_shape",
            RuleKind::Format,
            "contacts",
            Some("email"),
            RuleConfig {
                pattern: Some("^[a-z]+$".into()),
                ..Default::default()
            },
        ),
        rule(
            "no_negative",
            RuleKind::Custom,
            "measures",
            None,
            RuleConfig {
                query: Some(
                    "SELECT COUNT(*) AS total_count,
                            COUNT(*) FILTER (WHERE reading < 0) AS violation_count,
                            COUNT(*) FILTER (WHERE reading < 0) = 0 AS passed
                     FROM measures;"
                        .into(),
                ),
                ..Default::default()
            },
        ),
    ])?;

    // three non-null emails, the empty one does not match
    let format = f.service.execute_rule("email_shape").await?;
    assert_eq!((format.total_count, format.violation_count), (3, 1));

    let custom = f.service.execute_rule("no_negative").await?;
    assert_eq!((custom.total_count, custom.violation_count, custom.score), (4, 1, 75));
    assert!(!custom.passed);
    Ok(())
}

#[tokio::test]
async fn test_bulk_run_isolates_invalid_rule() -> Result<()> {
    let broken = rule(
        "broken_range",
        RuleKind::Range,
        "measures",
        Some("reading"),
        RuleConfig::default(),
    );
    let f = fixture(vec![
        rule("email_present", RuleKind::NonNull, "contacts", Some("email"), RuleConfig::default()),
        broken,
        rule("code_unique", RuleKind::Uniqueness, "codes", Some("code"), RuleConfig::default()),
    ])?;

    let report = f.service.execute_all_active().await;
    assert_eq!(report.executed_count, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].rule_name, "broken_range");
    assert_eq!(f.results.all().await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_table_is_absorbed() -> Result<()> {
    let f = fixture(vec![rule(
        "ghost",
        RuleKind::NonNull,
        "ghosts",
        Some("id"),
        RuleConfig::default(),
    )])?;
    // "ghosts" is not in the catalog: rejected before any connection, never stored
    let rejected = f.service.execute_rule("ghost").await?;
    assert!(rejected.is_failure());
    assert_eq!(rejected.details["error_kind"], "table_not_found");
    assert!(f.results.all().await?.is_empty());

    let f = fixture(vec![rule(
        "bad_column",
        RuleKind::NonNull,
        "codes",
        Some("no_such_column"),
        RuleConfig::default(),
    )])?;
    // the column only fails at the source: operational
    let result = f.service.execute_rule("bad_column").await?;
    assert!(result.is_failure());
    assert_eq!(result.score, 0);
    Ok(())
}

#[tokio::test]
async fn test_timeout_bounds_a_slow_source_query() -> Result<()> {
    let settings = EngineSettings {
        query_timeout_ms: 100,
        ..EngineSettings::default()
    };
    let slow = rule(
        "cross_product",
        RuleKind::Custom,
        "measures",
        None,
        RuleConfig {
            query: Some(
                "SELECT COUNT(*) AS total_count, 0 AS violation_count
                 FROM range(40000) a, range(40000) b WHERE a.range <> b.range"
                    .into(),
            ),
            ..Default::default()
        },
    );
    let f = fixture_with(&settings, vec![slow, range_rule()])?;

    let start = Instant::now();
    let result = f.service.execute_rule("cross_product").await?;
    assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
    assert!(!result.passed);
    assert_eq!(result.details["error_kind"], "timeout");

    // the interrupted statement leaves the source usable
    let next = f.service.execute_rule("reading_in_range").await?;
    assert_eq!(next.score, 50);
    Ok(())
}

#[tokio::test]
async fn test_score_cards_follow_runs() -> Result<()> {
    let f = fixture(vec![range_rule()])?;
    let cards = f.service.score_cards().await?;
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].trend, Trend::New);

    f.service.execute_rule("reading_in_range").await?;
    f.service.execute_rule("reading_in_range").await?;
    let cards = f.service.score_cards().await?;
    assert_eq!(cards[0].table_id, "measures");
    assert_eq!(cards[0].overall_score, 50);
    assert_eq!(cards[0].trend, Trend::Stable);
    Ok(())
}

#[tokio::test]
async fn test_analyze_is_deterministic() -> Result<()> {
    let f = fixture(vec![])?;
    let sql = "SELECT m.reading, c.code FROM measures m JOIN codes c ON m.reading = c.code";

    let first = f.service.analyze_query(sql, "lake", AnalyzeOptions { explain: true }).await?;
    let second = f.service.analyze_query(sql, "lake", AnalyzeOptions { explain: true }).await?;

    assert!(first.success && second.success);
    assert_eq!(first.query_id, second.query_id);
    assert_eq!(first.metrics.rows_returned, second.metrics.rows_returned);
    assert_eq!(first.metrics.rows_scanned, second.metrics.rows_scanned);
    assert_eq!(first.metrics.io_operations, second.metrics.io_operations);
    assert_eq!(first.metrics.warnings, second.metrics.warnings);
    assert!(first.plan.is_some());

    assert_eq!(f.service.query_history(&first.query_id)?.len(), 2);
    assert_eq!(f.service.performance_stats()?.total_queries, 2);
    Ok(())
}

#[tokio::test]
async fn test_analyze_failure_grades_f() -> Result<()> {
    let f = fixture(vec![])?;
    let result = f
        .service
        .analyze_query("SELECT nope FROM nowhere", "lake", AnalyzeOptions::default())
        .await?;

    assert!(!result.success);
    assert_eq!(result.grade, PerformanceGrade::F);
    assert_eq!(result.suggestions.len(), 1);
    Ok(())
}
