// ==========================================
// ReleasePlanner 端到端测试
// ==========================================
// 测试目标: 数据源 → 需求目录 → 寻优 → 报告 全流程
// 覆盖: 内存 / SQLite / CSV 目录三种数据源
// ==========================================


use chrono::NaiveDate;
use order_release_aps::config::{SearchConfig, SearchMode};
use order_release_aps::domain::{RawRelations, RelationKind};
use order_release_aps::engine::{EngineError, OrderingStrategy, PlanningReport, ReleasePlanner};
use order_release_aps::importer::FileDataSource;
use order_release_aps::report::CsvReportWriter;
use order_release_aps::repository::{InMemoryDataSource, InputDataSource, SqliteDataSource};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use test_helpers::{create_seeded_db, create_test_db, mixed_relations, RelationsBuilder};

fn test_config() -> SearchConfig {
    SearchConfig {
        as_of: NaiveDate::from_ymd_opt(2024, 3, 15),
        ..SearchConfig::default()
    }
}

async fn execute(source: Arc<dyn InputDataSource>, config: SearchConfig) -> PlanningReport {
    ReleasePlanner::new(source, config)
        .execute()
        .await
        .expect("放行分析失败")
}

/// 按关系名写出 CSV 目录
fn write_csv_dir(dir: &Path, relations: &RawRelations) {
    for kind in RelationKind::ALL {
        let relation = relations.get(kind);
        let mut writer = csv::Writer::from_path(dir.join(format!("{}.csv", kind.as_str()))).unwrap();
        writer.write_record(&relation.columns).unwrap();
        for row in &relation.rows {
            let values: Vec<&str> = relation
                .columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
                .collect();
            writer.write_record(&values).unwrap();
        }
        writer.flush().unwrap();
    }
}

#[tokio::test]
async fn test_in_memory_min_max_flow() {
    let source = Arc::new(InMemoryDataSource::new(mixed_relations()));
    let report = execute(source, test_config()).await;

    assert_eq!(report.mode, SearchMode::MinMax);
    assert_eq!(report.catalog_orders, 6);
    assert_eq!(report.skipped_orders, 1);
    assert_eq!(report.filtered_out, 0);
    assert_eq!(report.outcome.runs_compared.len(), 10);
    assert_eq!(
        report.outcome.best_orders.strategy,
        OrderingStrategy::StartDateLateFirst
    );

    let phases: Vec<&str> = report.timings.iter().map(|t| t.phase.as_str()).collect();
    for phase in ["load", "catalog", "search"] {
        assert!(phases.contains(&phase), "missing phase {}", phase);
    }
}

#[tokio::test]
async fn test_standard_mode_runs_default_strategy_only() {
    let config = SearchConfig {
        mode: SearchMode::Standard,
        ..test_config()
    };
    let source = Arc::new(InMemoryDataSource::new(mixed_relations()));
    let report = execute(source, config).await;

    assert_eq!(report.outcome.runs_compared.len(), 1);
    assert_eq!(
        report.outcome.best_orders.strategy,
        OrderingStrategy::StartDateEarlyFirst
    );
    assert_eq!(report.outcome.best_orders.metrics.released.count, 2);
}

#[tokio::test]
async fn test_sequential_and_parallel_reports_agree() {
    let parallel = execute(
        Arc::new(InMemoryDataSource::new(mixed_relations())),
        test_config(),
    )
    .await;
    let sequential = execute(
        Arc::new(InMemoryDataSource::new(mixed_relations())),
        SearchConfig {
            parallel: false,
            ..test_config()
        },
    )
    .await;

    for (p, s) in parallel
        .outcome
        .scenarios()
        .iter()
        .zip(sequential.outcome.scenarios().iter())
    {
        assert_eq!(p.strategy, s.strategy);
        assert_eq!(p.metrics, s.metrics);
    }
}

#[tokio::test]
async fn test_include_groups_filters_catalog() {
    let config = SearchConfig {
        include_groups: Some(vec!["instruments".to_string()]),
        ..test_config()
    };
    let source = Arc::new(InMemoryDataSource::new(mixed_relations()));
    let report = execute(source, config).await;

    assert_eq!(report.catalog_orders, 3);
    assert_eq!(report.filtered_out, 3);
    assert!(report
        .outcome
        .best_orders
        .results
        .iter()
        .all(|r| ["3802", "3803", "3804"].contains(&r.planner.as_str())));
}

#[tokio::test]
async fn test_unknown_group_rejected() {
    let config = SearchConfig {
        include_groups: Some(vec!["no_such_group".to_string()]),
        ..test_config()
    };
    let source = Arc::new(InMemoryDataSource::new(mixed_relations()));
    let err = ReleasePlanner::new(source, config)
        .execute()
        .await
        .expect_err("未知分组应报错");
    assert!(matches!(err, EngineError::UnknownCategory(_)));
}

#[tokio::test]
async fn test_missing_column_is_schema_error() {
    let mut raw = RelationsBuilder::new()
        .demand("1", "A", "3001", "2024-03-01", "1")
        .stock("A", "1")
        .build();
    raw.stock.columns.retain(|c| c != "Available Qty");

    let source = Arc::new(InMemoryDataSource::new(raw));
    let err = ReleasePlanner::new(source, test_config())
        .execute()
        .await
        .expect_err("缺列应中止");
    match err {
        EngineError::Schema { relation, missing } => {
            assert_eq!(relation, "stock");
            assert_eq!(missing, vec!["Available Qty".to_string()]);
        }
        other => panic!("expected schema error, got {}", other),
    }
}

#[tokio::test]
async fn test_sqlite_source_matches_in_memory() {
    let (_temp_file, db_path) = create_seeded_db(&mixed_relations()).expect("建库失败");
    let sqlite = Arc::new(SqliteDataSource::new(&db_path).expect("打开数据库失败"));
    let from_db = execute(sqlite, test_config()).await;

    let from_memory = execute(
        Arc::new(InMemoryDataSource::new(mixed_relations())),
        test_config(),
    )
    .await;

    assert!(from_db.source.starts_with("sqlite:"));
    assert_eq!(from_db.catalog_orders, from_memory.catalog_orders);
    assert_eq!(
        from_db.outcome.best_orders.results,
        from_memory.outcome.best_orders.results
    );
}

#[tokio::test]
async fn test_sqlite_without_demand_table_fails() {
    let (_temp_file, db_path) = create_test_db().expect("建库失败");
    let sqlite = Arc::new(SqliteDataSource::new(&db_path).expect("打开数据库失败"));
    let err = ReleasePlanner::new(sqlite, test_config())
        .execute()
        .await
        .expect_err("缺少需求表应报错");
    assert!(matches!(err, EngineError::DataSource(_)));
}

#[tokio::test]
async fn test_csv_directory_source() {
    let dir = tempfile::tempdir().unwrap();
    write_csv_dir(dir.path(), &mixed_relations());

    let source = Arc::new(FileDataSource::new(dir.path()));
    let report = execute(source, test_config()).await;

    assert_eq!(report.catalog_orders, 6);
    assert_eq!(report.outcome.best_orders.metrics.released.count, 3);
}

#[tokio::test]
async fn test_report_files_written() {
    let source = Arc::new(InMemoryDataSource::new(mixed_relations()));
    let report = execute(source, test_config()).await;

    let out = tempfile::tempdir().unwrap();
    let written = CsvReportWriter::new(out.path())
        .write_report(&report)
        .expect("报告写出失败");
    assert_eq!(written.len(), 8);

    for name in [
        "best_orders_results.csv",
        "best_hours_summary.csv",
        "best_quantity_results.csv",
        "strategy_comparison.csv",
        "phase_timings.csv",
    ] {
        assert!(out.path().join(name).exists(), "missing {}", name);
    }

    let results = fs::read_to_string(out.path().join("best_orders_results.csv")).unwrap();
    assert_eq!(results.lines().count(), 7);
    assert!(results.contains("1005,MISSING"));

    let comparison = fs::read_to_string(out.path().join("strategy_comparison.csv")).unwrap();
    assert_eq!(comparison.lines().count(), 11);
}

#[tokio::test]
async fn test_standard_report_file_names() {
    let config = SearchConfig {
        mode: SearchMode::Standard,
        ..test_config()
    };
    let source = Arc::new(InMemoryDataSource::new(mixed_relations()));
    let report = execute(source, config).await;

    let out = tempfile::tempdir().unwrap();
    CsvReportWriter::new(out.path())
        .write_report(&report)
        .expect("报告写出失败");
    assert!(out.path().join("standard_results.csv").exists());
    assert!(out.path().join("standard_summary.csv").exists());
    assert!(!out.path().join("best_orders_results.csv").exists());
}
