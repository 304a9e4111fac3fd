// ==========================================
// StrategySearch 集成测试
// ==========================================
// 测试目标: 三目标择优、并行与串行一致、放弃与取消
// ==========================================


use chrono::NaiveDate;
use order_release_aps::config::CategoryConfig;
use order_release_aps::domain::{AllocationStatus, Quantity};
use order_release_aps::engine::{
    CatalogOptions, DemandCatalog, EngineError, Objective, OrderingStrategy, ShortageResolver,
    StrategySearch,
};
use order_release_aps::perf::PhaseTracker;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_helpers::mixed_relations;

fn mixed_search() -> StrategySearch {
    let raw = mixed_relations();
    let relations = DemandCatalog::map_raw(&raw).expect("输入映射失败");
    let catalog =
        DemandCatalog::build(&relations, &CatalogOptions::default()).expect("目录构建失败");
    let resolver = ShortageResolver::new(
        &relations.purchase_orders,
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    );
    StrategySearch::new(Arc::new(catalog), Arc::new(resolver), CategoryConfig::default())
}

#[test]
fn test_winners_dominate_every_run() {
    let search = mixed_search();
    let mut tracker = PhaseTracker::new();
    let outcome = search
        .search(OrderingStrategy::all(), &mut tracker)
        .expect("寻优失败");

    assert_eq!(outcome.runs_compared.len(), 10);
    assert!(outcome.abandoned.is_empty());

    for run in &outcome.runs_compared {
        assert!(outcome.best_orders.metrics.released.count >= run.released_count);
        assert!(outcome.best_hours.metrics.released.hours >= run.released_hours);
        assert!(outcome.best_qty.metrics.released.qty >= run.released_qty);
    }
    assert_eq!(tracker.phases().len(), 10);
}

#[test]
fn test_first_strategy_wins_ties() {
    // 早开工优先: KIT-C 先占用 Y/Z, KIT-A/KIT-B 挂起 → 放行 2 单
    // 晚开工优先: KIT-A/KIT-B/RAW-X 全部放行 → 放行 3 单, 且是第一个达到最大值的策略
    let search = mixed_search();
    let mut tracker = PhaseTracker::new();
    let outcome = search
        .search(OrderingStrategy::all(), &mut tracker)
        .expect("寻优失败");

    assert_eq!(outcome.runs_compared[0].released_count, 2);
    assert_eq!(outcome.best_orders.metrics.released.count, 3);
    for objective in Objective::ALL {
        assert_eq!(
            outcome.scenario(objective).strategy,
            OrderingStrategy::StartDateLateFirst,
            "objective {}",
            objective.as_str()
        );
    }
    assert!((outcome.best_hours.metrics.released.hours - 8.5).abs() < 1e-9);
    assert_eq!(outcome.best_qty.metrics.released.qty, Quantity::from(9));
}

#[test]
fn test_winning_scenario_keeps_full_results() {
    let search = mixed_search();
    let mut tracker = PhaseTracker::new();
    let outcome = search
        .search(OrderingStrategy::all(), &mut tracker)
        .expect("寻优失败");

    let results = &outcome.best_orders.results;
    assert_eq!(results.len(), 6);

    let held_raw_y = results
        .iter()
        .find(|r| r.order_id == "1004")
        .expect("1004 应在结果中");
    assert_eq!(held_raw_y.status, AllocationStatus::Held);
    assert!(held_raw_y.shortage_summary().contains("PO-1"));

    let skipped = results.iter().find(|r| r.order_id == "1005").unwrap();
    assert_eq!(skipped.status, AllocationStatus::Skipped);
}

#[tokio::test]
async fn test_parallel_matches_sequential() {
    let search = mixed_search();

    let mut seq_tracker = PhaseTracker::new();
    let sequential = search
        .search(OrderingStrategy::all(), &mut seq_tracker)
        .expect("串行寻优失败");

    let mut par_tracker = PhaseTracker::new();
    let parallel = search
        .search_parallel(OrderingStrategy::all(), &mut par_tracker)
        .await
        .expect("并行寻优失败");

    let strip = |runs: &[order_release_aps::engine::RunSummary]| {
        runs.iter()
            .map(|r| (r.strategy, r.released_count, r.held_count, r.skipped_count))
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&sequential.runs_compared), strip(&parallel.runs_compared));

    for objective in Objective::ALL {
        let (s, p) = (sequential.scenario(objective), parallel.scenario(objective));
        assert_eq!(s.strategy, p.strategy);
        assert_eq!(s.results, p.results);
        assert_eq!(s.metrics, p.metrics);
    }
}

#[tokio::test]
async fn test_progress_messages_reported() {
    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let search = mixed_search().with_progress(Arc::new(move |msg: &str| {
        sink.lock().unwrap().push(msg.to_string());
    }));

    let mut tracker = PhaseTracker::new();
    search
        .search_parallel(
            &[OrderingStrategy::PartAsc, OrderingStrategy::PartDesc],
            &mut tracker,
        )
        .await
        .expect("寻优失败");

    assert!(messages.lock().unwrap().len() >= 2);
}

#[test]
fn test_zero_budget_abandons_all_runs() {
    let search = mixed_search().with_run_budget(Some(Duration::ZERO));
    let mut tracker = PhaseTracker::new();
    let err = search
        .search(OrderingStrategy::all(), &mut tracker)
        .expect_err("所有运行都应放弃");
    assert!(matches!(err, EngineError::AllRunsAbandoned));
}

#[tokio::test]
async fn test_cancel_before_search() {
    let search = mixed_search();
    search.cancel_flag().cancel();

    let mut tracker = PhaseTracker::new();
    let err = search
        .search_parallel(OrderingStrategy::all(), &mut tracker)
        .await
        .expect_err("已取消的寻优不应产生结果");
    assert!(matches!(err, EngineError::Cancelled));
}

#[test]
fn test_empty_strategy_list_rejected() {
    let search = mixed_search();
    let mut tracker = PhaseTracker::new();
    assert!(matches!(
        search.search(&[], &mut tracker),
        Err(EngineError::NoStrategies)
    ));
}
