// ==========================================
// AllocationEngine 集成测试
// ==========================================
// 测试目标: 全有或全无预留、台账守恒、跳过规则、缺料到货匹配
// ==========================================


use chrono::NaiveDate;
use order_release_aps::config::CategoryConfig;
use order_release_aps::domain::{AllocationStatus, Quantity, RawRelations, ShortageEntry};
use order_release_aps::engine::{
    AllocationEngine, CatalogOptions, DemandCatalog, OrderingStrategy, RunControl,
    ShortageResolver, StockLedger, StrategySearch,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use test_helpers::{mixed_relations, RelationsBuilder};

fn q(n: i64) -> Quantity {
    Quantity::from(n)
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn build(raw: &RawRelations) -> (DemandCatalog, ShortageResolver) {
    let relations = DemandCatalog::map_raw(raw).expect("输入映射失败");
    let catalog =
        DemandCatalog::build(&relations, &CatalogOptions::default()).expect("目录构建失败");
    let resolver = ShortageResolver::new(&relations.purchase_orders, as_of());
    (catalog, resolver)
}

/// 按给定订单号顺序运行一轮
fn run_in_order(
    catalog: &DemandCatalog,
    resolver: &ShortageResolver,
    order_ids: &[&str],
) -> (Vec<AllocationStatus>, StockLedger) {
    let sequence: Vec<usize> = order_ids
        .iter()
        .map(|id| {
            catalog
                .orders()
                .iter()
                .position(|o| o.order_id == *id)
                .expect("订单不存在")
        })
        .collect();
    let mut ledger = catalog.initial_ledger();
    let results = AllocationEngine::new(catalog, resolver)
        .run(&sequence, &mut ledger, &RunControl::new("manual"))
        .expect("运行失败");
    (results.iter().map(|r| r.status).collect(), ledger)
}

// ==========================================
// 典型场景
// ==========================================

#[test]
fn test_single_raw_material_order_released() {
    let raw = RelationsBuilder::new()
        .demand("O1", "A", "3001", "2024-03-01", "4")
        .stock("A", "10")
        .build();
    let (catalog, resolver) = build(&raw);

    let (statuses, ledger) = run_in_order(&catalog, &resolver, &["O1"]);
    assert_eq!(statuses, vec![AllocationStatus::Released]);
    assert_eq!(ledger.get("A"), q(6));
}

#[test]
fn test_bom_shortage_holds_whole_order() {
    let raw = RelationsBuilder::new()
        .demand("O1", "KIT", "3001", "2024-03-01", "1")
        .bom("O1", "X", "3")
        .bom("O1", "Y", "1")
        .stock("X", "2")
        .stock("Y", "10")
        .build();
    let (catalog, resolver) = build(&raw);

    let mut ledger = catalog.initial_ledger();
    let engine = AllocationEngine::new(&catalog, &resolver);
    let result = engine.allocate_order(&catalog.orders()[0], &mut ledger);

    assert_eq!(result.status, AllocationStatus::Held);
    assert_eq!(result.shortages.len(), 1);
    match &result.shortages[0] {
        ShortageEntry::Component(record) => {
            assert_eq!(record.part, "X");
            assert_eq!(record.shortfall, q(1));
        }
        other => panic!("expected component shortage, got {:?}", other),
    }
    assert_eq!(ledger.get("X"), q(2));
    assert_eq!(ledger.get("Y"), q(10));
}

#[test]
fn test_ordering_sensitivity() {
    let raw = RelationsBuilder::new()
        .demand("O1", "A", "3001", "2024-03-01", "4")
        .demand("O2", "A", "3001", "2024-03-02", "4")
        .stock("A", "5")
        .build();
    let (catalog, resolver) = build(&raw);

    let (forward, ledger) = run_in_order(&catalog, &resolver, &["O1", "O2"]);
    assert_eq!(forward, vec![AllocationStatus::Released, AllocationStatus::Held]);
    assert_eq!(ledger.get("A"), q(1));

    let (reverse, _) = run_in_order(&catalog, &resolver, &["O2", "O1"]);
    assert_eq!(reverse, vec![AllocationStatus::Released, AllocationStatus::Held]);
}

#[test]
fn test_shortage_first_fit_skips_past_and_small_supply() {
    let raw = RelationsBuilder::new()
        .demand("O1", "A", "3001", "2024-03-01", "5")
        .supply("PO-10", "A", "3", "2024-03-25")
        .supply("PO-20", "A", "5", "2024-04-04")
        .supply("PO-05", "A", "9", "2024-03-10")
        .build();
    let (catalog, resolver) = build(&raw);

    let mut ledger = catalog.initial_ledger();
    let result = AllocationEngine::new(&catalog, &resolver)
        .allocate_order(&catalog.orders()[0], &mut ledger);

    assert_eq!(result.status, AllocationStatus::Held);
    let supply = match &result.shortages[0] {
        ShortageEntry::Component(record) => record.supply.clone().expect("应匹配到货"),
        other => panic!("expected component shortage, got {:?}", other),
    };
    assert_eq!(supply.po_number.as_deref(), Some("PO-20"));
    assert_eq!(supply.promised_date, NaiveDate::from_ymd_opt(2024, 4, 4).unwrap());
}

#[test]
fn test_committed_demand_can_drive_available_negative() {
    let raw = RelationsBuilder::new()
        .demand("O1", "KIT", "3001", "2024-03-01", "1")
        .bom("O1", "X", "1")
        .committed("X", "4")
        .stock("X", "2")
        .build();
    let (catalog, resolver) = build(&raw);

    let mut ledger = catalog.initial_ledger();
    assert_eq!(ledger.get("X"), q(-2));

    let result = AllocationEngine::new(&catalog, &resolver)
        .allocate_order(&catalog.orders()[0], &mut ledger);
    match &result.shortages[0] {
        ShortageEntry::Component(record) => {
            assert_eq!(record.available, q(-2));
            assert_eq!(record.shortfall, q(3));
        }
        other => panic!("expected component shortage, got {:?}", other),
    }
}

#[test]
fn test_fractional_quantities_consume_stock_exactly() {
    let raw = RelationsBuilder::new()
        .demand("O1", "A", "3001", "2024-03-01", "0.1")
        .demand("O2", "A", "3001", "2024-03-02", "0.2")
        .stock("A", "0.3")
        .build();
    let (catalog, resolver) = build(&raw);

    let (statuses, ledger) = run_in_order(&catalog, &resolver, &["O1", "O2"]);
    assert_eq!(statuses, vec![AllocationStatus::Released, AllocationStatus::Released]);
    assert_eq!(ledger.get("A"), Quantity::ZERO);
}

#[test]
fn test_fractional_shortfall_is_exact() {
    let raw = RelationsBuilder::new()
        .demand("O1", "A", "3001", "2024-03-01", "0.7")
        .demand("O2", "A", "3001", "2024-03-02", "0.3")
        .stock("A", "0.9")
        .build();
    let (catalog, resolver) = build(&raw);

    let mut ledger = catalog.initial_ledger();
    let engine = AllocationEngine::new(&catalog, &resolver);
    let first = engine.allocate_order(&catalog.orders()[0], &mut ledger);
    let second = engine.allocate_order(&catalog.orders()[1], &mut ledger);

    assert_eq!(first.status, AllocationStatus::Released);
    assert_eq!(second.status, AllocationStatus::Held);
    match &second.shortages[0] {
        ShortageEntry::Component(record) => {
            assert_eq!(record.available, "0.2".parse::<Quantity>().unwrap());
            assert_eq!(record.shortfall, "0.1".parse::<Quantity>().unwrap());
        }
        other => panic!("expected component shortage, got {:?}", other),
    }
    assert_eq!(second.components_summary(), "A (need 0.3, have 0.2, short 0.1)");
}

// ==========================================
// 不变量（全部策略）
// ==========================================

fn search_for(raw: &RawRelations) -> (Arc<DemandCatalog>, StrategySearch) {
    let (catalog, resolver) = build(raw);
    let catalog = Arc::new(catalog);
    let search = StrategySearch::new(catalog.clone(), Arc::new(resolver), CategoryConfig::default());
    (catalog, search)
}

#[test]
fn test_ledger_conservation_for_every_strategy() {
    let raw = mixed_relations();
    let (catalog, search) = search_for(&raw);
    let initial = catalog.initial_ledger();

    for strategy in OrderingStrategy::all().iter().copied() {
        let outcome = search.run_strategy(strategy).expect("运行失败");

        let mut consumed: BTreeMap<String, Quantity> = BTreeMap::new();
        for result in outcome.results.iter().filter(|r| r.is_released()) {
            for (part, qty) in &result.components_needed {
                *consumed.entry(part.clone()).or_default() += *qty;
            }
        }

        let parts: HashSet<&String> = initial
            .iter()
            .map(|(p, _)| p)
            .chain(outcome.final_ledger.iter().map(|(p, _)| p))
            .collect();
        for part in parts {
            let used = consumed.get(part).copied().unwrap_or_default();
            assert_eq!(
                used + outcome.final_ledger.get(part),
                initial.get(part),
                "strategy {} part {} not conserved",
                strategy,
                part
            );
        }
    }
}

#[test]
fn test_held_orders_leave_ledger_untouched() {
    let raw = mixed_relations();
    let (catalog, resolver) = build(&raw);
    let engine = AllocationEngine::new(&catalog, &resolver);

    for strategy in OrderingStrategy::all().iter().copied() {
        let mut ledger = catalog.initial_ledger();
        for idx in strategy.sequence(catalog.orders()) {
            let before = ledger.snapshot();
            let result = engine.allocate_order(&catalog.orders()[idx], &mut ledger);
            if result.status != AllocationStatus::Released {
                assert_eq!(ledger, before, "strategy {} order {}", strategy, result.order_id);
            }
        }
    }
}

#[test]
fn test_invalid_orders_skipped_under_every_strategy() {
    let raw = RelationsBuilder::new()
        .demand("1", "", "3001", "2024-03-01", "4")
        .demand("2", "A", "3001", "2024-03-01", "0")
        .demand("3", "A", "3001", "2024-03-01", "-2")
        .demand("4", "A", "3001", "2024-03-01", "1")
        .stock("A", "100")
        .build();
    let (_catalog, search) = search_for(&raw);

    for strategy in OrderingStrategy::all().iter().copied() {
        let outcome = search.run_strategy(strategy).expect("运行失败");
        for result in &outcome.results {
            let expected = if result.order_id == "4" {
                AllocationStatus::Released
            } else {
                AllocationStatus::Skipped
            };
            assert_eq!(result.status, expected, "strategy {}", strategy);
        }
        assert_eq!(outcome.metrics.skipped.count, 3);
    }
}
