// ==========================================
// 订单齐套放行分析系统 - 需求目录构建
// ==========================================
// 职责: 一次性构建只读的订单序列 + BOM 展开索引 + 初始台账来源
// 规则:
// - 缺物料号或需求 <= 0 的订单标记为跳过, 永不进入台账交互
// - 无 BOM 的订单视为原材料订单: 隐式需求 = (自身物料号, 自身需求量)
// - 同一订单内重复的组件行合并求和
// - PB 标记: BOM 结构中出现 NS<物料号>99 即标记, 仅展示
// - 工时 = 单位工时（未知为 0）× 需求数量
// ==========================================

use crate::config::CategoryConfig;
use crate::domain::order::{BomLine, ComponentRequirement, DemandOrder, SKIP_REASON_INVALID_INPUT};
use crate::domain::relations::{ComponentDemandRecord, InputRelations, RawRelations};
use crate::domain::types::{qty_to_f64, QtyCell, Quantity};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::ledger::StockLedger;
use crate::importer::error::ImportError;
use crate::importer::relation_mapper::RelationMapper;
use crate::perf::PerfGuard;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::ops::AddAssign;
use tracing::{debug, info, instrument, warn};

/// 缺省计划员代码
pub const UNKNOWN_PLANNER: &str = "UNKNOWN";

/// 目录构建选项
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub categories: CategoryConfig,
    /// 仅纳入这些分组的计划员订单; None 表示全部
    pub include_groups: Option<Vec<String>>,
}

// ==========================================
// DemandCatalog - 只读需求目录
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DemandCatalog {
    orders: Vec<DemandOrder>,
    bom: HashMap<String, Vec<BomLine>>,
    on_hand: HashMap<String, Quantity>,
    committed: HashMap<String, Quantity>,
    filtered_out: usize,
}

impl DemandCatalog {
    /// 由原始关系构建（含必需列校验）
    ///
    /// # 返回
    /// - Err(EngineError::Schema): 缺少必需列, 任何运行开始前中止
    pub fn from_raw(raw: &RawRelations, options: &CatalogOptions) -> EngineResult<Self> {
        let relations = Self::map_raw(raw)?;
        Self::build(&relations, options)
    }

    /// 原始关系 → 强类型记录（缺列映射为 EngineError::Schema）
    pub fn map_raw(raw: &RawRelations) -> EngineResult<InputRelations> {
        RelationMapper::map(raw).map_err(|e| match e {
            ImportError::MissingColumns { relation, columns } => EngineError::Schema {
                relation,
                missing: columns,
            },
            other => EngineError::InternalError(other.to_string()),
        })
    }

    /// 由已映射的关系构建
    #[instrument(skip_all, fields(demand_rows = relations.demand.len()))]
    pub fn build(relations: &InputRelations, options: &CatalogOptions) -> EngineResult<Self> {
        let _perf = PerfGuard::new("build_catalog");

        let planner_filter = match &options.include_groups {
            Some(groups) => Some(
                options
                    .categories
                    .planner_codes_for(groups)
                    .map_err(EngineError::UnknownCategory)?,
            ),
            None => None,
        };

        let hours_per_unit = sum_by_part(
            relations
                .labor_standards
                .iter()
                .map(|r| (r.part.as_str(), r.hours_per_unit)),
        );
        let on_hand = sum_by_part(relations.stock.iter().map(|r| (r.part.as_str(), r.available_qty)));
        let committed = committed_by_part(&relations.committed_demand);
        let bom = explode_bom(&relations.planned_demand);

        // PB: 整个 BOM 结构中出现过的组件物料号
        let bom_parts: HashSet<&str> = relations
            .planned_demand
            .iter()
            .filter_map(|r| r.component_part.as_deref())
            .collect();

        let mut orders = Vec::with_capacity(relations.demand.len());
        let mut filtered_out = 0usize;

        for (pos, record) in relations.demand.iter().enumerate() {
            let planner = record
                .planner
                .clone()
                .unwrap_or_else(|| UNKNOWN_PLANNER.to_string());

            if let Some(codes) = &planner_filter {
                if !codes.contains(planner.trim()) {
                    filtered_out += 1;
                    continue;
                }
            }

            let demand_qty = match &record.demand_qty {
                QtyCell::Value(v) if *v > Quantity::ZERO => *v,
                _ => Quantity::ZERO,
            };
            let order_id = record
                .order_id
                .clone()
                .unwrap_or_else(|| format!("ORDER_{}", pos));

            let skip_reason = if record.part.is_none() || demand_qty <= Quantity::ZERO {
                Some(SKIP_REASON_INVALID_INPUT.to_string())
            } else {
                None
            };

            let (labor_hours, piggyback) = match &record.part {
                Some(part) if skip_reason.is_none() => (
                    hours_per_unit.get(part).copied().unwrap_or(0.0) * qty_to_f64(demand_qty),
                    bom_parts.contains(format!("NS{}99", part).as_str()),
                ),
                Some(part) => (0.0, bom_parts.contains(format!("NS{}99", part).as_str())),
                None => (0.0, false),
            };

            orders.push(DemandOrder {
                seq: orders.len(),
                order_id,
                part: record.part.clone(),
                planner,
                start_date: record.start_date,
                demand_qty,
                labor_hours,
                piggyback,
                skip_reason,
            });
        }

        let catalog = Self {
            orders,
            bom,
            on_hand,
            committed,
            filtered_out,
        };

        info!(
            orders = catalog.orders.len(),
            skipped = catalog.skipped_count(),
            bom_orders = catalog.bom_order_count(),
            filtered_out,
            stock_parts = catalog.on_hand.len(),
            committed_parts = catalog.committed.len(),
            "需求目录构建完成"
        );

        Ok(catalog)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn orders(&self) -> &[DemandOrder] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn skipped_count(&self) -> usize {
        self.orders.iter().filter(|o| o.is_skipped()).count()
    }

    /// 被分组过滤排除的订单数
    pub fn filtered_out(&self) -> usize {
        self.filtered_out
    }

    pub fn bom_order_count(&self) -> usize {
        self.bom.len()
    }

    /// 订单的组件需求集合
    ///
    /// 有 BOM 时返回 BOM 行; 否则返回隐式单行需求（原材料订单）
    pub fn requirements_for(&self, order: &DemandOrder) -> Cow<'_, [BomLine]> {
        if let Some(lines) = self.bom.get(&order.order_id) {
            return Cow::Borrowed(lines.as_slice());
        }
        match &order.part {
            Some(part) => Cow::Owned(vec![BomLine::Component(ComponentRequirement {
                part: part.clone(),
                required_qty: order.demand_qty,
            })]),
            None => Cow::Owned(Vec::new()),
        }
    }

    pub fn committed_parts_count(&self) -> usize {
        self.committed.len()
    }

    pub fn total_committed_qty(&self) -> Quantity {
        self.committed.values().sum()
    }

    /// 初始台账 = Σ在库 - Σ已承诺
    pub fn initial_ledger(&self) -> StockLedger {
        StockLedger::seed(&self.on_hand, &self.committed)
    }
}

// ==========================================
// 构建辅助
// ==========================================

fn sum_by_part<'a, T>(rows: impl Iterator<Item = (&'a str, T)>) -> HashMap<String, T>
where
    T: Copy + Default + AddAssign,
{
    let mut totals: HashMap<String, T> = HashMap::new();
    for (part, value) in rows {
        *totals.entry(part.to_string()).or_default() += value;
    }
    totals
}

/// 已承诺需求按组件汇总（无法使用的行告警后忽略）
fn committed_by_part(rows: &[ComponentDemandRecord]) -> HashMap<String, Quantity> {
    let mut totals: HashMap<String, Quantity> = HashMap::new();
    for row in rows {
        let Some(part) = row.component_part.as_deref() else {
            continue;
        };
        match &row.required_qty {
            QtyCell::Value(v) => *totals.entry(part.to_string()).or_default() += *v,
            QtyCell::Missing => {}
            QtyCell::Invalid(raw) => {
                warn!(part, value = %raw, "已承诺需求数量无法解析, 已忽略");
            }
        }
    }
    totals
}

/// BOM 展开: 订单号 → 组件需求行
///
/// 同一订单内同一组件的多行合并求和; 数量缺失按 0; 数量非法记为缺陷行
fn explode_bom(rows: &[ComponentDemandRecord]) -> HashMap<String, Vec<BomLine>> {
    let mut bom: HashMap<String, Vec<BomLine>> = HashMap::new();
    let mut orphan_rows = 0usize;

    for row in rows {
        let Some(order_id) = row.order_id.as_deref() else {
            orphan_rows += 1;
            continue;
        };
        let lines = bom.entry(order_id.to_string()).or_default();

        let Some(part) = row.component_part.as_deref() else {
            lines.push(BomLine::Defect {
                part: None,
                message: "missing component part number".to_string(),
            });
            continue;
        };

        let qty = match &row.required_qty {
            QtyCell::Value(v) => *v,
            QtyCell::Missing => Quantity::ZERO,
            QtyCell::Invalid(raw) => {
                lines.push(BomLine::Defect {
                    part: Some(part.to_string()),
                    message: format!("invalid component quantity '{}'", raw),
                });
                continue;
            }
        };

        let existing = lines.iter_mut().find_map(|line| match line {
            BomLine::Component(req) if req.part == part => Some(req),
            _ => None,
        });
        match existing {
            Some(req) => req.required_qty += qty,
            None => lines.push(BomLine::Component(ComponentRequirement {
                part: part.to_string(),
                required_qty: qty,
            })),
        }
    }

    if orphan_rows > 0 {
        debug!(orphan_rows, "组件需求行缺少订单号, 已忽略");
    }
    bom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64) -> Quantity {
        Quantity::from(n)
    }
    use crate::domain::relations::{DemandRecord, LaborStandardRecord, StockRecord};

    fn demand(id: Option<&str>, part: Option<&str>, planner: Option<&str>, qty: QtyCell) -> DemandRecord {
        DemandRecord {
            order_id: id.map(str::to_string),
            part: part.map(str::to_string),
            planner: planner.map(str::to_string),
            start_date: None,
            demand_qty: qty,
        }
    }

    fn bom_row(id: &str, part: &str, qty: QtyCell) -> ComponentDemandRecord {
        ComponentDemandRecord {
            order_id: Some(id.to_string()),
            component_part: Some(part.to_string()),
            required_qty: qty,
        }
    }

    #[test]
    fn test_skip_rule_and_defaults() {
        let relations = InputRelations {
            demand: vec![
                demand(Some("O1"), Some("A"), Some("3001"), QtyCell::Value(q(4))),
                demand(None, Some("A"), None, QtyCell::Value(q(-2))),
                demand(Some("O3"), None, Some("3001"), QtyCell::Value(q(1))),
                demand(Some("O4"), Some("A"), Some("3001"), QtyCell::Invalid("x".into())),
            ],
            labor_standards: vec![
                LaborStandardRecord { part: "A".into(), hours_per_unit: 0.25 },
                LaborStandardRecord { part: "A".into(), hours_per_unit: 0.25 },
            ],
            ..Default::default()
        };
        let catalog = DemandCatalog::build(&relations, &CatalogOptions::default()).unwrap();

        let orders = catalog.orders();
        assert_eq!(orders.len(), 4);
        assert!(!orders[0].is_skipped());
        assert_eq!(orders[0].labor_hours, 2.0);
        assert_eq!(catalog.bom_order_count(), 0);
        assert_eq!(orders[1].order_id, "ORDER_1");
        assert_eq!(orders[1].planner, UNKNOWN_PLANNER);
        assert_eq!(orders[1].skip_reason.as_deref(), Some(SKIP_REASON_INVALID_INPUT));
        assert!(orders[2].is_skipped());
        assert!(orders[3].is_skipped());
        assert_eq!(catalog.skipped_count(), 3);
    }

    #[test]
    fn test_bom_duplicates_summed_and_implicit_requirement() {
        let relations = InputRelations {
            demand: vec![
                demand(Some("O1"), Some("KIT"), Some("3001"), QtyCell::Value(q(1))),
                demand(Some("O2"), Some("RAW"), Some("3001"), QtyCell::Value(q(6))),
            ],
            planned_demand: vec![
                bom_row("O1", "X", QtyCell::Value(q(2))),
                bom_row("O1", "Y", QtyCell::Value(q(1))),
                bom_row("O1", "X", QtyCell::Value(q(1))),
            ],
            ..Default::default()
        };
        let catalog = DemandCatalog::build(&relations, &CatalogOptions::default()).unwrap();

        assert_eq!(catalog.bom_order_count(), 1);

        let kit = catalog.requirements_for(&catalog.orders()[0]);
        assert_eq!(
            kit.as_ref(),
            &[
                BomLine::Component(ComponentRequirement { part: "X".into(), required_qty: q(3) }),
                BomLine::Component(ComponentRequirement { part: "Y".into(), required_qty: q(1) }),
            ]
        );

        let raw = catalog.requirements_for(&catalog.orders()[1]);
        assert_eq!(
            raw.as_ref(),
            &[BomLine::Component(ComponentRequirement { part: "RAW".into(), required_qty: q(6) })]
        );
    }

    #[test]
    fn test_invalid_component_qty_becomes_defect() {
        let relations = InputRelations {
            demand: vec![demand(Some("O1"), Some("KIT"), Some("3001"), QtyCell::Value(q(1)))],
            planned_demand: vec![bom_row("O1", "X", QtyCell::Invalid("abc".into()))],
            ..Default::default()
        };
        let catalog = DemandCatalog::build(&relations, &CatalogOptions::default()).unwrap();
        let lines = catalog.requirements_for(&catalog.orders()[0]);
        assert!(matches!(&lines[0], BomLine::Defect { part: Some(p), .. } if p == "X"));
    }

    #[test]
    fn test_piggyback_flag() {
        let relations = InputRelations {
            demand: vec![
                demand(Some("O1"), Some("KIT7"), Some("3001"), QtyCell::Value(q(1))),
                demand(Some("O2"), Some("KIT8"), Some("3001"), QtyCell::Value(q(1))),
            ],
            planned_demand: vec![bom_row("O9", "NSKIT799", QtyCell::Value(q(1)))],
            ..Default::default()
        };
        let catalog = DemandCatalog::build(&relations, &CatalogOptions::default()).unwrap();
        assert!(catalog.orders()[0].piggyback);
        assert!(!catalog.orders()[1].piggyback);
    }

    #[test]
    fn test_initial_ledger_nets_committed() {
        let relations = InputRelations {
            stock: vec![
                StockRecord { part: "A".into(), available_qty: q(6) },
                StockRecord { part: "A".into(), available_qty: q(4) },
            ],
            committed_demand: vec![
                bom_row("C1", "A", QtyCell::Value(q(3))),
                bom_row("C2", "B", QtyCell::Value(q(2))),
            ],
            ..Default::default()
        };
        let catalog = DemandCatalog::build(&relations, &CatalogOptions::default()).unwrap();
        let ledger = catalog.initial_ledger();

        assert_eq!(ledger.get("A"), q(7));
        assert_eq!(ledger.get("B"), q(-2));
        assert_eq!(catalog.committed_parts_count(), 2);
        assert_eq!(catalog.total_committed_qty(), q(5));
    }

    #[test]
    fn test_category_filter() {
        let relations = InputRelations {
            demand: vec![
                demand(Some("O1"), Some("A"), Some("3001"), QtyCell::Value(q(1))),
                demand(Some("O2"), Some("A"), Some("3806"), QtyCell::Value(q(1))),
                demand(Some("O3"), Some("A"), None, QtyCell::Value(q(1))),
            ],
            ..Default::default()
        };
        let options = CatalogOptions {
            include_groups: Some(vec!["kits".to_string()]),
            ..Default::default()
        };
        let catalog = DemandCatalog::build(&relations, &options).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.filtered_out(), 2);

        let bad = CatalogOptions {
            include_groups: Some(vec!["gadgets".to_string()]),
            ..Default::default()
        };
        assert!(matches!(
            DemandCatalog::build(&relations, &bad),
            Err(EngineError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_from_raw_schema_error() {
        let mut raw = RawRelations::default();
        raw.stock = crate::domain::relations::RawRelation::new(vec!["PART_NO".to_string()], vec![]);

        match DemandCatalog::from_raw(&raw, &CatalogOptions::default()) {
            Err(EngineError::Schema { relation, missing }) => {
                assert_eq!(relation, "stock");
                assert_eq!(missing, vec!["Available Qty".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other.map(|c| c.len())),
        }
    }
}
