// ==========================================
// 订单齐套放行分析系统 - 排序策略定义
// ==========================================
// 用途：
// - 多策略寻优时, 每个策略定义一种订单处理顺序（全序）
// - 同值时按订单号升序; 缺失的日期/物料号排在最后
// ==========================================

use crate::domain::order::DemandOrder;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 订单排序策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingStrategy {
    StartDateEarlyFirst,
    StartDateLateFirst,
    DemandSmallFirst,
    DemandLargeFirst,
    HoursQuickFirst,
    HoursLongFirst,
    PartAsc,
    PartDesc,
    PlannerAsc,
    PlannerDesc,
}

impl OrderingStrategy {
    const ALL: [OrderingStrategy; 10] = [
        OrderingStrategy::StartDateEarlyFirst,
        OrderingStrategy::StartDateLateFirst,
        OrderingStrategy::DemandSmallFirst,
        OrderingStrategy::DemandLargeFirst,
        OrderingStrategy::HoursQuickFirst,
        OrderingStrategy::HoursLongFirst,
        OrderingStrategy::PartAsc,
        OrderingStrategy::PartDesc,
        OrderingStrategy::PlannerAsc,
        OrderingStrategy::PlannerDesc,
    ];

    pub fn all() -> &'static [OrderingStrategy] {
        &Self::ALL
    }

    pub fn all_vec() -> Vec<OrderingStrategy> {
        Self::ALL.to_vec()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderingStrategy::StartDateEarlyFirst => "start_date_early_first",
            OrderingStrategy::StartDateLateFirst => "start_date_late_first",
            OrderingStrategy::DemandSmallFirst => "demand_small_first",
            OrderingStrategy::DemandLargeFirst => "demand_large_first",
            OrderingStrategy::HoursQuickFirst => "hours_quick_first",
            OrderingStrategy::HoursLongFirst => "hours_long_first",
            OrderingStrategy::PartAsc => "part_asc",
            OrderingStrategy::PartDesc => "part_desc",
            OrderingStrategy::PlannerAsc => "planner_asc",
            OrderingStrategy::PlannerDesc => "planner_desc",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            OrderingStrategy::StartDateEarlyFirst => "开工日期早者优先",
            OrderingStrategy::StartDateLateFirst => "开工日期晚者优先",
            OrderingStrategy::DemandSmallFirst => "小批量优先",
            OrderingStrategy::DemandLargeFirst => "大批量优先",
            OrderingStrategy::HoursQuickFirst => "短工时优先",
            OrderingStrategy::HoursLongFirst => "长工时优先",
            OrderingStrategy::PartAsc => "物料号升序",
            OrderingStrategy::PartDesc => "物料号降序",
            OrderingStrategy::PlannerAsc => "计划员升序",
            OrderingStrategy::PlannerDesc => "计划员降序",
        }
    }

    /// 生成处理顺序
    ///
    /// # 参数
    /// - `orders`: 目录中的订单（按目录位置）
    ///
    /// # 返回
    /// 订单下标序列（全序, 可复现）
    pub fn sequence(&self, orders: &[DemandOrder]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..orders.len()).collect();
        indices.sort_by(|&a, &b| {
            let (x, y) = (&orders[a], &orders[b]);
            self.compare(x, y)
                .then_with(|| x.order_id.cmp(&y.order_id))
                .then_with(|| x.seq.cmp(&y.seq))
        });
        indices
    }

    fn compare(&self, a: &DemandOrder, b: &DemandOrder) -> Ordering {
        match self {
            OrderingStrategy::StartDateEarlyFirst => missing_last(&a.start_date, &b.start_date, false),
            OrderingStrategy::StartDateLateFirst => missing_last(&a.start_date, &b.start_date, true),
            OrderingStrategy::DemandSmallFirst => a.demand_qty.cmp(&b.demand_qty),
            OrderingStrategy::DemandLargeFirst => b.demand_qty.cmp(&a.demand_qty),
            OrderingStrategy::HoursQuickFirst => a.labor_hours.total_cmp(&b.labor_hours),
            OrderingStrategy::HoursLongFirst => b.labor_hours.total_cmp(&a.labor_hours),
            OrderingStrategy::PartAsc => missing_last(&a.part, &b.part, false),
            OrderingStrategy::PartDesc => missing_last(&a.part, &b.part, true),
            OrderingStrategy::PlannerAsc => a.planner.cmp(&b.planner),
            OrderingStrategy::PlannerDesc => b.planner.cmp(&a.planner),
        }
    }
}

/// 可空字段比较: None 恒在最后, 与方向无关
fn missing_last<T: Ord>(a: &Option<T>, b: &Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            if descending {
                y.cmp(x)
            } else {
                x.cmp(y)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Default for OrderingStrategy {
    fn default() -> Self {
        OrderingStrategy::StartDateEarlyFirst
    }
}

impl std::fmt::Display for OrderingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| format!("未知排序策略: {}", s.trim()))
    }
}
