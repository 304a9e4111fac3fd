// ==========================================
// 订单齐套放行分析系统 - 运行指标模型
// ==========================================
// 只由一轮运行的结果列表推导, 从不原地修改
// ==========================================

use crate::domain::types::Quantity;
use serde::{Deserialize, Serialize};

/// 单一维度的 件数 / 工时 / 数量 合计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub count: usize,
    pub hours: f64,
    pub qty: Quantity,
}

impl StatusTotals {
    pub fn add(&mut self, hours: f64, qty: Quantity) {
        self.count += 1;
        self.hours += hours;
        self.qty += qty;
    }
}

/// 计划员分组指标
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub name: String,
    pub total: StatusTotals,
    pub released: StatusTotals,
    pub held: StatusTotals,
    pub skipped: StatusTotals,
}

// ==========================================
// RunMetrics - 单轮运行指标
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total: StatusTotals,
    pub released: StatusTotals,
    pub held: StatusTotals,
    pub skipped: StatusTotals,
    pub pb_count: usize,
    pub committed_parts_count: usize,
    pub total_committed_qty: Quantity,
    pub categories: Vec<CategoryMetrics>,
}

impl RunMetrics {
    pub fn category(&self, name: &str) -> Option<&CategoryMetrics> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// 放行件数占比（百分比）
    pub fn release_rate_pct(&self) -> f64 {
        if self.total.count == 0 {
            0.0
        } else {
            self.released.count as f64 / self.total.count as f64 * 100.0
        }
    }
}
