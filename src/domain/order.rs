// ==========================================
// 订单齐套放行分析系统 - 需求订单领域模型
// ==========================================
// DemandOrder: 目录构建后只读
// BomLine: 单个订单的组件需求（BOM 展开结果）
// ==========================================

use crate::domain::types::Quantity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 跳过原因（缺物料号或需求为 0）
pub const SKIP_REASON_INVALID_INPUT: &str = "missing part number or zero demand";

// ==========================================
// DemandOrder - 需求订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandOrder {
    pub seq: usize,                    // 目录内位置（从 0 开始）
    pub order_id: String,              // 订单号（已规范化）
    pub part: Option<String>,          // 物料号
    pub planner: String,               // 计划员代码（缺省 UNKNOWN）
    pub start_date: Option<NaiveDate>, // 开工日期
    pub demand_qty: Quantity,          // 需求数量（非正数按 0）
    pub labor_hours: f64,              // 工时 = 单位工时 × 需求数量
    pub piggyback: bool,               // PB 标记（仅展示）
    pub skip_reason: Option<String>,   // Some => 永久跳过
}

impl DemandOrder {
    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }
}

// ==========================================
// ComponentRequirement - 组件需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRequirement {
    pub part: String,
    pub required_qty: Quantity,
}

/// BOM 行: 正常组件需求, 或无法解析的行级缺陷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BomLine {
    Component(ComponentRequirement),
    Defect { part: Option<String>, message: String },
}
