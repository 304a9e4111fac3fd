// ==========================================
// 订单齐套放行分析系统 - 分配结果领域模型
// ==========================================
// 每个订单在一轮运行中产生且仅产生一条 AllocationResult
// ==========================================

use crate::domain::types::{format_qty, AllocationStatus, Quantity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 无物料号的行级缺陷在缺料摘要中的标记
pub const DEFECT_MARKER: &str = "component processing error";

// ==========================================
// SupplyRef - 可覆盖缺口的到货引用
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyRef {
    pub po_number: Option<String>,
    pub qty_due: Quantity,
    pub promised_date: NaiveDate,
}

// ==========================================
// ShortageRecord - 组件缺料记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageRecord {
    pub part: String,
    pub required: Quantity,
    pub available: Quantity, // 可能为负（已超承诺）
    pub shortfall: Quantity, // required - available
    pub supply: Option<SupplyRef>,
}

impl ShortageRecord {
    pub fn describe(&self) -> String {
        match &self.supply {
            Some(supply) => format!(
                "{} short {} – PO {} due {}",
                self.part,
                format_qty(self.shortfall),
                supply.po_number.as_deref().unwrap_or("?"),
                supply.promised_date.format("%Y-%m-%d")
            ),
            None => format!(
                "{} (need {}, have {}, short {})",
                self.part,
                format_qty(self.required),
                format_qty(self.available),
                format_qty(self.shortfall)
            ),
        }
    }
}

/// 缺料条目: 真实缺口 或 行级缺陷诊断
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShortageEntry {
    Component(ShortageRecord),
    Defect { part: Option<String>, message: String },
}

impl ShortageEntry {
    pub fn part(&self) -> Option<&str> {
        match self {
            ShortageEntry::Component(record) => Some(record.part.as_str()),
            ShortageEntry::Defect { part, .. } => part.as_deref(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ShortageEntry::Component(record) => record.describe(),
            ShortageEntry::Defect { part: Some(part), message } => {
                format!("{} (component processing error: {})", part, message)
            }
            ShortageEntry::Defect { part: None, message } => {
                format!("{}: {}", DEFECT_MARKER, message)
            }
        }
    }
}

// ==========================================
// AllocationResult - 单订单分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub order_id: String,
    pub part: Option<String>,
    pub planner: String,
    pub start_date: Option<NaiveDate>,
    pub piggyback: bool,
    pub demand_qty: Quantity,
    pub labor_hours: f64,
    pub status: AllocationStatus,
    pub shortages: Vec<ShortageEntry>,
    pub components_needed: BTreeMap<String, Quantity>,
    pub skip_reason: Option<String>,
}

impl AllocationResult {
    pub fn is_released(&self) -> bool {
        self.status == AllocationStatus::Released
    }

    /// 缺料物料号摘要（"; " 连接, 无缺料为 "-"）
    ///
    /// 无物料号的缺陷行记为 DEFECT_MARKER, 避免挂起订单显示为无缺料
    pub fn shortage_summary(&self) -> String {
        let parts: Vec<&str> = self
            .shortages
            .iter()
            .map(|s| s.part().unwrap_or(DEFECT_MARKER))
            .collect();
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join("; ")
        }
    }

    /// 组件需求摘要: 挂起时给出缺料描述, 否则给出组件用量
    pub fn components_summary(&self) -> String {
        if let Some(reason) = &self.skip_reason {
            return reason.clone();
        }
        if !self.shortages.is_empty() {
            return self
                .shortages
                .iter()
                .map(ShortageEntry::describe)
                .collect::<Vec<_>>()
                .join("; ");
        }
        if self.components_needed.is_empty() {
            return "-".to_string();
        }
        self.components_needed
            .iter()
            .map(|(part, qty)| format!("{}: {}", part, format_qty(*qty)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn start_date_label(&self) -> String {
        self.start_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "No Date".to_string())
    }
}
