// ==========================================
// 订单齐套放行分析系统 - 输入关系模型
// ==========================================
// 五类输入关系（需求 / 组件需求 / 库存 / 工时标准 / 采购到货）
// 原始行: 列名 → 文本值; 映射后: 强类型记录
// ==========================================

use crate::domain::types::{QtyCell, Quantity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 原始行（列名 → 文本值）
pub type RawRow = HashMap<String, String>;

// ==========================================
// RelationKind - 关系类型与必需列
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Demand,
    PlannedDemand,
    CommittedDemand,
    Stock,
    LaborStandards,
    PurchaseOrders,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Demand,
        RelationKind::PlannedDemand,
        RelationKind::CommittedDemand,
        RelationKind::Stock,
        RelationKind::LaborStandards,
        RelationKind::PurchaseOrders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Demand => "demand",
            RelationKind::PlannedDemand => "planned_demand",
            RelationKind::CommittedDemand => "component_demand",
            RelationKind::Stock => "stock",
            RelationKind::LaborStandards => "labor_standards",
            RelationKind::PurchaseOrders => "purchase_orders",
        }
    }

    /// 必需列（缺任一列即为 schema 错误）
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            RelationKind::Demand => &["SO No", "Part No", "Planner", "Start Date", "Rev Qty Due"],
            RelationKind::PlannedDemand => {
                &["SO Number", "Component Part Number", "Component Qty Required"]
            }
            RelationKind::CommittedDemand => &["Component Part Number", "Component Qty Required"],
            RelationKind::Stock => &["PART_NO", "Available Qty"],
            RelationKind::LaborStandards => &["PART_NO", "Hours per Unit"],
            RelationKind::PurchaseOrders => {
                &["PO Number", "Part Number", "Qty Due", "Promised Due Date"]
            }
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// RawRelations - 未解析的输入关系
// ==========================================
// 由数据源协作方产生（SQLite / CSV / Excel）
// columns 记录表头, 行为空时仍可做 schema 校验
#[derive(Debug, Clone, Default)]
pub struct RawRelation {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawRelation {
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { columns, rows }
    }

    /// 由行集合构造, 表头取自所有行的列名并集
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        columns.sort();
        Self { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.trim() == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawRelations {
    pub demand: RawRelation,
    pub planned_demand: RawRelation,
    pub committed_demand: RawRelation,
    pub stock: RawRelation,
    pub labor_standards: RawRelation,
    pub purchase_orders: RawRelation,
}

impl RawRelations {
    pub fn get(&self, kind: RelationKind) -> &RawRelation {
        match kind {
            RelationKind::Demand => &self.demand,
            RelationKind::PlannedDemand => &self.planned_demand,
            RelationKind::CommittedDemand => &self.committed_demand,
            RelationKind::Stock => &self.stock,
            RelationKind::LaborStandards => &self.labor_standards,
            RelationKind::PurchaseOrders => &self.purchase_orders,
        }
    }

    pub fn get_mut(&mut self, kind: RelationKind) -> &mut RawRelation {
        match kind {
            RelationKind::Demand => &mut self.demand,
            RelationKind::PlannedDemand => &mut self.planned_demand,
            RelationKind::CommittedDemand => &mut self.committed_demand,
            RelationKind::Stock => &mut self.stock,
            RelationKind::LaborStandards => &mut self.labor_standards,
            RelationKind::PurchaseOrders => &mut self.purchase_orders,
        }
    }
}

// ==========================================
// 强类型记录
// ==========================================

/// 需求订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub order_id: Option<String>,      // 订单号 (SO No)
    pub part: Option<String>,          // 物料号 (Part No)
    pub planner: Option<String>,       // 计划员代码
    pub start_date: Option<NaiveDate>, // 开工日期
    pub demand_qty: QtyCell,           // 需求数量 (Rev Qty Due)
}

/// 组件需求行（计划 BOM / 已承诺需求 共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDemandRecord {
    pub order_id: Option<String>,
    pub component_part: Option<String>,
    pub required_qty: QtyCell,
}

/// 库存行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub part: String,
    pub available_qty: Quantity,
}

/// 工时标准行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborStandardRecord {
    pub part: String,
    pub hours_per_unit: f64,
}

/// 采购到货行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyRecord {
    pub po_number: Option<String>,
    pub part: String,
    pub qty_due: Quantity,
    pub promised_date: NaiveDate,
}

/// 映射后的输入关系
#[derive(Debug, Clone, Default)]
pub struct InputRelations {
    pub demand: Vec<DemandRecord>,
    pub planned_demand: Vec<ComponentDemandRecord>,
    pub committed_demand: Vec<ComponentDemandRecord>,
    pub stock: Vec<StockRecord>,
    pub labor_standards: Vec<LaborStandardRecord>,
    pub purchase_orders: Vec<SupplyRecord>,
}
