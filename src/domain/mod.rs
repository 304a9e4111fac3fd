// ==========================================
// 订单齐套放行分析系统 - 领域模型层
// ==========================================
// 职责: 定义输入关系、订单、分配结果、运行指标
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod metrics;
pub mod order;
pub mod relations;
pub mod types;

// 重导出核心类型
pub use allocation::{AllocationResult, ShortageEntry, ShortageRecord, SupplyRef, DEFECT_MARKER};
pub use metrics::{CategoryMetrics, RunMetrics, StatusTotals};
pub use order::{BomLine, ComponentRequirement, DemandOrder, SKIP_REASON_INVALID_INPUT};
pub use relations::{
    ComponentDemandRecord, DemandRecord, InputRelations, LaborStandardRecord, RawRelation,
    RawRelations, RawRow, RelationKind, StockRecord, SupplyRecord,
};
pub use types::{format_qty, qty_to_f64, AllocationStatus, QtyCell, Quantity};
