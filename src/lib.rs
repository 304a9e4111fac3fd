// ==========================================
// 订单齐套放行分析系统 - 核心库
// ==========================================
// 系统定位: 决策支持 (分析放行可行性, 不下发执行)
// 核心规则: 订单所需全部组件一次性齐套才放行, 否则整单挂起
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 输入关系 / 订单 / 分配结果
pub mod domain;

// 数据仓储层 - 输入数据源
pub mod repository;

// 引擎层 - 分配与寻优
pub mod engine;

// 导入层 - CSV / Excel
pub mod importer;

// 配置层
pub mod config;

// 报告输出层
pub mod report;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 阶段耗时
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationStatus, Quantity};

// 领域实体
pub use domain::{
    AllocationResult, DemandOrder, InputRelations, RawRelations, RelationKind, RunMetrics,
    ShortageRecord,
};

// 引擎
pub use engine::{
    AllocationEngine, DemandCatalog, Objective, OrderingStrategy, ReleasePlanner,
    ShortageResolver, StockLedger, StrategySearch,
};

// 配置
pub use config::{CategoryConfig, SearchConfig, SearchMode};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单齐套放行分析系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
