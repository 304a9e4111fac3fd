// ==========================================
// 订单齐套放行分析系统 - 引擎层
// ==========================================
// 职责: 需求目录、台账、分配、缺料匹配、寻优、指标
// 红线: Engine 不拼 SQL, 挂起订单必须给出缺料原因
// ==========================================

pub mod allocation;
pub mod catalog;
pub mod error;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod orchestrator;
pub mod search;
pub mod shortage;
pub mod strategy;

// 重导出核心引擎
pub use allocation::{AllocationEngine, CancelFlag, RunControl};
pub use catalog::{CatalogOptions, DemandCatalog, UNKNOWN_PLANNER};
pub use error::{EngineError, EngineResult};
pub use events::{NoOpProgress, ProgressSink, TracingProgress};
pub use ledger::StockLedger;
pub use metrics::MetricsAggregator;
pub use orchestrator::{PlanningReport, ReleasePlanner};
pub use search::{Objective, RunOutcome, RunSummary, Scenario, SearchOutcome, StrategySearch};
pub use shortage::ShortageResolver;
pub use strategy::OrderingStrategy;
