// ==========================================
// 订单齐套放行分析系统 - 数据仓储层
// ==========================================
// 职责: 从外部存储读取输入关系
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod data_source;
pub mod error;
pub mod sqlite_source;

pub use data_source::{InMemoryDataSource, InputDataSource};
pub use error::{RepositoryError, RepositoryResult};
pub use sqlite_source::SqliteDataSource;
