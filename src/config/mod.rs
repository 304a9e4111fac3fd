// ==========================================
// 订单齐套放行分析系统 - 配置层
// ==========================================
// 职责: 寻优配置、计划员分组
// 存储: JSON 文件 / config_kv 表 / 环境变量
// ==========================================

pub mod category;
pub mod config_manager;
pub mod search_config;

// 重导出核心配置类型
pub use category::{CategoryConfig, CategoryGroup};
pub use config_manager::{config_keys, ConfigManager};
pub use search_config::{SearchConfig, SearchMode};
