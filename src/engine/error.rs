// ==========================================
// 订单齐套放行分析系统 - 引擎层错误类型
// ==========================================
// 只有 schema 级错误会中止整个寻优
// 行级缺陷不走 Err, 而是作为挂起订单的诊断条目
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 目录构建错误（致命） =====
    #[error("输入关系缺少必需列 (relation={relation}): {}", .missing.join(", "))]
    Schema {
        relation: String,
        missing: Vec<String>,
    },

    #[error("未知的计划员分组: {}", .0.join(", "))]
    UnknownCategory(Vec<String>),

    #[error("输入数据加载失败: {0}")]
    DataSource(String),

    // ===== 寻优错误 =====
    #[error("排序策略列表为空")]
    NoStrategies,

    #[error("运行已放弃 (strategy={strategy}): {reason}")]
    RunAbandoned { strategy: String, reason: String },

    #[error("寻优已取消")]
    Cancelled,

    #[error("所有运行均已放弃, 无可比较结果")]
    AllRunsAbandoned,

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<RepositoryError>（缺列仍归为 schema 错误）
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::MissingColumns { relation, columns } => EngineError::Schema {
                relation,
                missing: columns,
            },
            other => EngineError::DataSource(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
