// ==========================================
// 订单齐套放行分析系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::importer::error::ImportError;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 数据源错误 =====
    #[error("数据源不可用: {0}")]
    SourceUnavailable(String),

    #[error("缺少必需列 (relation={relation}): {}", .columns.join(", "))]
    MissingColumns {
        relation: String,
        columns: Vec<String>,
    },

    #[error("文件数据源读取失败: {0}")]
    Import(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => RepositoryError::DatabaseQueryError(msg),
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

// 实现 From<ImportError>
impl From<ImportError> for RepositoryError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MissingColumns { relation, columns } => {
                RepositoryError::MissingColumns { relation, columns }
            }
            ImportError::FileNotFound(path) => RepositoryError::SourceUnavailable(path),
            other => RepositoryError::Import(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
