// ==========================================
// 订单齐套放行分析系统 - 报告输出层
// ==========================================
// 职责: 胜出方案与对比表写出为 CSV, 指标格式化
// 红线: 报告层只做格式转换, 不重新计算分配
// ==========================================

pub mod csv_report;
pub mod format;

pub use csv_report::{summary_rows, CsvReportWriter};
pub use format::{format_metric, percent_of, MetricFormat};

use thiserror::Error;

/// 报告层错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("文件写入失败: {0}")]
    Io(String),

    #[error("CSV 写入失败: {0}")]
    Csv(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err.to_string())
    }
}

/// Result 类型别名
pub type ReportResult<T> = Result<T, ReportError>;
