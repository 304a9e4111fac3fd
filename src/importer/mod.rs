// ==========================================
// 订单齐套放行分析系统 - 导入层
// ==========================================
// 职责: 外部文件 → 原始关系 → 强类型记录
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod file_source;
pub mod relation_mapper;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, ExcelWorkbook, FileParser, UniversalFileParser};
pub use file_source::FileDataSource;
pub use relation_mapper::RelationMapper;
