// ==========================================
// 订单齐套放行分析系统 - 文件数据源
// ==========================================
// 两种布局:
// - 目录: 每个关系一个 CSV（demand.csv, planned_demand.csv, component_demand.csv,
//         stock.csv, labor_standards.csv, purchase_orders.csv）
// - 工作簿: 一个 .xlsx, 每个关系一个同名工作表
// 缺少 demand 为错误, 其余缺失的关系按空处理
// ==========================================

use crate::domain::relations::{RawRelations, RelationKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, ExcelWorkbook, FileParser};
use crate::repository::data_source::InputDataSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileDataSource {
    path: PathBuf,
}

impl FileDataSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 同步读取（目录或工作簿）
    pub fn read(path: &Path) -> ImportResult<RawRelations> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if path.is_dir() {
            Self::read_csv_dir(path)
        } else {
            Self::read_workbook(path)
        }
    }

    fn read_csv_dir(dir: &Path) -> ImportResult<RawRelations> {
        let mut relations = RawRelations::default();
        for kind in RelationKind::ALL {
            let file = dir.join(format!("{}.csv", kind.as_str()));
            if !file.exists() {
                if kind == RelationKind::Demand {
                    return Err(ImportError::FileNotFound(file.display().to_string()));
                }
                debug!(file = %file.display(), "关系文件不存在, 按空关系处理");
                continue;
            }
            *relations.get_mut(kind) = CsvParser.parse_relation(&file)?;
        }
        Ok(relations)
    }

    fn read_workbook(path: &Path) -> ImportResult<RawRelations> {
        let mut workbook = ExcelWorkbook::open(path)?;
        let mut relations = RawRelations::default();
        for kind in RelationKind::ALL {
            match workbook.find_sheet(kind.as_str()) {
                Some(sheet) => *relations.get_mut(kind) = workbook.read_sheet(&sheet)?,
                None if kind == RelationKind::Demand => {
                    return Err(ImportError::SheetNotFound(kind.as_str().to_string()));
                }
                None => debug!(sheet = kind.as_str(), "工作表不存在, 按空关系处理"),
            }
        }
        Ok(relations)
    }
}

#[async_trait]
impl InputDataSource for FileDataSource {
    async fn load_relations(&self) -> RepositoryResult<RawRelations> {
        let path = self.path.clone();
        let relations = tokio::task::spawn_blocking(move || Self::read(&path))
            .await
            .map_err(|e| RepositoryError::InternalError(format!("文件读取任务异常: {}", e)))??;

        info!(
            source = %self.path.display(),
            demand = relations.demand.rows.len(),
            planned = relations.planned_demand.rows.len(),
            stock = relations.stock.rows.len(),
            purchase_orders = relations.purchase_orders.rows.len(),
            "文件输入加载完成"
        );
        Ok(relations)
    }

    fn source_name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
