// ==========================================
// 订单齐套放行分析系统 - SQLite 数据源
// ==========================================
// 表名与关系一一对应:
//   demand / planned_demand / component_demand / stock / labor_standards / purchase_orders
// 读取方式: SELECT * 后按列名转为文本, 类型解析交给映射器
// 缺表: demand 缺表为错误, 其余关系视为空
// ==========================================

use crate::db::{open_sqlite_connection, table_exists};
use crate::domain::relations::{RawRelation, RawRelations, RawRow, RelationKind};
use crate::repository::data_source::InputDataSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct SqliteDataSource {
    conn: Arc<Mutex<Connection>>,
    label: String,
}

impl SqliteDataSource {
    /// 打开数据库文件
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            label: format!("sqlite:{}", db_path),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            label: "sqlite:<connection>".to_string(),
        }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取单表（列名 + 文本化行）
    fn read_table(conn: &Connection, table: &str) -> RepositoryResult<RawRelation> {
        let sql = format!("SELECT * FROM \"{}\"", table);
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut raw = RawRow::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                raw.insert(name.clone(), value_to_text(row.get_ref(idx)?));
            }
            out.push(raw);
        }

        debug!(table, rows = out.len(), "读取输入表");
        Ok(RawRelation::new(columns, out))
    }
}

/// 单元格文本化（NULL / BLOB 视为空）
fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

#[async_trait]
impl InputDataSource for SqliteDataSource {
    async fn load_relations(&self) -> RepositoryResult<RawRelations> {
        let conn = self.get_conn()?;
        let mut relations = RawRelations::default();

        for kind in RelationKind::ALL {
            let table = kind.as_str();
            if !table_exists(&conn, table)? {
                if kind == RelationKind::Demand {
                    return Err(RepositoryError::SourceUnavailable(format!(
                        "{} 缺少 {} 表",
                        self.label, table
                    )));
                }
                debug!(table, "输入表不存在, 按空关系处理");
                continue;
            }
            *relations.get_mut(kind) = Self::read_table(&conn, table)?;
        }

        info!(
            source = %self.label,
            demand = relations.demand.rows.len(),
            planned = relations.planned_demand.rows.len(),
            stock = relations.stock.rows.len(),
            purchase_orders = relations.purchase_orders.rows.len(),
            "SQLite 输入加载完成"
        );
        Ok(relations)
    }

    fn source_name(&self) -> String {
        self.label.clone()
    }
}
