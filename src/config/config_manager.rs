// ==========================================
// 订单齐套放行分析系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载寻优配置 / 计划员分组
// 存储: config_kv 表 (scope_id='global', key-value)
// 缺失的键取默认值
// ==========================================

use crate::config::category::CategoryConfig;
use crate::config::search_config::{is_true, SearchConfig, SearchMode};
use crate::db::open_sqlite_connection;
use crate::engine::strategy::OrderingStrategy;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// 表不存在时视为无配置
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        if !crate::db::table_exists(&conn, "config_kv")? {
            return Ok(None);
        }

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        crate::db::ensure_config_table(&conn)?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    // ===== 计划员分组 =====

    /// 读取计划员分组
    ///
    /// 配置格式为 JSON: {"groups":[{"name":"kits","planner_codes":["3001"]}]}
    pub fn load_category_config(&self) -> Result<CategoryConfig, Box<dyn Error>> {
        match self.get_config_value(config_keys::CATEGORY_GROUPS)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(CategoryConfig::default()),
        }
    }

    // ===== 寻优配置 =====

    /// 读取寻优配置
    pub fn load_search_config(&self) -> Result<SearchConfig, Box<dyn Error>> {
        let mut config = SearchConfig::default();

        if let Some(v) = self.get_config_value(config_keys::SEARCH_MODE)? {
            config.mode = v.parse::<SearchMode>()?;
        }

        if let Some(v) = self.get_config_value(config_keys::SEARCH_STRATEGIES)? {
            let strategies = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<OrderingStrategy>())
                .collect::<Result<Vec<_>, _>>()?;
            if !strategies.is_empty() {
                config.strategies = strategies;
            }
        }

        if let Some(v) = self.get_config_value(config_keys::INCLUDE_GROUPS)? {
            let groups: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            config.include_groups = if groups.is_empty() { None } else { Some(groups) };
        }

        if let Some(v) = self.get_config_value(config_keys::PARALLEL)? {
            config.parallel = is_true(&v);
        }

        if let Some(v) = self.get_config_value(config_keys::RUN_TIME_BUDGET_MS)? {
            let ms = v.trim().parse::<u64>()?;
            config.run_time_budget_ms = if ms == 0 { None } else { Some(ms) };
        }

        if let Some(v) = self.get_config_value(config_keys::AS_OF)? {
            config.as_of = Some(NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")?);
        }

        Ok(config)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const SEARCH_MODE: &str = "search_mode";
    pub const SEARCH_STRATEGIES: &str = "search_strategies"; // 逗号分隔
    pub const INCLUDE_GROUPS: &str = "include_groups"; // 逗号分隔
    pub const PARALLEL: &str = "parallel";
    pub const RUN_TIME_BUDGET_MS: &str = "run_time_budget_ms";
    pub const AS_OF: &str = "as_of"; // YYYY-MM-DD
    pub const CATEGORY_GROUPS: &str = "category_groups"; // JSON
}
