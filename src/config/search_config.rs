// ==========================================
// 订单齐套放行分析系统 - 寻优运行配置
// ==========================================
// 来源优先级: 默认值 < JSON 文件 / config_kv < 环境变量
// ==========================================

use crate::engine::strategy::OrderingStrategy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

pub const ENV_MODE: &str = "ORDER_RELEASE_APS_MODE";
pub const ENV_PARALLEL: &str = "ORDER_RELEASE_APS_PARALLEL";
pub const ENV_AS_OF: &str = "ORDER_RELEASE_APS_AS_OF";
pub const ENV_RUN_BUDGET_MS: &str = "ORDER_RELEASE_APS_RUN_BUDGET_MS";

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// 单次运行（默认排序: 开工日期升序）
    Standard,
    /// 全部排序策略逐一试算, 取三个目标的最优
    MinMax,
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::MinMax
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(SearchMode::Standard),
            "min_max" | "min-max" | "minmax" => Ok(SearchMode::MinMax),
            other => Err(format!("未知运行模式: {}", other)),
        }
    }
}

// ==========================================
// SearchConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub mode: SearchMode,

    /// 参与寻优的排序策略（MinMax 模式使用）
    #[serde(default = "OrderingStrategy::all_vec")]
    pub strategies: Vec<OrderingStrategy>,

    /// 订单范围过滤（分组名）; None 表示全部订单
    #[serde(default)]
    pub include_groups: Option<Vec<String>>,

    /// 是否并行执行各轮运行
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// 单轮运行时间预算（毫秒）, 超时放弃该轮
    #[serde(default)]
    pub run_time_budget_ms: Option<u64>,

    /// 到货筛选基准日（缺省为当天）
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

fn default_parallel() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            strategies: OrderingStrategy::all_vec(),
            include_groups: None,
            parallel: default_parallel(),
            run_time_budget_ms: None,
            as_of: None,
        }
    }
}

pub(crate) fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl SearchConfig {
    /// 从 JSON 文件加载（缺失字段取默认值）
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: SearchConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// 应用环境变量覆写（非法值记录告警后忽略）
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var(ENV_MODE) {
            match v.parse::<SearchMode>() {
                Ok(mode) => self.mode = mode,
                Err(e) => tracing::warn!(key = ENV_MODE, value = %v, "{}", e),
            }
        }
        if let Ok(v) = std::env::var(ENV_PARALLEL) {
            self.parallel = is_true(&v);
        }
        if let Ok(v) = std::env::var(ENV_AS_OF) {
            match NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d") {
                Ok(date) => self.as_of = Some(date),
                Err(e) => tracing::warn!(key = ENV_AS_OF, value = %v, error = %e, "基准日格式错误"),
            }
        }
        if let Ok(v) = std::env::var(ENV_RUN_BUDGET_MS) {
            match v.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.run_time_budget_ms = Some(ms),
                _ => tracing::warn!(key = ENV_RUN_BUDGET_MS, value = %v, "运行预算格式错误"),
            }
        }
        self
    }

    /// 本次实际执行的策略列表
    pub fn effective_strategies(&self) -> Vec<OrderingStrategy> {
        match self.mode {
            SearchMode::Standard => vec![OrderingStrategy::default()],
            SearchMode::MinMax => self.strategies.clone(),
        }
    }

    pub fn as_of_or_today(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
