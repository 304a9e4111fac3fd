// ==========================================
// 订单齐套放行分析系统 - 计划员分组配置
// ==========================================
// 用途: 订单范围过滤 + 分组指标统计
// 分组可重叠（例如 kits 包含 bvi_kits 与 malosa_kits）
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 计划员分组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub planner_codes: Vec<String>,
}

impl CategoryGroup {
    pub fn new(name: &str, planner_codes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            planner_codes: planner_codes.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn contains(&self, planner: &str) -> bool {
        let planner = planner.trim();
        self.planner_codes.iter().any(|c| c == planner)
    }
}

/// 分组集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub groups: Vec<CategoryGroup>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            groups: vec![
                CategoryGroup::new("kits", &["3001", "3801", "5001"]),
                CategoryGroup::new("bvi_kits", &["3001", "3801"]),
                CategoryGroup::new("malosa_kits", &["5001"]),
                CategoryGroup::new("instruments", &["3802", "3803", "3804", "3805"]),
                CategoryGroup::new("manufacturing", &["3802"]),
                CategoryGroup::new("assembly", &["3803"]),
                CategoryGroup::new("packaging", &["3804"]),
                CategoryGroup::new("malosa_instruments", &["3805"]),
                CategoryGroup::new("virtuoso", &["3806"]),
                CategoryGroup::new("kit_samples", &["KIT SAMPLES"]),
            ],
        }
    }
}

impl CategoryConfig {
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn group(&self, name: &str) -> Option<&CategoryGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// 多个分组的计划员代码并集
    ///
    /// # 返回
    /// - Ok(集合)
    /// - Err(未知分组名列表)
    pub fn planner_codes_for(&self, names: &[String]) -> Result<HashSet<String>, Vec<String>> {
        let mut codes = HashSet::new();
        let mut unknown = Vec::new();

        for name in names {
            match self.group(name.trim()) {
                Some(group) => codes.extend(group.planner_codes.iter().cloned()),
                None => unknown.push(name.clone()),
            }
        }

        if unknown.is_empty() {
            Ok(codes)
        } else {
            Err(unknown)
        }
    }
}
