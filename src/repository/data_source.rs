// ==========================================
// 订单齐套放行分析系统 - 输入数据源 Trait
// ==========================================
// 职责: 产出六类原始输入关系（不做业务判断）
// 实现者: SqliteDataSource / FileDataSource
// 红线: 数据源不含分配规则, 只做读取
// ==========================================

use crate::domain::relations::RawRelations;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

#[async_trait]
pub trait InputDataSource: Send + Sync {
    /// 读取全部输入关系
    ///
    /// # 返回
    /// - Ok(RawRelations): 原始行 + 表头（缺失的关系为空）
    /// - Err: 数据源不可读
    async fn load_relations(&self) -> RepositoryResult<RawRelations>;

    /// 数据源描述（日志/报告用）
    fn source_name(&self) -> String;
}

/// 内存数据源（测试与嵌入调用方使用）
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    relations: RawRelations,
}

impl InMemoryDataSource {
    pub fn new(relations: RawRelations) -> Self {
        Self { relations }
    }
}

#[async_trait]
impl InputDataSource for InMemoryDataSource {
    async fn load_relations(&self) -> RepositoryResult<RawRelations> {
        Ok(self.relations.clone())
    }

    fn source_name(&self) -> String {
        "memory".to_string()
    }
}
