// ==========================================
// 订单齐套放行分析系统 - 放行编排器
// ==========================================
// 流程: 加载输入 → 构建需求目录 → 多策略寻优 → PlanningReport
// 单一核心, 由数据源与进度回调两个协作方参数化
// ==========================================

use crate::config::{CategoryConfig, SearchConfig, SearchMode};
use crate::engine::allocation::CancelFlag;
use crate::engine::catalog::{CatalogOptions, DemandCatalog};
use crate::engine::error::EngineResult;
use crate::engine::events::{NoOpProgress, ProgressSink};
use crate::engine::search::{SearchOutcome, StrategySearch};
use crate::engine::shortage::ShortageResolver;
use crate::perf::{PhaseTiming, PhaseTracker};
use crate::repository::data_source::InputDataSource;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// ==========================================
// PlanningReport - 编排结果
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanningReport {
    pub source: String,
    pub as_of: NaiveDate,
    pub mode: SearchMode,
    pub catalog_orders: usize,
    pub skipped_orders: usize,
    pub filtered_out: usize,
    pub outcome: SearchOutcome,
    pub timings: Vec<PhaseTiming>,
}

// ==========================================
// ReleasePlanner - 编排器
// ==========================================
pub struct ReleasePlanner {
    source: Arc<dyn InputDataSource>,
    progress: Arc<dyn ProgressSink>,
    categories: CategoryConfig,
    config: SearchConfig,
    cancel: CancelFlag,
}

impl ReleasePlanner {
    /// 创建编排器
    ///
    /// # 参数
    /// - source: 输入数据源
    /// - config: 寻优配置
    pub fn new(source: Arc<dyn InputDataSource>, config: SearchConfig) -> Self {
        Self {
            source,
            progress: Arc::new(NoOpProgress),
            categories: CategoryConfig::default(),
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_categories(mut self, categories: CategoryConfig) -> Self {
        self.categories = categories;
        self
    }

    /// 外部取消入口（Ctrl-C 等）
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// 执行完整放行分析
    pub async fn execute(&self) -> EngineResult<PlanningReport> {
        let mut tracker = PhaseTracker::new();
        let as_of = self.config.as_of_or_today();
        let source = self.source.source_name();

        info!(
            source = %source,
            mode = ?self.config.mode,
            as_of = %as_of,
            parallel = self.config.parallel,
            "开始放行分析"
        );

        // 步骤1: 加载输入
        tracker.start_phase("load");
        let raw = self.source.load_relations().await?;
        self.progress.on_status(&format!("输入数据加载完成: {}", source));

        // 步骤2: 构建需求目录（schema 错误在此中止）
        tracker.start_phase("catalog");
        let relations = DemandCatalog::map_raw(&raw)?;
        let options = CatalogOptions {
            categories: self.categories.clone(),
            include_groups: self.config.include_groups.clone(),
        };
        let catalog = DemandCatalog::build(&relations, &options)?;
        let resolver = ShortageResolver::new(&relations.purchase_orders, as_of);
        debug!(
            purchase_orders = relations.purchase_orders.len(),
            "到货索引构建完成"
        );
        self.progress.on_status(&format!(
            "需求目录构建完成: {} 个订单（跳过 {} 个）",
            catalog.len(),
            catalog.skipped_count()
        ));

        let catalog_orders = catalog.len();
        let skipped_orders = catalog.skipped_count();
        let filtered_out = catalog.filtered_out();

        // 步骤3: 多策略寻优
        tracker.start_phase("search");
        let strategies = self.config.effective_strategies();
        let search = StrategySearch::new(Arc::new(catalog), Arc::new(resolver), self.categories.clone())
            .with_progress(self.progress.clone())
            .with_cancel(self.cancel.clone())
            .with_run_budget(self.config.run_time_budget_ms.map(Duration::from_millis));

        let mut run_tracker = PhaseTracker::new();
        let outcome = if self.config.parallel && strategies.len() > 1 {
            search.search_parallel(&strategies, &mut run_tracker).await?
        } else {
            search.search(&strategies, &mut run_tracker)?
        };
        tracker.end_phase();
        tracker.absorb(run_tracker);

        info!(
            runs = outcome.runs_compared.len(),
            total_ms = tracker.total_ms(),
            "放行分析完成"
        );

        Ok(PlanningReport {
            source,
            as_of,
            mode: self.config.mode,
            catalog_orders,
            skipped_orders,
            filtered_out,
            outcome,
            timings: tracker.summary(),
        })
    }
}
