// ==========================================
// 订单齐套放行分析系统 - 多策略寻优
// ==========================================
// 每个排序策略: 新台账副本 → 分配引擎完整运行 → 指标汇总
// 全部运行结束后, 按三个目标独立取 argmax:
// - 放行件数 / 放行工时 / 放行数量
// - 同值时先出现的策略胜出
// 运行之间无共享可变状态, 可并行（spawn_blocking）, 结果与串行一致
// ==========================================

use crate::config::CategoryConfig;
use crate::domain::allocation::AllocationResult;
use crate::domain::metrics::RunMetrics;
use crate::domain::types::{qty_to_f64, Quantity};
use crate::engine::allocation::{AllocationEngine, CancelFlag, RunControl};
use crate::engine::catalog::DemandCatalog;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{NoOpProgress, ProgressSink};
use crate::engine::ledger::StockLedger;
use crate::engine::metrics::MetricsAggregator;
use crate::engine::shortage::ShortageResolver;
use crate::engine::strategy::OrderingStrategy;
use crate::perf::PhaseTracker;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 寻优目标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Orders,
    Hours,
    Quantity,
}

impl Objective {
    pub const ALL: [Objective; 3] = [Objective::Orders, Objective::Hours, Objective::Quantity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Orders => "best_orders",
            Objective::Hours => "best_hours",
            Objective::Quantity => "best_quantity",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            Objective::Orders => "放行件数最多",
            Objective::Hours => "放行工时最多",
            Objective::Quantity => "放行数量最多",
        }
    }

    /// 目标取值
    pub fn value(&self, metrics: &RunMetrics) -> f64 {
        match self {
            Objective::Orders => metrics.released.count as f64,
            Objective::Hours => metrics.released.hours,
            Objective::Quantity => qty_to_f64(metrics.released.qty),
        }
    }
}

// ==========================================
// 运行结果
// ==========================================

/// 单轮运行完整结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub strategy: OrderingStrategy,
    pub results: Vec<AllocationResult>,
    pub metrics: RunMetrics,
    pub final_ledger: StockLedger,
    pub elapsed_ms: u64,
}

/// 对比用摘要（落选运行只保留这一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub strategy: OrderingStrategy,
    pub released_count: usize,
    pub released_hours: f64,
    pub released_qty: Quantity,
    pub held_count: usize,
    pub skipped_count: usize,
    pub elapsed_ms: u64,
}

impl From<&RunOutcome> for RunSummary {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            run_id: outcome.run_id.clone(),
            strategy: outcome.strategy,
            released_count: outcome.metrics.released.count,
            released_hours: outcome.metrics.released.hours,
            released_qty: outcome.metrics.released.qty,
            held_count: outcome.metrics.held.count,
            skipped_count: outcome.metrics.skipped.count,
            elapsed_ms: outcome.elapsed_ms,
        }
    }
}

/// 胜出方案（保留完整结果）
#[derive(Debug, Clone)]
pub struct Scenario {
    pub objective: Objective,
    pub run_id: String,
    pub strategy: OrderingStrategy,
    pub results: Vec<AllocationResult>,
    pub metrics: RunMetrics,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// 全部完成运行的摘要（策略顺序）
    pub runs_compared: Vec<RunSummary>,
    /// 被放弃的策略
    pub abandoned: Vec<OrderingStrategy>,
    pub best_orders: Scenario,
    pub best_hours: Scenario,
    pub best_qty: Scenario,
}

impl SearchOutcome {
    pub fn scenario(&self, objective: Objective) -> &Scenario {
        match objective {
            Objective::Orders => &self.best_orders,
            Objective::Hours => &self.best_hours,
            Objective::Quantity => &self.best_qty,
        }
    }

    pub fn scenarios(&self) -> [&Scenario; 3] {
        [&self.best_orders, &self.best_hours, &self.best_qty]
    }
}

// ==========================================
// StrategySearch
// ==========================================
#[derive(Clone)]
pub struct StrategySearch {
    catalog: Arc<DemandCatalog>,
    resolver: Arc<ShortageResolver>,
    aggregator: Arc<MetricsAggregator>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
    run_budget: Option<Duration>,
}

impl StrategySearch {
    pub fn new(
        catalog: Arc<DemandCatalog>,
        resolver: Arc<ShortageResolver>,
        categories: CategoryConfig,
    ) -> Self {
        let aggregator = MetricsAggregator::new(categories)
            .with_committed(catalog.committed_parts_count(), catalog.total_committed_qty());
        Self {
            catalog,
            resolver,
            aggregator: Arc::new(aggregator),
            progress: Arc::new(NoOpProgress),
            cancel: CancelFlag::new(),
            run_budget: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_run_budget(mut self, budget: Option<Duration>) -> Self {
        self.run_budget = budget;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// 单策略完整运行（独立台账副本）
    pub fn run_strategy(&self, strategy: OrderingStrategy) -> EngineResult<RunOutcome> {
        self.run_indexed(strategy, 1, 1)
    }

    fn run_indexed(&self, strategy: OrderingStrategy, index: usize, total: usize) -> EngineResult<RunOutcome> {
        let started = Instant::now();
        self.progress
            .on_status(&format!("第 {}/{} 轮开始: {}", index, total, strategy.title_cn()));

        let sequence = strategy.sequence(self.catalog.orders());
        let mut ledger = self.catalog.initial_ledger();
        let control = RunControl::new(strategy.as_str())
            .with_cancel(self.cancel.clone())
            .with_budget(self.run_budget);

        let engine = AllocationEngine::new(&self.catalog, &self.resolver);
        let results = engine.run(&sequence, &mut ledger, &control)?;
        let metrics = self.aggregator.aggregate(&results);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            strategy = strategy.as_str(),
            released = metrics.released.count,
            held = metrics.held.count,
            skipped = metrics.skipped.count,
            elapsed_ms,
            "运行完成"
        );
        self.progress.on_status(&format!(
            "第 {}/{} 轮完成: {} (放行 {} 件)",
            index,
            total,
            strategy.title_cn(),
            metrics.released.count
        ));

        Ok(RunOutcome {
            run_id: Uuid::new_v4().to_string(),
            strategy,
            results,
            metrics,
            final_ledger: ledger,
            elapsed_ms,
        })
    }

    /// 串行寻优
    #[instrument(skip_all, fields(strategies = strategies.len()))]
    pub fn search(
        &self,
        strategies: &[OrderingStrategy],
        tracker: &mut PhaseTracker,
    ) -> EngineResult<SearchOutcome> {
        if strategies.is_empty() {
            return Err(EngineError::NoStrategies);
        }

        let total = strategies.len();
        let attempts: Vec<(OrderingStrategy, EngineResult<RunOutcome>)> = strategies
            .iter()
            .enumerate()
            .map(|(i, &s)| (s, self.run_indexed(s, i + 1, total)))
            .collect();

        self.select(attempts, tracker)
    }

    /// 并行寻优: 每个策略一个阻塞任务, 全部结束后按策略顺序合并
    #[instrument(skip_all, fields(strategies = strategies.len()))]
    pub async fn search_parallel(
        &self,
        strategies: &[OrderingStrategy],
        tracker: &mut PhaseTracker,
    ) -> EngineResult<SearchOutcome> {
        if strategies.is_empty() {
            return Err(EngineError::NoStrategies);
        }

        let total = strategies.len();
        let handles = strategies.iter().enumerate().map(|(i, &strategy)| {
            let search = self.clone();
            tokio::task::spawn_blocking(move || search.run_indexed(strategy, i + 1, total))
        });

        let joined = join_all(handles).await;

        let mut attempts = Vec::with_capacity(total);
        for (&strategy, joined) in strategies.iter().zip(joined) {
            let attempt = joined.map_err(|e| {
                EngineError::InternalError(format!("运行任务异常退出 ({}): {}", strategy, e))
            })?;
            attempts.push((strategy, attempt));
        }

        self.select(attempts, tracker)
    }

    /// 汇总运行结果并按三个目标选出胜者
    fn select(
        &self,
        attempts: Vec<(OrderingStrategy, EngineResult<RunOutcome>)>,
        tracker: &mut PhaseTracker,
    ) -> EngineResult<SearchOutcome> {
        let mut completed: Vec<RunOutcome> = Vec::new();
        let mut abandoned: Vec<OrderingStrategy> = Vec::new();
        let mut cancelled = false;

        for (strategy, attempt) in attempts {
            match attempt {
                Ok(outcome) => {
                    tracker.record(format!("run:{}", strategy), outcome.elapsed_ms);
                    completed.push(outcome);
                }
                Err(EngineError::RunAbandoned { reason, .. }) => {
                    warn!(strategy = strategy.as_str(), reason = %reason, "运行已放弃, 不参与比较");
                    abandoned.push(strategy);
                }
                Err(EngineError::Cancelled) => {
                    cancelled = true;
                    abandoned.push(strategy);
                }
                Err(other) => return Err(other),
            }
        }

        if cancelled || self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if completed.is_empty() {
            return Err(EngineError::AllRunsAbandoned);
        }

        let runs_compared: Vec<RunSummary> = completed.iter().map(RunSummary::from).collect();
        let [best_orders, best_hours, best_qty] =
            Objective::ALL.map(|objective| Self::scenario_for(&completed, objective));

        info!(
            runs = runs_compared.len(),
            abandoned = abandoned.len(),
            best_orders = best_orders.strategy.as_str(),
            best_hours = best_hours.strategy.as_str(),
            best_qty = best_qty.strategy.as_str(),
            "寻优完成"
        );
        self.progress.on_status(&format!(
            "寻优完成: 比较 {} 轮, 最优件数策略 {}",
            runs_compared.len(),
            best_orders.strategy.title_cn()
        ));

        Ok(SearchOutcome {
            runs_compared,
            abandoned,
            best_orders,
            best_hours,
            best_qty,
        })
    }

    /// argmax（严格大于才替换, 先出现者胜出）
    fn scenario_for(completed: &[RunOutcome], objective: Objective) -> Scenario {
        let mut best = &completed[0];
        for outcome in &completed[1..] {
            if objective.value(&outcome.metrics) > objective.value(&best.metrics) {
                best = outcome;
            }
        }
        Scenario {
            objective,
            run_id: best.run_id.clone(),
            strategy: best.strategy,
            results: best.results.clone(),
            metrics: best.metrics.clone(),
        }
    }
}
