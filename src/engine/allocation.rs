// ==========================================
// 订单齐套放行分析系统 - 分配引擎
// ==========================================
// 核心算法: 两阶段 检查-提交, 全有或全无
// 1. 跳过订单直接输出 Skipped
// 2. 只读检查: 每个组件 可用量 vs 需求量, 不修改台账
// 3. 全部通过 → 逐组件扣减, Released
//    任一失败 → 台账不动, Held, 为失败组件生成缺料记录
// 单轮内严格串行: 后续订单可见之前全部决策
// 可用量可为负（已超承诺）, 不做截断
// ==========================================

use crate::domain::allocation::{AllocationResult, ShortageEntry, ShortageRecord};
use crate::domain::order::{BomLine, DemandOrder};
use crate::domain::types::{AllocationStatus, Quantity};
use crate::engine::catalog::DemandCatalog;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::ledger::StockLedger;
use crate::engine::shortage::ShortageResolver;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

// ==========================================
// 运行控制: 取消标志 + 时间预算
// ==========================================

/// 共享取消标志（跨运行/跨线程）
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 单轮运行的中断条件（在订单之间检查）
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    label: String,
    cancel: Option<CancelFlag>,
    deadline: Option<Instant>,
}

impl RunControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// 时间预算从调用时刻起算
    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.deadline = budget.map(|b| Instant::now() + b);
        self
    }

    fn check(&self) -> EngineResult<()> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(EngineError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(EngineError::RunAbandoned {
                    strategy: self.label.clone(),
                    reason: "超出单轮时间预算".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ==========================================
// AllocationEngine
// ==========================================
pub struct AllocationEngine<'a> {
    catalog: &'a DemandCatalog,
    resolver: &'a ShortageResolver,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(catalog: &'a DemandCatalog, resolver: &'a ShortageResolver) -> Self {
        Self { catalog, resolver }
    }

    /// 按处理顺序完整运行一轮
    ///
    /// # 参数
    /// - `sequence`: 目录订单下标序列
    /// - `ledger`: 本轮独占的台账（原地修改）
    /// - `control`: 中断条件
    ///
    /// # 返回
    /// 按处理顺序排列的分配结果; 中断时部分结果随 Err 丢弃
    #[instrument(skip_all, fields(run = %control.label, orders = sequence.len()))]
    pub fn run(
        &self,
        sequence: &[usize],
        ledger: &mut StockLedger,
        control: &RunControl,
    ) -> EngineResult<Vec<AllocationResult>> {
        let orders = self.catalog.orders();
        let mut results = Vec::with_capacity(sequence.len());

        for &idx in sequence {
            control.check()?;
            let order = orders.get(idx).ok_or_else(|| {
                EngineError::InternalError(format!("处理顺序下标越界: {}", idx))
            })?;
            results.push(self.allocate_order(order, ledger));
        }

        Ok(results)
    }

    /// 单订单分配
    pub fn allocate_order(&self, order: &DemandOrder, ledger: &mut StockLedger) -> AllocationResult {
        if let Some(reason) = &order.skip_reason {
            return Self::result(
                order,
                AllocationStatus::Skipped,
                Vec::new(),
                BTreeMap::new(),
                Some(reason.clone()),
            );
        }

        let lines = self.catalog.requirements_for(order);

        let mut components_needed: BTreeMap<String, Quantity> = BTreeMap::new();
        let mut entries: Vec<ShortageEntry> = Vec::new();

        // 只读检查
        for line in lines.iter() {
            match line {
                BomLine::Component(req) => {
                    *components_needed.entry(req.part.clone()).or_default() += req.required_qty;
                    let available = ledger.get(&req.part);
                    if available < req.required_qty {
                        let shortfall = req.required_qty - available;
                        entries.push(ShortageEntry::Component(ShortageRecord {
                            part: req.part.clone(),
                            required: req.required_qty,
                            available,
                            shortfall,
                            supply: self.resolver.resolve(&req.part, shortfall),
                        }));
                    }
                }
                BomLine::Defect { part, message } => entries.push(ShortageEntry::Defect {
                    part: part.clone(),
                    message: message.clone(),
                }),
            }
        }

        if !entries.is_empty() {
            debug!(order_id = %order.order_id, shortages = entries.len(), "订单挂起");
            return Self::result(order, AllocationStatus::Held, entries, components_needed, None);
        }

        // 提交
        for (part, qty) in &components_needed {
            ledger.decrement(part, *qty);
        }
        debug!(order_id = %order.order_id, components = components_needed.len(), "订单放行");
        Self::result(order, AllocationStatus::Released, entries, components_needed, None)
    }

    fn result(
        order: &DemandOrder,
        status: AllocationStatus,
        shortages: Vec<ShortageEntry>,
        components_needed: BTreeMap<String, Quantity>,
        skip_reason: Option<String>,
    ) -> AllocationResult {
        AllocationResult {
            order_id: order.order_id.clone(),
            part: order.part.clone(),
            planner: order.planner.clone(),
            start_date: order.start_date,
            piggyback: order.piggyback,
            demand_qty: order.demand_qty,
            labor_hours: order.labor_hours,
            status,
            shortages,
            components_needed,
            skip_reason,
        }
    }
}
