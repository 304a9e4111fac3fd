// ==========================================
// 订单齐套放行分析系统 - 运行指标汇总
// ==========================================
// 纯函数归约: 一轮结果 → RunMetrics
// 分组由调用方提供（计划员代码 → 命名分组, 可重叠）
// ==========================================

use crate::config::CategoryConfig;
use crate::domain::allocation::AllocationResult;
use crate::domain::metrics::{CategoryMetrics, RunMetrics, StatusTotals};
use crate::domain::types::{AllocationStatus, Quantity};

#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    categories: CategoryConfig,
    committed_parts_count: usize,
    total_committed_qty: Quantity,
}

impl MetricsAggregator {
    pub fn new(categories: CategoryConfig) -> Self {
        Self {
            categories,
            ..Default::default()
        }
    }

    /// 附带已承诺需求统计（对所有运行相同）
    pub fn with_committed(mut self, parts_count: usize, total_qty: Quantity) -> Self {
        self.committed_parts_count = parts_count;
        self.total_committed_qty = total_qty;
        self
    }

    pub fn aggregate(&self, results: &[AllocationResult]) -> RunMetrics {
        let mut metrics = RunMetrics {
            committed_parts_count: self.committed_parts_count,
            total_committed_qty: self.total_committed_qty,
            categories: self
                .categories
                .groups
                .iter()
                .map(|g| CategoryMetrics {
                    name: g.name.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        for result in results {
            let (hours, qty) = (result.labor_hours, result.demand_qty);

            metrics.total.add(hours, qty);
            status_bucket(&mut metrics.released, &mut metrics.held, &mut metrics.skipped, result.status)
                .add(hours, qty);
            if result.piggyback {
                metrics.pb_count += 1;
            }

            for (group, bucket) in self.categories.groups.iter().zip(metrics.categories.iter_mut()) {
                if group.contains(&result.planner) {
                    bucket.total.add(hours, qty);
                    status_bucket(&mut bucket.released, &mut bucket.held, &mut bucket.skipped, result.status)
                        .add(hours, qty);
                }
            }
        }

        metrics
    }
}

fn status_bucket<'m>(
    released: &'m mut StatusTotals,
    held: &'m mut StatusTotals,
    skipped: &'m mut StatusTotals,
    status: AllocationStatus,
) -> &'m mut StatusTotals {
    match status {
        AllocationStatus::Released => released,
        AllocationStatus::Held => held,
        AllocationStatus::Skipped => skipped,
    }
}
