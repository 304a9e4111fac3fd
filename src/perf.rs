// ==========================================
// 订单齐套放行分析系统 - 性能计时
// ==========================================
// PhaseTracker: 显式的阶段计时值, 由调用方创建并传递, 不使用进程级全局状态
// PerfGuard: 作用域计时, drop 时输出 target="perf" 日志
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// 单个阶段耗时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: String,
    pub elapsed_ms: u64,
}

// ==========================================
// PhaseTracker - 阶段计时
// ==========================================
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phases: Vec<PhaseTiming>,
    current: Option<(String, Instant)>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新阶段（未结束的上一阶段自动结束）
    pub fn start_phase(&mut self, phase: impl Into<String>) {
        self.end_phase();
        self.current = Some((phase.into(), Instant::now()));
    }

    /// 结束当前阶段, 返回耗时（无进行中阶段时返回 None）
    pub fn end_phase(&mut self) -> Option<u64> {
        let (phase, started) = self.current.take()?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(target: "perf", phase = %phase, elapsed_ms, "阶段结束");
        self.phases.push(PhaseTiming { phase, elapsed_ms });
        Some(elapsed_ms)
    }

    /// 直接登记一个已测得的阶段（并行运行回收计时用）
    pub fn record(&mut self, phase: impl Into<String>, elapsed_ms: u64) {
        self.phases.push(PhaseTiming {
            phase: phase.into(),
            elapsed_ms,
        });
    }

    /// 合并另一个计时器的已结束阶段
    pub fn absorb(&mut self, other: PhaseTracker) {
        self.phases.extend(other.summary());
    }

    pub fn phases(&self) -> &[PhaseTiming] {
        &self.phases
    }

    pub fn total_ms(&self) -> u64 {
        self.phases.iter().map(|p| p.elapsed_ms).sum()
    }

    /// 结束进行中阶段并返回全部计时
    pub fn summary(mut self) -> Vec<PhaseTiming> {
        self.end_phase();
        self.phases
    }
}

// ==========================================
// PerfGuard - 作用域计时
// ==========================================

/// 性能统计 Guard：记录 elapsed_ms
///
/// 使用方式：
/// ```ignore
/// let _perf = order_release_aps::perf::PerfGuard::new("build_catalog");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        tracing::info!(target: "perf", op = self.op, elapsed_ms, "done");
    }
}
