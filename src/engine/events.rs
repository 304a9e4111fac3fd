// ==========================================
// 订单齐套放行分析系统 - 进度通知
// ==========================================
// 职责: 定义进度回调 trait, 引擎只依赖 trait, 展示层自行实现
// 约束: 回调必须快速返回; 可能在任意线程上被调用
// ==========================================

/// 进度通知接收方
pub trait ProgressSink: Send + Sync {
    /// 里程碑状态（目录构建完成、第 N/M 轮开始/结束等）
    fn on_status(&self, message: &str);
}

/// 空实现（不需要进度展示时使用）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    fn on_status(&self, _message: &str) {}
}

/// 闭包即可作为进度接收方
impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_status(&self, message: &str) {
        self(message)
    }
}

/// 日志输出的进度接收方（CLI 默认）
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_status(&self, message: &str) {
        tracing::info!(target: "progress", "{}", message);
    }
}
