// ==========================================
// 订单齐套放行分析系统 - CSV 报告输出
// ==========================================
// 输出文件（out_dir 下）:
// - <objective>_results.csv: 胜出方案逐订单结果（处理顺序）
// - <objective>_summary.csv: 胜出方案指标（Metric, Value）
// - strategy_comparison.csv: 全部运行对比
// - phase_timings.csv: 阶段耗时
// Standard 模式只有一个方案, 输出 standard_results.csv / standard_summary.csv
// ==========================================

use crate::config::SearchMode;
use crate::domain::allocation::AllocationResult;
use crate::domain::metrics::{RunMetrics, StatusTotals};
use crate::domain::types::{format_qty, qty_to_f64};
use crate::engine::orchestrator::PlanningReport;
use crate::engine::search::{RunSummary, Scenario};
use crate::perf::PhaseTiming;
use crate::report::format::{format_metric, percent_of, MetricFormat};
use crate::report::{ReportError, ReportResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 逐订单结果行
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    #[serde(rename = "SO Number")]
    order_id: &'a str,
    #[serde(rename = "Part")]
    part: &'a str,
    #[serde(rename = "Planner")]
    planner: &'a str,
    #[serde(rename = "Start Date")]
    start_date: String,
    #[serde(rename = "PB")]
    pb: &'static str,
    #[serde(rename = "Demand")]
    demand: String,
    #[serde(rename = "Hours")]
    hours: f64,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Shortages")]
    shortages: String,
    #[serde(rename = "Components")]
    components: String,
}

impl<'a> From<&'a AllocationResult> for ResultRow<'a> {
    fn from(r: &'a AllocationResult) -> Self {
        Self {
            order_id: &r.order_id,
            part: r.part.as_deref().unwrap_or("MISSING"),
            planner: &r.planner,
            start_date: r.start_date_label(),
            pb: if r.piggyback { "PB" } else { "-" },
            demand: format_qty(r.demand_qty),
            hours: (r.labor_hours * 10_000.0).round() / 10_000.0,
            status: r.status.as_str(),
            shortages: r.shortage_summary(),
            components: r.components_summary(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricRow {
    #[serde(rename = "Metric")]
    metric: String,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Serialize)]
struct TimingRow<'a> {
    phase: &'a str,
    elapsed_ms: u64,
}

// ==========================================
// 单文件写出
// ==========================================

pub fn write_results_csv(path: &Path, results: &[AllocationResult]) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(ResultRow::from(result))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, metrics: &RunMetrics) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (metric, value) in summary_rows(metrics) {
        writer.serialize(MetricRow { metric, value })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_comparison_csv(path: &Path, runs: &[RunSummary]) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for run in runs {
        writer.serialize(run)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_timings_csv(path: &Path, timings: &[PhaseTiming]) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for timing in timings {
        writer.serialize(TimingRow {
            phase: &timing.phase,
            elapsed_ms: timing.elapsed_ms,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// 指标表（Metric, Value）
pub fn summary_rows(metrics: &RunMetrics) -> Vec<(String, String)> {
    let mut rows = Vec::new();

    push_totals(&mut rows, "Total Orders Processed", &metrics.total);
    push_totals(&mut rows, "Releasable", &metrics.released);
    push_totals(&mut rows, "Held", &metrics.held);
    push_totals(&mut rows, "Skipped", &metrics.skipped);
    rows.push((
        "Release Rate (Orders %)".to_string(),
        format_metric(metrics.release_rate_pct(), MetricFormat::Percentage),
    ));
    rows.push((
        "Release Rate (Hours %)".to_string(),
        format_metric(
            percent_of(metrics.released.hours, metrics.total.hours),
            MetricFormat::Percentage,
        ),
    ));
    rows.push((
        "Release Rate (Quantity %)".to_string(),
        format_metric(
            percent_of(qty_to_f64(metrics.released.qty), qty_to_f64(metrics.total.qty)),
            MetricFormat::Percentage,
        ),
    ));
    rows.push((
        "PB Orders".to_string(),
        format_metric(metrics.pb_count as f64, MetricFormat::Number),
    ));
    rows.push((
        "Committed Parts".to_string(),
        format_metric(metrics.committed_parts_count as f64, MetricFormat::Number),
    ));
    rows.push((
        "Total Committed Quantity".to_string(),
        format_metric(qty_to_f64(metrics.total_committed_qty), MetricFormat::Number),
    ));

    for category in &metrics.categories {
        let name = &category.name;
        push_totals(&mut rows, &format!("{} Total", name), &category.total);
        push_totals(&mut rows, &format!("{} Releasable", name), &category.released);
        rows.push((
            format!("{} Release Rate (Orders %)", name),
            format_metric(
                percent_of(category.released.count as f64, category.total.count as f64),
                MetricFormat::Percentage,
            ),
        ));
    }

    rows
}

fn push_totals(rows: &mut Vec<(String, String)>, label: &str, totals: &StatusTotals) {
    rows.push((
        format!("{} (Orders)", label),
        format_metric(totals.count as f64, MetricFormat::Number),
    ));
    rows.push((
        format!("{} (Hours)", label),
        format_metric(totals.hours, MetricFormat::Hours),
    ));
    rows.push((
        format!("{} (Quantity)", label),
        format_metric(qty_to_f64(totals.qty), MetricFormat::Number),
    ));
}

// ==========================================
// CsvReportWriter - 整份报告
// ==========================================
pub struct CsvReportWriter {
    out_dir: PathBuf,
}

impl CsvReportWriter {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    /// 写出整份报告
    ///
    /// # 返回
    /// 已写出的文件路径
    pub fn write_report(&self, report: &PlanningReport) -> ReportResult<Vec<PathBuf>> {
        fs::create_dir_all(&self.out_dir)
            .map_err(|e| ReportError::Io(format!("{}: {}", self.out_dir.display(), e)))?;

        let mut written = Vec::new();
        let scenarios: Vec<(&str, &Scenario)> = match report.mode {
            SearchMode::Standard => vec![("standard", &report.outcome.best_orders)],
            SearchMode::MinMax => report
                .outcome
                .scenarios()
                .into_iter()
                .map(|s| (s.objective.as_str(), s))
                .collect(),
        };

        for (prefix, scenario) in scenarios {
            let results_path = self.out_dir.join(format!("{}_results.csv", prefix));
            write_results_csv(&results_path, &scenario.results)?;
            written.push(results_path);

            let summary_path = self.out_dir.join(format!("{}_summary.csv", prefix));
            write_summary_csv(&summary_path, &scenario.metrics)?;
            written.push(summary_path);
        }

        let comparison_path = self.out_dir.join("strategy_comparison.csv");
        write_comparison_csv(&comparison_path, &report.outcome.runs_compared)?;
        written.push(comparison_path);

        let timings_path = self.out_dir.join("phase_timings.csv");
        write_timings_csv(&timings_path, &report.timings)?;
        written.push(timings_path);

        info!(
            out_dir = %self.out_dir.display(),
            files = written.len(),
            "报告写出完成"
        );
        Ok(written)
    }
}
