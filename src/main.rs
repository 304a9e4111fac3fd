// ==========================================
// 订单齐套放行分析系统 - 命令行入口
// ==========================================
// 用法:
//   order-release-aps [source] [--config file.json] [--out dir] [--standard] [--sequential]
// source: SQLite 文件 / CSV 目录 / .xlsx 工作簿（缺省为用户数据目录下的 SQLite 文件）
// ==========================================

use anyhow::{anyhow, bail, Context};
use order_release_aps::config::{CategoryConfig, ConfigManager, SearchConfig, SearchMode};
use order_release_aps::domain::qty_to_f64;
use order_release_aps::engine::{ReleasePlanner, TracingProgress};
use order_release_aps::importer::FileDataSource;
use order_release_aps::report::{format_metric, CsvReportWriter, MetricFormat};
use order_release_aps::repository::{InputDataSource, SqliteDataSource};
use order_release_aps::{db, logging, APP_NAME, VERSION};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const USAGE: &str =
    "order-release-aps [source] [--config file.json] [--out dir] [--standard] [--sequential]";

#[derive(Debug, Default)]
struct CliArgs {
    source: Option<String>,
    config: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    standard: bool,
    sequential: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Self>> {
        let mut parsed = CliArgs::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "--config" => {
                    let value = args.next().ok_or_else(|| anyhow!("--config 需要文件路径"))?;
                    parsed.config = Some(PathBuf::from(value));
                }
                "--out" => {
                    let value = args.next().ok_or_else(|| anyhow!("--out 需要目录路径"))?;
                    parsed.out_dir = Some(PathBuf::from(value));
                }
                "--standard" => parsed.standard = true,
                "--sequential" => parsed.sequential = true,
                flag if flag.starts_with("--") => bail!("未知参数: {}\n用法: {}", flag, USAGE),
                _ if parsed.source.is_none() => parsed.source = Some(arg),
                _ => bail!("多余的位置参数: {}\n用法: {}", arg, USAGE),
            }
        }

        Ok(Some(parsed))
    }
}

fn is_file_source(path: &Path) -> bool {
    if path.is_dir() {
        return true;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref(),
        Some("xlsx")
    )
}

/// 配置来源: --config 文件 > SQLite config_kv > 默认值; 之后叠加环境变量与命令行开关
fn load_config(args: &CliArgs, source: &str, file_source: bool) -> anyhow::Result<(SearchConfig, CategoryConfig)> {
    let (search, categories) = match &args.config {
        Some(path) => (
            SearchConfig::from_json_file(path)
                .map_err(|e| anyhow!("配置文件读取失败 ({}): {}", path.display(), e))?,
            CategoryConfig::default(),
        ),
        None if !file_source && Path::new(source).exists() => {
            let manager = ConfigManager::new(source).map_err(|e| anyhow!(e.to_string()))?;
            (
                manager.load_search_config().map_err(|e| anyhow!(e.to_string()))?,
                manager.load_category_config().map_err(|e| anyhow!(e.to_string()))?,
            )
        }
        None => (SearchConfig::default(), CategoryConfig::default()),
    };

    let mut search = search.apply_env_overrides();
    if args.standard {
        search.mode = SearchMode::Standard;
    }
    if args.sequential {
        search.parallel = false;
    }
    Ok((search, categories))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let Some(args) = CliArgs::parse(std::env::args().skip(1))? else {
        println!("{} v{}", APP_NAME, VERSION);
        println!("用法: {}", USAGE);
        return Ok(());
    };

    let source_path = args.source.clone().unwrap_or_else(db::default_db_path);
    let file_source = is_file_source(Path::new(&source_path));

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("输入数据源: {}", source_path);
    tracing::info!("==================================================");

    let (config, categories) = load_config(&args, &source_path, file_source)?;

    let source: Arc<dyn InputDataSource> = if file_source {
        Arc::new(FileDataSource::new(&source_path))
    } else {
        Arc::new(
            SqliteDataSource::new(&source_path)
                .with_context(|| format!("无法打开数据库: {}", source_path))?,
        )
    };

    let planner = ReleasePlanner::new(source, config)
        .with_categories(categories)
        .with_progress(Arc::new(TracingProgress));

    let cancel = planner.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("收到中断信号, 正在取消寻优");
            cancel.cancel();
        }
    });

    let report = planner.execute().await.context("放行分析失败")?;

    println!();
    println!("基准日: {}  订单: {}  跳过: {}", report.as_of, report.catalog_orders, report.skipped_orders);
    for scenario in report.outcome.scenarios() {
        let metrics = &scenario.metrics;
        println!(
            "[{}] 策略={} 放行 {} 件 / {} 工时 / {} 数量 (放行率 {})",
            scenario.objective.title_cn(),
            scenario.strategy.title_cn(),
            format_metric(metrics.released.count as f64, MetricFormat::Number),
            format_metric(metrics.released.hours, MetricFormat::Hours),
            format_metric(qty_to_f64(metrics.released.qty), MetricFormat::Number),
            format_metric(metrics.release_rate_pct(), MetricFormat::Percentage),
        );
    }

    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("release_report"));
    let written = CsvReportWriter::new(&out_dir)
        .write_report(&report)
        .with_context(|| format!("报告写出失败: {}", out_dir.display()))?;
    println!("报告已写出 {} 个文件 → {}", written.len(), out_dir.display());

    Ok(())
}
