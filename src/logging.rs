// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 日志: 控制台 INFO (可用 RUST_LOG 覆盖) + 按天滚动的文件日志 DEBUG

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_PREFIX: &str = "sentinel";
const MAX_LOG_FILES: usize = 5;

/// 初始化全局日志; 返回的 guard 需要保持到程序退出, 否则文件日志会丢失
pub fn init(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log dir: {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .context("Failed to create rolling log file")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ort=warn"));
    let console = fmt::layer().with_target(false).with_filter(console_filter);
    let file = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(EnvFilter::new("debug,ort=warn"));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("Logger already initialized")?;
    Ok(guard)
}
