//! 日志：一次 tracing 调用同时写到终端和追加模式的日志文件

use crate::error::ConfiguratorError;
use chrono::Local;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// 本地时间戳，精确到毫秒
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// RUST_LOG 未设置时默认 info
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 组装终端与文件两路输出的 subscriber
pub fn build_subscriber<C, F>(filter: EnvFilter, console: C, file: F) -> impl Subscriber + Send + Sync
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_timer(LocalTimer)
                .with_target(false)
                .with_writer(console),
        )
        .with(
            fmt::layer()
                .with_timer(LocalTimer)
                .with_target(false)
                .with_ansi(false)
                .with_writer(file),
        )
}

/// 打开日志文件并安装全局 subscriber
pub fn init_logging(log_file: &Path) -> Result<(), ConfiguratorError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| {
            ConfiguratorError::IoError(format!("Failed to open log file {}: {}", log_file.display(), e))
        })?;

    build_subscriber(default_filter(), std::io::stdout, Mutex::new(file))
        .try_init()
        .map_err(|e| ConfiguratorError::ConfigError(format!("Failed to install logger: {}", e)))
}
