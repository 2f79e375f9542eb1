//! 日志初始化
//!
//! stdout 输出 + 可选的文件输出（无 ANSI 颜色），两者使用同一级别过滤

use crate::config::{default_config_dir, LoggingConfig};
use crate::error::{ProcError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, Layer};

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the program.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = config.level_filter();

    let (file_layer, guard) = match config.file_name.as_ref().filter(|name| !name.is_empty()) {
        Some(file_name) => {
            let directory = match &config.directory {
                Some(directory) => directory.clone(),
                None => default_config_dir()?,
            };
            std::fs::create_dir_all(&directory)?;

            let file_appender = tracing_appender::rolling::never(&directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().with_filter(level))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ProcError::Config(format!("Failed to set tracing subscriber: {}", e)))?;

    Ok(guard)
}
