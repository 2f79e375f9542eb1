//! 配置管理模块
//!
//! 数据库连接与日志配置，保存在 `<config_dir>/versioned-procs/storage.json`。
//! 优先级：命令行参数 > 环境变量 `DATABASE_URL` > 配置文件 > 默认值

pub mod file_manager;

use crate::error::{ProcError, Result};
use sea_orm::ConnectOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// 配置目录名称
const CONFIG_DIR_NAME: &str = "versioned-procs";
const CONFIG_FILE_NAME: &str = "storage.json";

/// Environment variable overriding `database_url`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// PostgreSQL connection URL
    pub database_url: Option<String>,

    /// Connection pool upper bound
    pub max_connections: u32,

    /// Connection pool lower bound
    pub min_connections: u32,

    /// Seconds to wait for a connection
    pub connect_timeout_secs: u64,

    /// Log every statement issued by sqlx
    pub sqlx_logging: bool,

    pub logging: LoggingConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            sqlx_logging: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,

    /// Also write logs to this file (no ANSI colors)
    pub file_name: Option<String>,

    /// Directory for `file_name`, defaults to the config directory
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_name: None,
            directory: None,
        }
    }
}

impl LoggingConfig {
    /// 解析日志级别，无法识别时使用 info
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        }
    }
}

impl StorageConfig {
    /// Create new storage configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration pointing at the given database
    pub fn with_database_url(url: impl Into<String>) -> Self {
        Self {
            database_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Replace `database_url` when an override is present
    pub fn apply_database_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            self.database_url = Some(url);
        }
    }

    /// Get the configured database URL
    pub fn database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            ProcError::Config(format!(
                "database_url is not configured (set it in {} or via {})",
                CONFIG_FILE_NAME, DATABASE_URL_ENV
            ))
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.database_url()?;
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ProcError::Config(format!(
                "database_url must be a PostgreSQL URL, got '{}'",
                url
            )));
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ProcError::Config(format!(
                "invalid pool size: min {} / max {}",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    /// SeaORM connection options
    pub fn connect_options(&self) -> Result<ConnectOptions> {
        self.validate()?;

        let mut options = ConnectOptions::new(self.database_url()?.to_owned());
        options
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .sqlx_logging(self.sqlx_logging);

        Ok(options)
    }
}

/// Default directory for the configuration file
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| ProcError::Config("Failed to get config directory".to_string()))
}

/// Storage configuration manager
pub struct StorageConfigManager {
    config_path: PathBuf,
    config: StorageConfig,
}

impl StorageConfigManager {
    /// Create new config manager with default path
    pub fn new() -> Result<Self> {
        Self::with_path(default_config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Create new config manager with custom path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let mut config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            StorageConfig::default()
        };
        config.apply_database_url_override(std::env::var(DATABASE_URL_ENV).ok());

        Ok(Self {
            config_path,
            config,
        })
    }

    fn load_config(path: &Path) -> Result<StorageConfig> {
        file_manager::read_json(path).map_err(|e| {
            ProcError::Config(format!(
                "Failed to parse storage config {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        file_manager::write_json_atomic(&self.config_path, &self.config)?;
        tracing::info!("Storage configuration saved to: {:?}", self.config_path);
        Ok(())
    }

    /// Path of the backing file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get current configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Update configuration and persist it
    pub fn update_config<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut StorageConfig),
    {
        updater(&mut self.config);
        self.config.validate()?;
        self.save()
    }
}
