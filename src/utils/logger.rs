//! 日志系统模块
//!
//! 本模块基于 tracing 生态实现日志功能，包括：
//!
//! - 日志订阅者初始化（控制台 / 滚动文件，文本或 JSON 格式）
//! - 加载报告接口 [`LoadReporter`]：注册表与加载器通过它输出汇总信息
//!
//! # 示例
//!
//! ```rust,no_run
//! use chips_namespace::utils::logger::{Logger, LoggerConfig, RotationStrategy};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LoggerConfig::builder()
//!         .level("debug")
//!         .file_output("./logs")
//!         .rotation(RotationStrategy::Daily)
//!         .build();
//!
//!     let _guard = Logger::init(config)?;
//!     tracing::info!(module_name = "Log", "模块已加载");
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use crate::utils::{CoreError, Result};

// ============================================================================
// 日志级别与加载报告
// ============================================================================

/// 加载报告的日志级别
///
/// 比 tracing 多一个 `Success` 级别，用于标记成功完成的汇总步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 成功
    Success,
    /// 警告
    Warning,
    /// 错误
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = std::convert::Infallible;

    /// 宽松解析，未知级别按 `Debug` 处理
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "info" | "information" => LogLevel::Info,
            "success" => LogLevel::Success,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Debug,
        })
    }
}

/// 加载报告接口
///
/// 注册表、模块发现和加载器只通过这个接口输出面向使用者的汇总消息。
pub trait LoadReporter: Send + Sync {
    /// 输出一条带级别的消息
    fn report(&self, level: LogLevel, message: &str);
}

/// 基于 tracing 的默认报告器
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl LoadReporter for TracingReporter {
    fn report(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Success => tracing::info!(outcome = "success", "{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// 内存报告器
///
/// 记录所有收到的消息，便于诊断输出和测试断言。
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryReporter {
    /// 创建空的内存报告器
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录消息的快照
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 指定级别的消息
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl LoadReporter for MemoryReporter {
    fn report(&self, level: LogLevel, message: &str) {
        // 同时转发给 tracing，保持日志输出一致
        TracingReporter.report(level, message);
        match self.entries.lock() {
            Ok(mut entries) => entries.push((level, message.to_string())),
            Err(poisoned) => poisoned.into_inner().push((level, message.to_string())),
        }
    }
}

// ============================================================================
// 日志轮转策略
// ============================================================================

/// 日志轮转策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    /// 不轮转（单个日志文件）
    Never,
    /// 每小时轮转
    Hourly,
    /// 每天轮转（默认）
    #[default]
    Daily,
}

impl RotationStrategy {
    fn to_rotation(self) -> Rotation {
        match self {
            RotationStrategy::Never => Rotation::NEVER,
            RotationStrategy::Hourly => Rotation::HOURLY,
            RotationStrategy::Daily => Rotation::DAILY,
        }
    }

    /// 从字符串解析轮转策略，未知值回退为每天轮转
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "never" | "none" => RotationStrategy::Never,
            "hourly" | "hour" => RotationStrategy::Hourly,
            _ => RotationStrategy::Daily,
        }
    }
}

// ============================================================================
// 日志配置
// ============================================================================

/// 日志系统配置
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// 默认日志级别（例如 "trace", "debug", "info", "warn", "error"）
    pub level: String,

    /// 是否使用 JSON 格式输出
    pub json_format: bool,

    /// 是否输出到控制台
    pub console_output: bool,

    /// 文件输出目录（None 表示不输出到文件）
    pub file_output: Option<PathBuf>,

    /// 日志文件名前缀
    pub file_prefix: String,

    /// 日志轮转策略
    pub rotation: RotationStrategy,

    /// 是否显示目标模块
    pub show_target: bool,

    /// 是否显示文件名和行号
    pub show_file_line: bool,

    /// 是否启用 ANSI 颜色（控制台输出）
    pub ansi_colors: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: None,
            file_prefix: "chips-namespace".to_string(),
            rotation: RotationStrategy::Daily,
            show_target: true,
            show_file_line: false,
            ansi_colors: true,
        }
    }
}

impl LoggerConfig {
    /// 创建配置构建器
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::new()
    }

    /// 从 [`LogConfig`](crate::core::config::LogConfig) 创建
    pub fn from_log_config(log_config: &crate::core::config::LogConfig) -> Self {
        Self {
            level: log_config.level.clone(),
            json_format: log_config.json_format,
            file_output: if log_config.file_output {
                log_config.log_dir.clone()
            } else {
                None
            },
            rotation: RotationStrategy::parse(&log_config.rotation),
            ..Default::default()
        }
    }
}

/// 日志配置构建器
#[derive(Debug, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
        }
    }

    /// 设置日志级别
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// 启用 JSON 格式输出
    pub fn json_format(mut self, enable: bool) -> Self {
        self.config.json_format = enable;
        self
    }

    /// 设置控制台输出
    pub fn console_output(mut self, enable: bool) -> Self {
        self.config.console_output = enable;
        self
    }

    /// 设置文件输出目录
    pub fn file_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.file_output = Some(dir.into());
        self
    }

    /// 设置轮转策略
    pub fn rotation(mut self, strategy: RotationStrategy) -> Self {
        self.config.rotation = strategy;
        self
    }

    /// 显示文件名和行号
    pub fn show_file_line(mut self, enable: bool) -> Self {
        self.config.show_file_line = enable;
        self
    }

    /// 启用 ANSI 颜色
    pub fn ansi_colors(mut self, enable: bool) -> Self {
        self.config.ansi_colors = enable;
        self
    }

    /// 构建配置
    pub fn build(self) -> LoggerConfig {
        self.config
    }
}

// ============================================================================
// 日志守卫与初始化
// ============================================================================

/// 日志系统守卫
///
/// 持有非阻塞写入器的 WorkerGuard，丢弃时刷新挂起的日志。
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

impl LogGuard {
    fn empty() -> Self {
        Self { _guards: Vec::new() }
    }

    /// 守卫持有的写入器数量
    pub fn writer_count(&self) -> usize {
        self._guards.len()
    }
}

static LOGGER_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// 日志系统
pub struct Logger;

impl Logger {
    /// 初始化日志系统
    ///
    /// 返回的 `LogGuard` 必须保持存活直到程序退出。
    ///
    /// # Errors
    ///
    /// 日志系统已初始化时返回 [`CoreError::InitFailed`]
    pub fn init(config: LoggerConfig) -> Result<LogGuard> {
        if LOGGER_INITIALIZED.get().is_some() {
            return Err(CoreError::InitFailed(
                "日志系统已初始化，不能重复初始化".to_string(),
            ));
        }

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

        let mut guard = LogGuard::empty();

        let console_writer = if config.console_output {
            let (writer, console_guard) = tracing_appender::non_blocking(io::stdout());
            guard._guards.push(console_guard);
            Some(writer)
        } else {
            None
        };

        let file_writer = match config.file_output {
            Some(ref log_dir) => {
                let appender = RollingFileAppender::new(
                    config.rotation.to_rotation(),
                    log_dir,
                    format!("{}.log", config.file_prefix),
                );
                let (writer, file_guard) = tracing_appender::non_blocking(appender);
                guard._guards.push(file_guard);
                Some(writer)
            }
            None => None,
        };

        let result = if config.json_format {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_writer.map(|w| {
                    tfmt::layer()
                        .json()
                        .with_writer(w)
                        .with_target(config.show_target)
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                }))
                .with(file_writer.map(|w| {
                    tfmt::layer()
                        .json()
                        .with_writer(w)
                        .with_target(config.show_target)
                }))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_writer.map(|w| {
                    tfmt::layer()
                        .with_writer(w)
                        .with_target(config.show_target)
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                        .with_ansi(config.ansi_colors)
                }))
                .with(file_writer.map(|w| {
                    tfmt::layer()
                        .with_writer(w)
                        .with_target(config.show_target)
                        .with_ansi(false)
                }))
                .try_init()
        };

        result.map_err(|e| CoreError::InitFailed(format!("日志系统初始化失败: {}", e)))?;
        let _ = LOGGER_INITIALIZED.set(true);

        Ok(guard)
    }

    /// 尝试初始化日志系统，已初始化时返回空守卫
    pub fn try_init(config: LoggerConfig) -> LogGuard {
        Self::init(config).unwrap_or_else(|_| LogGuard::empty())
    }
}
