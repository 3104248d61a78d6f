//! 工具模块
//!
//! 包含错误类型和日志系统。

pub mod error;
pub mod logger;

// 重导出常用类型
pub use error::{error_code, status_code, CoreError, LoadError, Result};
pub use logger::{
    LoadReporter, LogGuard, LogLevel, Logger, LoggerConfig, LoggerConfigBuilder, MemoryReporter,
    RotationStrategy, TracingReporter,
};
