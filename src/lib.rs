//! # Chips Namespace - 模块命名空间
//!
//! 为宿主应用提供按名字注册、按依赖顺序异步加载模块的能力：
//!
//! - **模块注册表**: 以模块名为键的注册记录，同名注册后写者胜
//! - **模块发现**: 扫描目录树，按文件扩展名自动注册，子目录名成为依赖
//! - **模块加载器**: 先加载依赖再加载自身，并发请求共享同一次加载，失败互不影响
//! - **构件解析器**: 由宿主提供的异步构件读取接口
//! - **日志系统**: 基于 tracing 的结构化日志和加载报告
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use chips_namespace::{Namespace, NamespaceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let namespace = Namespace::new(NamespaceConfig::default())?;
//!
//!     namespace.auto_register(None).await?;
//!     let loaded = namespace.auto_load().await;
//!
//!     for (name, handle) in &loaded {
//!         println!("{} <- {}", name, handle.resolved_path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## 模块结构
//!
//! - `module` - 注册表、模块发现、加载器和构件解析器
//! - `utils` - 错误类型和日志系统
//! - `core` - 配置
//! - `api` - 公共 API 接口

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod core;
pub mod module;
pub mod utils;

// 重导出常用类型，方便使用
pub use crate::module::{
    ArtifactResolver, DependencyGraph, DependencyPolicy, DiscoveryOptions, DiscoveryReport,
    FailureRecord, FsArtifactResolver, LoaderOptions, MemoryArtifactResolver, ModuleDiscovery,
    ModuleHandle, ModuleInstance, ModuleLoader, ModuleNamespace, ModuleRegistry, ModuleState,
    Registration,
};

pub use crate::utils::{error_code, status_code, CoreError, LoadError, Result};
pub use crate::utils::logger::{
    LoadReporter, LogGuard, LogLevel, Logger, LoggerConfig, LoggerConfigBuilder, MemoryReporter,
    RotationStrategy, TracingReporter,
};

pub use crate::core::config::{LogConfig, ModuleConfig, NamespaceConfig, NamespaceConfigBuilder};
pub use crate::api::sdk::{Namespace, NamespaceStats};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
