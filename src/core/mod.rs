//! 核心模块
//!
//! 包含命名空间配置。

pub mod config;

pub use config::{LogConfig, ModuleConfig, NamespaceConfig, NamespaceConfigBuilder};
