//! 模块管理模块
//!
//! 包含模块命名空间的核心组件：
//! - 注册记录与加载结果定义
//! - 模块注册表
//! - 目录扫描式模块发现
//! - 按依赖顺序的模块加载器
//! - 构件解析器接口
//! - 全局发布的模块命名空间

pub mod dependency;
pub mod discovery;
pub mod loader;
pub mod metadata;
pub mod namespace;
pub mod registry;
pub mod resolver;

// 重导出常用类型
pub use dependency::{DependencyGraph, DependencyPolicy};
pub use discovery::{DiscoveryOptions, DiscoveryReport, ModuleDiscovery};
pub use loader::{LoaderOptions, ModuleLoader};
pub use metadata::{FailureRecord, ModuleHandle, ModuleInstance, ModuleState, Registration};
pub use namespace::ModuleNamespace;
pub use registry::ModuleRegistry;
pub use resolver::{ArtifactResolver, FsArtifactResolver, MemoryArtifactResolver};
