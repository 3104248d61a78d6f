//! Namespace SDK
//!
//! 模块命名空间的主要对外接口，把配置、注册表、模块发现、加载器、
//! 构件解析器和报告器组合在一起：
//!
//! - 模块发现：扫描目录并自动注册
//! - 模块加载：按依赖顺序加载单个或全部模块
//! - 状态查询：已注册、已加载、失败的模块快照
//!
//! # 示例
//!
//! ```rust,no_run
//! use chips_namespace::{Namespace, NamespaceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NamespaceConfig::builder()
//!         .base_dir("./app")
//!         .module_path("lib")
//!         .build();
//!
//!     let namespace = Namespace::new(config)?;
//!
//!     // 扫描 lib 目录并注册所有模块
//!     namespace.auto_register(None).await?;
//!
//!     // 加载全部模块
//!     let loaded = namespace.auto_load().await;
//!     println!("已加载 {} 个模块", loaded.len());
//!
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::NamespaceConfig;
use crate::module::{
    ArtifactResolver, DiscoveryOptions, FailureRecord, FsArtifactResolver, LoaderOptions,
    ModuleDiscovery, ModuleHandle, ModuleLoader, ModuleNamespace, ModuleRegistry, ModuleState,
    Registration,
};
use crate::utils::{LoadReporter, LogLevel, Result, TracingReporter};

// ============================================================================
// 统计信息
// ============================================================================

/// 命名空间统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceStats {
    /// 已注册模块数
    pub registered: usize,
    /// 已加载模块数
    pub loaded: usize,
    /// 失败模块数
    pub failed: usize,
    /// 已发布到命名空间的模块数
    pub published: usize,
}

// ============================================================================
// Namespace 主结构体
// ============================================================================

/// 模块命名空间
///
/// # 组件
///
/// - `registry`: 模块注册表
/// - `discovery`: 目录扫描式模块发现
/// - `loader`: 按依赖顺序的模块加载器
/// - `namespace`: 已加载模块的发布位置
///
/// 加载器和发现器共享同一个注册表。
pub struct Namespace {
    config: NamespaceConfig,
    registry: ModuleRegistry,
    discovery: ModuleDiscovery,
    loader: ModuleLoader,
    namespace: Arc<ModuleNamespace>,
    resolver: Arc<dyn ArtifactResolver>,
    reporter: Arc<dyn LoadReporter>,
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl Namespace {
    // ========================================================================
    // 初始化
    // ========================================================================

    /// 创建命名空间
    ///
    /// 默认使用基于 `base_dir` 的文件系统构件解析器和 tracing 报告器。
    ///
    /// # Arguments
    ///
    /// * `config` - 命名空间配置
    ///
    /// # Errors
    ///
    /// 配置校验失败时返回 [`CoreError::InvalidConfigValue`](crate::CoreError::InvalidConfigValue)
    pub fn new(config: NamespaceConfig) -> Result<Self> {
        config.validate()?;
        info!("初始化模块命名空间 v{}", crate::VERSION);

        let registry = ModuleRegistry::new();
        let discovery = ModuleDiscovery::new(registry.clone(), DiscoveryOptions::from(&config.modules));
        let resolver: Arc<dyn ArtifactResolver> =
            Arc::new(FsArtifactResolver::new(config.modules.base_dir.clone()));
        let reporter: Arc<dyn LoadReporter> = Arc::new(TracingReporter);
        let namespace = ModuleNamespace::shared();
        let loader = Self::build_loader(&config, &registry, &resolver, &reporter, &namespace);

        debug!(base_dir = ?config.modules.base_dir, module_path = ?config.modules.module_path, "命名空间初始化完成");

        Ok(Self {
            config,
            registry,
            discovery,
            loader,
            namespace,
            resolver,
            reporter,
        })
    }

    /// 替换构件解析器
    ///
    /// 会重建加载器，应在加载任何模块之前调用。
    pub fn with_resolver(mut self, resolver: Arc<dyn ArtifactResolver>) -> Self {
        self.resolver = resolver;
        self.rebuild_loader();
        self
    }

    /// 替换报告器
    ///
    /// 会重建加载器，应在加载任何模块之前调用。
    pub fn with_reporter(mut self, reporter: Arc<dyn LoadReporter>) -> Self {
        self.reporter = reporter;
        self.rebuild_loader();
        self
    }

    fn rebuild_loader(&mut self) {
        self.loader = Self::build_loader(
            &self.config,
            &self.registry,
            &self.resolver,
            &self.reporter,
            &self.namespace,
        );
    }

    fn build_loader(
        config: &NamespaceConfig,
        registry: &ModuleRegistry,
        resolver: &Arc<dyn ArtifactResolver>,
        reporter: &Arc<dyn LoadReporter>,
        namespace: &Arc<ModuleNamespace>,
    ) -> ModuleLoader {
        ModuleLoader::new(registry.clone(), resolver.clone())
            .with_options(LoaderOptions::from(&config.modules))
            .with_reporter(reporter.clone())
            .with_namespace(namespace.clone())
    }

    // ========================================================================
    // 模块发现与注册
    // ========================================================================

    /// 扫描目录并自动注册模块
    ///
    /// # Arguments
    ///
    /// * `module_path` - 相对于基础目录的搜索路径，`None` 时使用配置中的默认路径
    ///
    /// # Returns
    ///
    /// 扫描结束后注册表的快照。部分子目录读取失败时仍返回成功，
    /// 失败分支通过报告器以错误级别输出。
    ///
    /// # Errors
    ///
    /// 起始目录无法读取时返回 [`CoreError::DirectoryReadFailed`](crate::CoreError::DirectoryReadFailed)
    pub async fn auto_register(
        &self,
        module_path: Option<&Path>,
    ) -> Result<HashMap<String, Registration>> {
        let outcome = match module_path {
            Some(path) => self.discovery.discover(path).await,
            None => self.discovery.scan().await,
        };

        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                self.reporter
                    .report(LogLevel::Error, &format!("模块自动注册失败: {}", e));
                return Err(e);
            }
        };

        if report.is_complete() {
            self.reporter.report(
                LogLevel::Success,
                &format!("自动注册了 {} 个模块", report.registered.len()),
            );
        } else {
            let failures: Vec<String> = report.failures.iter().map(|e| e.to_string()).collect();
            self.reporter.report(
                LogLevel::Error,
                &format!(
                    "模块自动注册部分失败（已注册 {} 个）: {}",
                    report.registered.len(),
                    failures.join("; ")
                ),
            );
        }

        Ok(self.registry.registered().await)
    }

    /// 注册模块
    pub async fn register(&self, registration: Registration) -> Option<Registration> {
        self.registry.register(registration).await
    }

    /// 以别名注册模块
    pub async fn register_as(&self, registration: Registration, alias: &str) -> Option<Registration> {
        self.registry.register_as(registration, alias).await
    }

    // ========================================================================
    // 模块加载
    // ========================================================================

    /// 加载模块（含其依赖）
    ///
    /// # Errors
    ///
    /// 见 [`ModuleLoader::resolve`]
    pub async fn resolve(&self, name: &str) -> Result<ModuleHandle> {
        self.loader.resolve(name).await
    }

    /// 加载所有已注册的模块
    pub async fn auto_load(&self) -> HashMap<String, ModuleHandle> {
        self.loader.auto_load().await
    }

    /// 计算当前注册内容的加载顺序（依赖在前）
    ///
    /// # Errors
    ///
    /// 存在循环依赖时返回 [`CoreError::CircularDependency`](crate::CoreError::CircularDependency)
    pub async fn load_order(&self) -> Result<Vec<String>> {
        self.registry.dependency_graph().await.load_order()
    }

    // ========================================================================
    // 状态查询
    // ========================================================================

    /// 已注册模块的快照
    pub async fn registered(&self) -> HashMap<String, Registration> {
        self.registry.registered().await
    }

    /// 已加载模块的快照
    pub async fn loaded(&self) -> HashMap<String, ModuleHandle> {
        self.loader.loaded().await
    }

    /// 失败模块的快照
    pub async fn failed(&self) -> HashMap<String, FailureRecord> {
        self.loader.failed().await
    }

    /// 模块是否已注册
    pub async fn is_registered(&self, name: &str) -> bool {
        self.registry.is_registered(name).await
    }

    /// 模块是否已加载
    pub async fn is_loaded(&self, name: &str) -> bool {
        self.loader.is_loaded(name).await
    }

    /// 模块当前状态
    pub async fn state(&self, name: &str) -> ModuleState {
        self.loader.state(name).await
    }

    /// 统计信息
    pub async fn stats(&self) -> NamespaceStats {
        NamespaceStats {
            registered: self.registry.count().await,
            loaded: self.loader.loaded().await.len(),
            failed: self.loader.failed().await.len(),
            published: self.namespace.len().await,
        }
    }

    /// 已加载模块的发布位置
    pub fn namespace(&self) -> &Arc<ModuleNamespace> {
        &self.namespace
    }

    /// 模块注册表
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// 模块加载器
    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// 配置
    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MemoryArtifactResolver;
    use crate::utils::MemoryReporter;
    use tempfile::TempDir;

    async fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = NamespaceConfig::builder().include_extensions(Vec::<String>::new()).build();
        assert!(Namespace::new(config).is_err());
    }

    #[tokio::test]
    async fn test_register_and_resolve_in_memory() {
        let resolver = Arc::new(MemoryArtifactResolver::new().with_artifact("lib/Log.mjs", "log"));
        let ns = Namespace::new(NamespaceConfig::default())
            .unwrap()
            .with_resolver(resolver);

        ns.register(Registration::new("Log", "lib/Log.mjs")).await;
        let handle = ns.resolve("Log").await.unwrap();

        assert_eq!(handle.content(), "log");
        assert!(ns.is_loaded("Log").await);
        assert!(ns.namespace().contains("Log").await);
    }

    #[tokio::test]
    async fn test_auto_register_and_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "lib/Core.mjs", "core").await;
        write(temp_dir.path(), "lib/Controller/Article.mjs", "article").await;
        write(temp_dir.path(), "lib/Controller.mjs", "controller").await;

        let reporter = Arc::new(MemoryReporter::new());
        let config = NamespaceConfig::builder().base_dir(temp_dir.path()).build();
        let ns = Namespace::new(config).unwrap().with_reporter(reporter.clone());

        let registered = ns.auto_register(None).await.unwrap();
        assert_eq!(registered.len(), 3);
        assert_eq!(registered["Article"].dependency(), Some("Controller"));

        let loaded = ns.auto_load().await;
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded["Article"].content(), "article");

        let stats = ns.stats().await;
        assert_eq!(stats.loaded, 3);
        assert_eq!(stats.published, 3);
        assert_eq!(stats.failed, 0);
        assert_eq!(reporter.messages(LogLevel::Success).len(), 2);
    }

    #[tokio::test]
    async fn test_auto_register_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = Arc::new(MemoryReporter::new());
        let config = NamespaceConfig::builder().base_dir(temp_dir.path()).build();
        let ns = Namespace::new(config).unwrap().with_reporter(reporter.clone());

        assert!(ns.auto_register(None).await.is_err());
        assert_eq!(reporter.messages(LogLevel::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_load_order() {
        let ns = Namespace::new(NamespaceConfig::default()).unwrap();
        ns.register(Registration::new("b", "lib/b.js").with_dependency("a")).await;
        ns.register(Registration::new("a", "lib/a.js")).await;

        assert_eq!(ns.load_order().await.unwrap(), vec!["a", "b"]);
    }
}
