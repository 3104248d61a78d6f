//! 模块加载器
//!
//! 按依赖顺序加载注册表中的模块，管理已加载和失败的模块。
//!
//! # 加载流程
//!
//! 1. 已加载的模块直接返回缓存的句柄，不会再次读取构件
//! 2. 未注册的模块以 [`LoadError::NotRegistered`] 失败并记入失败表
//! 3. 有依赖的模块先等待依赖加载结束（成功或失败）
//! 4. 通过 [`ArtifactResolver`] 读取构件
//! 5. 成功时存入已加载表，并按配置发布到绑定的 [`ModuleNamespace`]
//! 6. 失败时记入失败表，以 [`LoadError::FetchFailed`] 返回原因
//!
//! 同一模块名的并发请求共享同一次加载。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::config::ModuleConfig;
use crate::module::dependency::DependencyPolicy;
use crate::module::metadata::{FailureRecord, ModuleHandle, ModuleInstance, ModuleState};
use crate::module::namespace::ModuleNamespace;
use crate::module::registry::ModuleRegistry;
use crate::module::resolver::ArtifactResolver;
use crate::utils::{CoreError, LoadError, LoadReporter, LogLevel, Result, TracingReporter};

type LoadResult = std::result::Result<ModuleHandle, LoadError>;
type InflightLoad = Shared<BoxFuture<'static, LoadResult>>;

/// 加载器选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// 加载成功后是否发布到绑定的命名空间
    pub publish_globally: bool,
    /// 依赖失败时的处理策略
    pub dependency_policy: DependencyPolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            publish_globally: true,
            dependency_policy: DependencyPolicy::Soft,
        }
    }
}

impl From<&ModuleConfig> for LoaderOptions {
    fn from(config: &ModuleConfig) -> Self {
        Self {
            publish_globally: config.publish_globally,
            dependency_policy: config.dependency_policy,
        }
    }
}

/// 加载器的共享状态
///
/// 一个模块名同一时刻至多出现在 `loaded` 和 `failed` 其中之一。
#[derive(Default)]
struct LoaderState {
    /// 已加载的模块
    loaded: RwLock<HashMap<String, ModuleHandle>>,
    /// 加载失败的模块
    failed: RwLock<HashMap<String, FailureRecord>>,
    /// 正在进行的加载
    inflight: Mutex<HashMap<String, InflightLoad>>,
}

/// 模块加载器
///
/// 克隆得到的加载器共享同一份加载状态。
#[derive(Clone)]
pub struct ModuleLoader {
    registry: ModuleRegistry,
    resolver: Arc<dyn ArtifactResolver>,
    reporter: Arc<dyn LoadReporter>,
    namespace: Option<Arc<ModuleNamespace>>,
    options: LoaderOptions,
    state: Arc<LoaderState>,
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("namespace_bound", &self.namespace.is_some())
            .finish_non_exhaustive()
    }
}

impl ModuleLoader {
    /// 创建模块加载器
    ///
    /// # Arguments
    /// * `registry` - 模块注册表
    /// * `resolver` - 构件解析器
    pub fn new(registry: ModuleRegistry, resolver: Arc<dyn ArtifactResolver>) -> Self {
        Self {
            registry,
            resolver,
            reporter: Arc::new(TracingReporter),
            namespace: None,
            options: LoaderOptions::default(),
            state: Arc::new(LoaderState::default()),
        }
    }

    /// 设置加载器选项
    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置报告器
    pub fn with_reporter(mut self, reporter: Arc<dyn LoadReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// 绑定发布用的命名空间
    pub fn with_namespace(mut self, namespace: Arc<ModuleNamespace>) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// 加载器选项
    pub fn options(&self) -> LoaderOptions {
        self.options
    }

    /// 模块注册表
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// 绑定的命名空间
    pub fn namespace(&self) -> Option<&Arc<ModuleNamespace>> {
        self.namespace.as_ref()
    }

    // ========================================================================
    // 加载
    // ========================================================================

    /// 加载模块（含其依赖）
    ///
    /// # Arguments
    /// * `name` - 模块名
    ///
    /// # Returns
    /// 成功返回模块句柄；已加载的模块返回同一个句柄
    ///
    /// # Errors
    /// - 模块未注册：[`LoadError::NotRegistered`]
    /// - 构件读取失败：[`LoadError::FetchFailed`]
    /// - 硬阻塞策略下依赖失败：[`LoadError::DependencyFailed`]
    pub async fn resolve(&self, name: &str) -> Result<ModuleHandle> {
        self.load_shared(name).await.map_err(CoreError::from)
    }

    /// 并发加载注册表中的所有模块
    ///
    /// 单个模块失败不会导致整体失败；结束时输出一条汇总消息，
    /// 并返回已加载模块的快照。
    pub async fn auto_load(&self) -> HashMap<String, ModuleHandle> {
        let names = self.registry.names().await;
        self.load_all(names).await
    }

    /// 并发加载指定的模块
    pub async fn load_all<I>(&self, names: I) -> HashMap<String, ModuleHandle>
    where
        I: IntoIterator<Item = String>,
    {
        let names: Vec<String> = names.into_iter().collect();
        info!(count = names.len(), "开始加载模块");

        join_all(names.iter().map(|name| self.load_shared(name))).await;

        // 汇总以 failed 表为准，包含视图之外失败的依赖
        let mut failures: Vec<String> = self.state.failed.read().await.keys().cloned().collect();
        failures.sort_unstable();

        if failures.is_empty() {
            self.reporter
                .report(LogLevel::Success, &format!("{} 个模块全部加载完成", names.len()));
        } else {
            self.reporter.report(
                LogLevel::Warning,
                &format!("以下模块加载失败: {}", failures.join(", ")),
            );
        }

        self.loaded().await
    }

    /// 同名请求共享同一次加载
    fn load_shared(&self, name: &str) -> BoxFuture<'static, LoadResult> {
        let loader = self.clone();
        let name = name.to_string();

        async move {
            if let Some(handle) = loader.loaded_handle(&name).await {
                return Ok(handle);
            }

            let inflight = {
                let mut inflight = loader.state.inflight.lock().await;
                // 加载完成时先写结果再移除 in-flight 条目，这里必须重新检查
                if let Some(handle) = loader.loaded_handle(&name).await {
                    return Ok(handle);
                }
                match inflight.get(&name) {
                    Some(existing) => {
                        debug!(module_name = %name, "等待进行中的加载");
                        existing.clone()
                    }
                    None => {
                        let attempt = loader.clone().attempt(name.clone()).boxed().shared();
                        inflight.insert(name.clone(), attempt.clone());
                        attempt
                    }
                }
            };

            inflight.await
        }
        .boxed()
    }

    /// 一次完整的加载尝试
    async fn attempt(self, name: String) -> LoadResult {
        let outcome = self.load_once(&name).await;
        self.state.inflight.lock().await.remove(&name);
        outcome
    }

    async fn load_once(&self, name: &str) -> LoadResult {
        let Some(registration) = self.registry.get(name).await else {
            let err = LoadError::NotRegistered {
                name: name.to_string(),
            };
            self.record_failure(name, FailureRecord::new(None, err.to_string()))
                .await;
            return Err(err);
        };

        if let Some(dependency) = registration.dependency() {
            let graph = self.registry.dependency_graph().await;
            if let Some(cycle) = graph.find_cycle(name) {
                let err = CoreError::CircularDependency(cycle.join(" -> "));
                warn!(module_name = %name, error = %err, "跳过循环依赖的等待");
                self.reporter.report(LogLevel::Warning, &err.to_string());
            } else {
                debug!(module_name = %name, dependency = %dependency, "等待依赖加载");
                if let Err(e) = self.load_shared(dependency).await {
                    match self.options.dependency_policy {
                        DependencyPolicy::Soft => {
                            warn!(module_name = %name, dependency = %dependency, error = %e, "依赖加载失败，继续加载");
                        }
                        DependencyPolicy::Hard => {
                            let err = LoadError::DependencyFailed {
                                name: name.to_string(),
                                dependency: dependency.to_string(),
                            };
                            self.record_failure(
                                name,
                                FailureRecord::new(Some(registration.clone()), err.to_string()),
                            )
                            .await;
                            return Err(err);
                        }
                    }
                }
            }
        }

        let resolved_path = self.resolver.resolve_path(&registration.source_path);
        debug!(module_name = %name, path = ?resolved_path, "读取模块构件");

        let payload = match self.resolver.fetch(&resolved_path).await {
            Ok(payload) => payload,
            Err(cause) => {
                let err = LoadError::FetchFailed {
                    name: name.to_string(),
                    path: registration.source_path.clone(),
                    source: Arc::new(cause),
                };
                self.record_failure(
                    name,
                    FailureRecord::new(Some(registration), err.to_string()),
                )
                .await;
                return Err(err);
            }
        };

        let handle: ModuleHandle = Arc::new(ModuleInstance {
            name: name.to_string(),
            source_path: registration.source_path,
            resolved_path,
            payload,
            loaded_at: chrono::Utc::now(),
        });

        self.state
            .loaded
            .write()
            .await
            .insert(name.to_string(), handle.clone());
        self.state.failed.write().await.remove(name);

        if self.options.publish_globally {
            if let Some(namespace) = &self.namespace {
                namespace.publish(name, handle.clone()).await;
            }
        }

        debug!(module_name = %name, size = handle.len(), "模块加载完成");
        Ok(handle)
    }

    async fn record_failure(&self, name: &str, record: FailureRecord) {
        self.reporter.report(
            LogLevel::Error,
            &format!("模块 {} 加载失败: {}", name, record.reason),
        );
        self.state
            .failed
            .write()
            .await
            .insert(name.to_string(), record);
    }

    // ========================================================================
    // 状态查询
    // ========================================================================

    async fn loaded_handle(&self, name: &str) -> Option<ModuleHandle> {
        self.state.loaded.read().await.get(name).cloned()
    }

    /// 获取已加载的模块
    pub async fn get(&self, name: &str) -> Option<ModuleHandle> {
        self.loaded_handle(name).await
    }

    /// 模块是否已加载
    pub async fn is_loaded(&self, name: &str) -> bool {
        self.state.loaded.read().await.contains_key(name)
    }

    /// 已加载模块的快照
    pub async fn loaded(&self) -> HashMap<String, ModuleHandle> {
        self.state.loaded.read().await.clone()
    }

    /// 失败模块的快照
    pub async fn failed(&self) -> HashMap<String, FailureRecord> {
        self.state.failed.read().await.clone()
    }

    /// 模块当前状态
    pub async fn state(&self, name: &str) -> ModuleState {
        if self.is_loaded(name).await {
            return ModuleState::Loaded;
        }
        if self.state.inflight.lock().await.contains_key(name) {
            return ModuleState::Loading;
        }
        if self.state.failed.read().await.contains_key(name) {
            return ModuleState::Failed;
        }
        if self.registry.is_registered(name).await {
            ModuleState::Registered
        } else {
            ModuleState::Unregistered
        }
    }
}
