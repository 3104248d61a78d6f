//! 模块发现
//!
//! 遍历目录树，为每个扩展名在允许列表中的文件注册一个模块。
//! 子目录名会作为其中（直接）文件的依赖：`lib/Controller/Article.mjs`
//! 注册为 `Article`，依赖 `Controller`。每一层只继承直接父目录名，
//! 不是整个祖先链。
//!
//! 子目录并发遍历；某个分支读取失败只影响该分支，结果中会列出所有失败的分支。

use std::path::{Component, Path, PathBuf};

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, trace, warn};

use crate::core::config::ModuleConfig;
use crate::module::metadata::Registration;
use crate::module::registry::ModuleRegistry;
use crate::utils::{CoreError, Result};

/// 模块发现选项
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// 基础目录
    pub base_dir: PathBuf,
    /// 默认搜索路径（相对于基础目录）
    pub module_path: PathBuf,
    /// 允许的扩展名（不含点，小写）
    pub include_extensions: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from(&ModuleConfig::default())
    }
}

impl From<&ModuleConfig> for DiscoveryOptions {
    fn from(config: &ModuleConfig) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            module_path: config.module_path.clone(),
            include_extensions: config.normalized_extensions(),
        }
    }
}

impl DiscoveryOptions {
    /// 文件扩展名是否在允许列表中（区分大小写）
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.include_extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}

/// 一次模块发现的结果
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// 本次注册的模块
    pub registered: Vec<Registration>,
    /// 读取失败的分支
    pub failures: Vec<CoreError>,
}

impl DiscoveryReport {
    /// 所有分支是否都读取成功
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, other: DiscoveryReport) {
        self.registered.extend(other.registered);
        self.failures.extend(other.failures);
    }
}

/// 模块发现器
#[derive(Debug, Clone)]
pub struct ModuleDiscovery {
    registry: ModuleRegistry,
    options: DiscoveryOptions,
}

impl ModuleDiscovery {
    /// 创建写入 `registry` 的模块发现器
    pub fn new(registry: ModuleRegistry, options: DiscoveryOptions) -> Self {
        Self { registry, options }
    }

    /// 发现选项
    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// 扫描默认搜索路径
    pub async fn scan(&self) -> Result<DiscoveryReport> {
        let module_path = self.options.module_path.clone();
        self.discover(&module_path).await
    }

    /// 扫描 `module_path`（相对于基础目录）并注册找到的模块
    ///
    /// # Errors
    ///
    /// 起始目录无法读取时返回 [`CoreError::DirectoryReadFailed`]；
    /// 子目录的读取失败记录在 [`DiscoveryReport::failures`] 中。
    pub async fn discover(&self, module_path: &Path) -> Result<DiscoveryReport> {
        let module_path = normalize(module_path);
        debug!(base_dir = ?self.options.base_dir, module_path = ?module_path, "开始扫描模块目录");

        let report = self.walk(module_path, None).await?;
        debug!(
            registered = report.registered.len(),
            failures = report.failures.len(),
            "模块目录扫描完成"
        );
        Ok(report)
    }

    fn walk(
        &self,
        module_path: PathBuf,
        dependency: Option<String>,
    ) -> BoxFuture<'_, Result<DiscoveryReport>> {
        async move {
            let dir = self.options.base_dir.join(&module_path);
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|source| CoreError::DirectoryReadFailed {
                    path: dir.clone(),
                    source,
                })?;

            let mut report = DiscoveryReport::default();
            let mut branches = Vec::new();

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(source) => {
                        report.failures.push(CoreError::DirectoryReadFailed {
                            path: dir.clone(),
                            source,
                        });
                        break;
                    }
                };

                let file_name = entry.file_name().to_string_lossy().to_string();
                let entry_path = entry.path();

                // 跟随符号链接
                let metadata = match tokio::fs::metadata(&entry_path).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(path = ?entry_path, error = %e, "无法读取文件信息，跳过");
                        continue;
                    }
                };

                if metadata.is_dir() {
                    branches.push(self.walk(module_path.join(&file_name), Some(file_name)));
                } else if self.options.accepts(&entry_path) {
                    let Some(name) = entry_path.file_stem().map(|s| s.to_string_lossy().to_string())
                    else {
                        continue;
                    };
                    let registration = Registration {
                        name,
                        source_path: module_path.join(&file_name),
                        dependency: dependency.clone(),
                    };
                    if let Some(stored) = self.registry.register(registration).await {
                        trace!(module_name = %stored.name, dependency = ?stored.dependency, "发现模块");
                        report.registered.push(stored);
                    }
                }
            }

            for outcome in join_all(branches).await {
                match outcome {
                    Ok(branch) => report.absorb(branch),
                    Err(e) => {
                        warn!(error = %e, "模块子目录扫描失败");
                        report.failures.push(e);
                    }
                }
            }

            Ok(report)
        }
        .boxed()
    }
}

/// 去掉路径中的 `.` 组件
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
