//! 模块注册表
//!
//! 以模块名为键保存注册记录。注册表由模块发现写入，由加载器读取；
//! 克隆得到的注册表共享同一份数据。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::module::dependency::DependencyGraph;
use crate::module::metadata::Registration;

/// 模块注册表
///
/// - 同名注册会整体替换旧记录（后写者胜）
/// - 不提供取消注册
/// - 注册顺序不影响加载顺序，只有依赖字段决定顺序
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    /// 已注册的模块：模块名 -> 注册记录
    modules: Arc<RwLock<HashMap<String, Registration>>>,
}

impl ModuleRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 以注册记录自身的名字注册模块
    ///
    /// # Returns
    ///
    /// 存入的注册记录；名字为空时不注册并返回 `None`
    pub async fn register(&self, registration: Registration) -> Option<Registration> {
        let name = registration.name.clone();
        self.register_as(registration, &name).await
    }

    /// 以别名注册模块
    ///
    /// 注册记录原样保存在 `alias` 键下，允许覆盖或给模块起别名。
    pub async fn register_as(
        &self,
        registration: Registration,
        alias: &str,
    ) -> Option<Registration> {
        if alias.trim().is_empty() {
            tracing::debug!(source_path = ?registration.source_path, "模块名为空，跳过注册");
            return None;
        }

        let mut modules = self.modules.write().await;
        if let Some(previous) = modules.insert(alias.to_string(), registration.clone()) {
            tracing::debug!(
                module_name = %alias,
                previous = ?previous.source_path,
                replacement = ?registration.source_path,
                "模块注册被覆盖"
            );
        } else {
            tracing::trace!(module_name = %alias, "模块已注册");
        }
        Some(registration)
    }

    /// 检查模块是否已注册
    pub async fn is_registered(&self, name: &str) -> bool {
        let modules = self.modules.read().await;
        modules.contains_key(name)
    }

    /// 获取模块注册记录
    pub async fn get(&self, name: &str) -> Option<Registration> {
        let modules = self.modules.read().await;
        modules.get(name).cloned()
    }

    /// 当前注册内容的快照
    pub async fn registered(&self) -> HashMap<String, Registration> {
        let modules = self.modules.read().await;
        modules.clone()
    }

    /// 所有已注册的模块名（已排序）
    pub async fn names(&self) -> Vec<String> {
        let modules = self.modules.read().await;
        let mut names: Vec<String> = modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// 已注册模块数量
    pub async fn count(&self) -> usize {
        let modules = self.modules.read().await;
        modules.len()
    }

    /// 由当前注册内容构建依赖图
    pub async fn dependency_graph(&self) -> DependencyGraph {
        let modules = self.modules.read().await;
        let mut graph = DependencyGraph::new();
        for (name, reg) in modules.iter() {
            graph.insert(name, reg.dependency());
        }
        graph
    }
}
