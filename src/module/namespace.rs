//! 全局发布的模块命名空间
//!
//! 加载成功的模块可以按模块名发布到这里，供宿主应用的其余部分直接取用。
//! 命名空间必须显式创建并绑定到加载器，没有进程级的全局状态。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::module::metadata::ModuleHandle;

/// 模块命名空间
#[derive(Debug, Default)]
pub struct ModuleNamespace {
    entries: RwLock<HashMap<String, ModuleHandle>>,
}

impl ModuleNamespace {
    /// 创建空的命名空间
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建可共享的命名空间
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// 以 `name` 发布模块，替换同名的旧条目
    pub async fn publish(&self, name: &str, handle: ModuleHandle) {
        let mut entries = self.entries.write().await;
        entries.insert(name.to_string(), handle);
        tracing::trace!(module_name = %name, "模块已发布");
    }

    /// 获取已发布的模块
    pub async fn get(&self, name: &str) -> Option<ModuleHandle> {
        let entries = self.entries.read().await;
        entries.get(name).cloned()
    }

    /// 模块是否已发布
    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    /// 已发布的模块名（已排序）
    pub async fn names(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// 已发布模块数量
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 是否为空
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::metadata::ModuleInstance;
    use chrono::Utc;
    use std::path::PathBuf;

    fn handle(name: &str) -> ModuleHandle {
        Arc::new(ModuleInstance {
            name: name.to_string(),
            source_path: PathBuf::from(format!("lib/{}.mjs", name)),
            resolved_path: PathBuf::from(format!("/app/lib/{}.mjs", name)),
            payload: Vec::new(),
            loaded_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_publish_and_get() {
        let ns = ModuleNamespace::new();
        assert!(ns.is_empty().await);

        let log = handle("Log");
        ns.publish("Log", log.clone()).await;

        assert!(ns.contains("Log").await);
        assert!(Arc::ptr_eq(&ns.get("Log").await.unwrap(), &log));
        assert!(ns.get("Core").await.is_none());
    }

    #[tokio::test]
    async fn test_names_sorted() {
        let ns = ModuleNamespace::new();
        ns.publish("b", handle("b")).await;
        ns.publish("a", handle("a")).await;

        assert_eq!(ns.names().await, vec!["a", "b"]);
        assert_eq!(ns.len().await, 2);
    }
}
