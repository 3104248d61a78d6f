//! 模块依赖管理
//!
//! 每个注册记录至多声明一个直接依赖，因此依赖关系是一组链而不是一般的 DAG。
//!
//! # 主要组件
//!
//! - [`DependencyPolicy`] - 依赖加载失败时的处理策略
//! - [`DependencyGraph`] - 由注册记录构建的依赖图，用于环检测和加载顺序诊断
//!
//! # 示例
//!
//! ```rust
//! use chips_namespace::module::dependency::DependencyGraph;
//! use chips_namespace::module::Registration;
//!
//! let graph = DependencyGraph::from_registrations([
//!     Registration::new("Core", "lib/Core.mjs"),
//!     Registration::new("Article", "lib/Controller/Article.mjs").with_dependency("Core"),
//! ]);
//!
//! assert_eq!(graph.chain("Article"), vec!["Core".to_string()]);
//! assert!(!graph.has_cycle());
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::module::metadata::Registration;
use crate::utils::{CoreError, Result};

/// 依赖加载失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyPolicy {
    /// 软阻塞：记录依赖失败，仍然尝试加载依赖方（默认）
    #[default]
    Soft,
    /// 硬阻塞：依赖失败时依赖方直接失败，不读取其构件
    Hard,
}

/// 模块依赖关系图
///
/// 正向边是 `模块 -> 直接依赖`，每个模块至多一条。
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// 正向边：模块名 -> 依赖的模块名
    edges: HashMap<String, Option<String>>,
}

impl DependencyGraph {
    /// 创建空的依赖图
    pub fn new() -> Self {
        Self::default()
    }

    /// 由注册记录构建依赖图
    pub fn from_registrations<I>(registrations: I) -> Self
    where
        I: IntoIterator<Item = Registration>,
    {
        let mut graph = Self::new();
        for reg in registrations {
            graph.insert(&reg.name, reg.dependency());
        }
        graph
    }

    /// 插入或替换一个模块的依赖
    pub fn insert(&mut self, module: &str, dependency: Option<&str>) {
        self.edges
            .insert(module.to_string(), dependency.map(str::to_string));
    }

    /// 模块的直接依赖
    pub fn dependency_of(&self, module: &str) -> Option<&str> {
        self.edges.get(module).and_then(|d| d.as_deref())
    }

    /// 沿依赖链向上收集依赖（由近及远），遇到环时停止
    pub fn chain(&self, module: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(module);

        let mut current = self.dependency_of(module);
        while let Some(dep) = current {
            if !seen.insert(dep) {
                break;
            }
            chain.push(dep.to_string());
            current = self.dependency_of(dep);
        }
        chain
    }

    /// 查找经过 `module` 的依赖环
    ///
    /// 返回环上的模块（从 `module` 开始，以 `module` 结束）。
    pub fn find_cycle(&self, module: &str) -> Option<Vec<String>> {
        let mut path = vec![module.to_string()];
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(module);

        let mut current = self.dependency_of(module);
        while let Some(dep) = current {
            path.push(dep.to_string());
            if dep == module {
                return Some(path);
            }
            if !seen.insert(dep) {
                // 进入了一个不经过 module 的环
                return None;
            }
            current = self.dependency_of(dep);
        }
        None
    }

    /// 图中是否存在依赖环
    pub fn has_cycle(&self) -> bool {
        self.edges.keys().any(|m| self.find_cycle(m).is_some())
    }

    /// 计算加载顺序（依赖在前）
    ///
    /// 依赖了未注册模块的模块仍然出现在结果中。
    ///
    /// # Errors
    ///
    /// 存在依赖环时返回 [`CoreError::CircularDependency`]
    pub fn load_order(&self) -> Result<Vec<String>> {
        let mut names: Vec<&String> = self.edges.keys().collect();
        names.sort();

        let mut order = Vec::with_capacity(names.len());
        let mut placed: HashSet<String> = HashSet::new();

        for name in names {
            if let Some(cycle) = self.find_cycle(name) {
                return Err(CoreError::CircularDependency(cycle.join(" -> ")));
            }
            let mut pending: Vec<String> = self
                .chain(name)
                .into_iter()
                .filter(|m| self.edges.contains_key(m))
                .collect();
            pending.reverse();
            pending.push(name.clone());
            for module in pending {
                if placed.insert(module.clone()) {
                    order.push(module);
                }
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, Option<&str>)]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for (m, d) in edges {
            g.insert(m, *d);
        }
        g
    }

    #[test]
    fn test_policy_default_is_soft() {
        assert_eq!(DependencyPolicy::default(), DependencyPolicy::Soft);
        let parsed: DependencyPolicy = serde_yaml::from_str("hard").unwrap();
        assert_eq!(parsed, DependencyPolicy::Hard);
    }

    #[test]
    fn test_chain() {
        let g = graph(&[("a", None), ("b", Some("a")), ("c", Some("b"))]);
        assert_eq!(g.chain("c"), vec!["b".to_string(), "a".to_string()]);
        assert!(g.chain("a").is_empty());
    }

    #[test]
    fn test_insert_replaces_edge() {
        let mut g = graph(&[("b", Some("a"))]);
        g.insert("b", Some("x"));
        assert_eq!(g.dependency_of("b"), Some("x"));
        assert_eq!(g.chain("b"), vec!["x".to_string()]);
    }

    #[test]
    fn test_find_cycle() {
        let g = graph(&[("a", Some("b")), ("b", Some("a")), ("c", Some("a"))]);
        assert_eq!(
            g.find_cycle("a"),
            Some(vec!["a".to_string(), "b".to_string(), "a".to_string()])
        );
        // c 依赖环上的模块，但自身不在环上
        assert!(g.find_cycle("c").is_none());
        assert!(g.has_cycle());
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&[("a", Some("a"))]);
        assert_eq!(g.find_cycle("a"), Some(vec!["a".to_string(), "a".to_string()]));
    }

    #[test]
    fn test_load_order() {
        let g = graph(&[("c", Some("b")), ("b", Some("a")), ("a", None), ("d", Some("missing"))]);
        let order = g.load_order().unwrap();

        let pos = |m: &str| order.iter().position(|x| x == m).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
        assert!(order.contains(&"d".to_string()));
        assert!(!order.contains(&"missing".to_string()));
    }

    #[test]
    fn test_load_order_with_cycle() {
        let g = graph(&[("a", Some("b")), ("b", Some("a"))]);
        assert!(matches!(g.load_order(), Err(CoreError::CircularDependency(_))));
    }
}
