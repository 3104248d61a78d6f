//! 构件解析器
//!
//! 定义把注册记录中的构件路径变成字节内容的接口，以及文件系统和内存两种实现。
//! 加载器不关心构件内容的格式，只要求读取是异步且全有或全无的。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::trace;

use crate::utils::{CoreError, Result};

/// 构件解析器接口
///
/// 由宿主应用提供，加载器通过它获取模块构件。
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// 把注册记录中的相对路径转换成实际读取的路径
    fn resolve_path(&self, source_path: &Path) -> PathBuf {
        source_path.to_path_buf()
    }

    /// 读取构件内容
    async fn fetch(&self, path: &Path) -> Result<Vec<u8>>;
}

/// 文件系统构件解析器
///
/// 相对路径基于 `root` 解析，绝对路径原样使用。
#[derive(Debug, Clone)]
pub struct FsArtifactResolver {
    root: PathBuf,
}

impl FsArtifactResolver {
    /// 以 `root` 为基础目录创建解析器
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 基础目录
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactResolver for FsArtifactResolver {
    fn resolve_path(&self, source_path: &Path) -> PathBuf {
        if source_path.is_absolute() {
            source_path.to_path_buf()
        } else {
            self.root.join(source_path)
        }
    }

    async fn fetch(&self, path: &Path) -> Result<Vec<u8>> {
        trace!(path = ?path, "读取模块构件");
        tokio::fs::read(path)
            .await
            .map_err(|e| CoreError::ArtifactUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// 内存构件解析器
///
/// 适用于内置模块、嵌入式构件和测试。
#[derive(Debug, Default)]
pub struct MemoryArtifactResolver {
    artifacts: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryArtifactResolver {
    /// 创建空的内存解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加（或替换）一个构件
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let mut artifacts = match self.artifacts.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        artifacts.insert(path.into(), content.into());
    }

    /// 链式添加构件
    pub fn with_artifact(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// 构件数量
    pub fn len(&self) -> usize {
        self.artifacts.read().map(|a| a.len()).unwrap_or(0)
    }

    /// 是否没有构件
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactResolver for MemoryArtifactResolver {
    async fn fetch(&self, path: &Path) -> Result<Vec<u8>> {
        let artifacts = match self.artifacts.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        artifacts
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::ArtifactUnavailable {
                path: path.to_path_buf(),
                reason: "构件不存在".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_resolver_reads_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::create_dir_all(temp_dir.path().join("lib")).await.unwrap();
        tokio::fs::write(temp_dir.path().join("lib/Log.mjs"), "export default 1;")
            .await
            .unwrap();

        let resolver = FsArtifactResolver::new(temp_dir.path());
        let path = resolver.resolve_path(Path::new("lib/Log.mjs"));
        assert_eq!(path, temp_dir.path().join("lib/Log.mjs"));

        let content = resolver.fetch(&path).await.unwrap();
        assert_eq!(content, b"export default 1;");
    }

    #[tokio::test]
    async fn test_fs_resolver_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = FsArtifactResolver::new(temp_dir.path());

        let path = resolver.resolve_path(Path::new("missing.js"));
        let err = resolver.fetch(&path).await.unwrap_err();
        assert!(matches!(err, CoreError::ArtifactUnavailable { .. }));
    }

    #[test]
    fn test_fs_resolver_absolute_path() {
        let resolver = FsArtifactResolver::new("/srv/app");
        let abs = PathBuf::from("/opt/mods/a.js");
        assert_eq!(resolver.resolve_path(&abs), abs);
    }

    #[tokio::test]
    async fn test_memory_resolver() {
        let resolver = MemoryArtifactResolver::new().with_artifact("lib/a.js", "a");
        assert_eq!(resolver.len(), 1);

        assert_eq!(resolver.fetch(Path::new("lib/a.js")).await.unwrap(), b"a");
        assert!(resolver.fetch(Path::new("lib/b.js")).await.is_err());
    }
}
