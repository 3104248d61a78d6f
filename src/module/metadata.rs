//! 模块注册信息定义
//!
//! 定义注册表中的注册记录、加载后的模块实例以及失败记录。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// 模块状态
///
/// `Unregistered → Registered → Loading → Loaded | Failed`，
/// `Failed` 可以被再次请求重新进入 `Loading`，`Loaded` 是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    /// 未注册
    Unregistered,
    /// 已注册，尚未加载
    Registered,
    /// 正在加载
    Loading,
    /// 已加载
    Loaded,
    /// 加载失败
    Failed,
}

/// 模块注册记录
///
/// 描述如何找到一个可加载单元以及它的（至多一个）直接依赖。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// 模块名，注册表中的唯一键
    pub name: String,

    /// 构件路径（相对于加载器的基础目录）
    pub source_path: PathBuf,

    /// 必须先加载的模块名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,
}

impl Registration {
    /// 创建没有依赖的注册记录
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            dependency: None,
        }
    }

    /// 设置依赖
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependency = Some(dependency.into());
        self
    }

    /// 非空的依赖名
    pub fn dependency(&self) -> Option<&str> {
        self.dependency.as_deref().filter(|d| !d.is_empty())
    }
}

/// 已加载的模块实例
#[derive(Debug)]
pub struct ModuleInstance {
    /// 模块名
    pub name: String,
    /// 注册时的构件路径
    pub source_path: PathBuf,
    /// 实际读取的路径
    pub resolved_path: PathBuf,
    /// 构件内容
    pub payload: Vec<u8>,
    /// 加载完成时间
    pub loaded_at: DateTime<Utc>,
}

impl ModuleInstance {
    /// 构件内容按 UTF-8 解释（无效字节被替换）
    pub fn content(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// 构件大小
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// 构件是否为空
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// 已加载模块的共享句柄
pub type ModuleHandle = Arc<ModuleInstance>;

/// 加载失败记录
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// 失败时的注册记录（未注册的模块为 None）
    pub registration: Option<Registration>,
    /// 失败原因
    pub reason: String,
    /// 失败时间
    pub failed_at: DateTime<Utc>,
}

impl FailureRecord {
    pub(crate) fn new(registration: Option<Registration>, reason: impl Into<String>) -> Self {
        Self {
            registration,
            reason: reason.into(),
            failed_at: Utc::now(),
        }
    }
}
