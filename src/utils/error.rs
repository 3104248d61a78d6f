//! 命名空间错误类型定义
//!
//! 本模块定义了注册表、模块发现与加载器中使用的所有错误类型。

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// 命名空间核心错误类型
#[derive(Error, Debug)]
pub enum CoreError {
    // ==================== 模块加载错误 ====================

    /// 单个模块的加载结果错误（可在多个等待者之间共享）
    #[error(transparent)]
    Load(#[from] LoadError),

    /// 检测到循环依赖
    #[error("检测到循环依赖: {0}")]
    CircularDependency(String),

    /// 模块名无效（空名称）
    #[error("无效的模块名: '{0}'")]
    InvalidModuleName(String),

    // ==================== 模块发现错误 ====================

    /// 目录读取失败
    #[error("无法读取模块目录 {path:?}: {source}")]
    DirectoryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 构件读取失败（由构件解析器返回）
    #[error("无法读取模块构件 {path:?}: {reason}")]
    ArtifactUnavailable {
        path: PathBuf,
        reason: String,
    },

    // ==================== 配置错误 ====================

    /// 配置加载失败
    #[error("配置加载失败: {0}")]
    ConfigLoadFailed(String),

    /// 配置值无效
    #[error("配置值无效: '{key}' - {reason}")]
    InvalidConfigValue {
        key: String,
        reason: String,
    },

    // ==================== IO 和序列化错误 ====================

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML 序列化/反序列化错误
    #[error("YAML 错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ==================== 通用错误 ====================

    /// 初始化失败
    #[error("初始化失败: {0}")]
    InitFailed(String),

    /// 其他错误
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// 模块加载错误
///
/// 同一个模块名的并发请求共享同一次加载，因此加载结果必须可以克隆；
/// 底层原因以 `Arc` 形式保存。
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// 请求加载的模块未注册
    #[error("模块未注册: '{name}'")]
    NotRegistered { name: String },

    /// 构件获取失败（读取、解析或执行错误）
    #[error("模块加载失败: '{name}' ({path:?}) - {source}")]
    FetchFailed {
        name: String,
        path: PathBuf,
        #[source]
        source: Arc<CoreError>,
    },

    /// 依赖加载失败且策略为硬阻塞
    #[error("模块 '{name}' 的依赖 '{dependency}' 加载失败")]
    DependencyFailed { name: String, dependency: String },
}

impl LoadError {
    /// 出错的模块名
    pub fn module_name(&self) -> &str {
        match self {
            LoadError::NotRegistered { name }
            | LoadError::FetchFailed { name, .. }
            | LoadError::DependencyFailed { name, .. } => name,
        }
    }
}

/// 命名空间操作结果类型别名
pub type Result<T> = std::result::Result<T, CoreError>;

/// 状态码常量
pub mod status_code {
    /// 成功
    pub const OK: u16 = 200;

    /// 请求格式错误
    pub const BAD_REQUEST: u16 = 400;

    /// 未找到
    pub const NOT_FOUND: u16 = 404;

    /// 冲突
    pub const CONFLICT: u16 = 409;

    /// 依赖失败
    pub const FAILED_DEPENDENCY: u16 = 424;

    /// 内部错误
    pub const INTERNAL_ERROR: u16 = 500;

    /// 服务不可用
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}

/// 错误码常量
pub mod error_code {
    // 模块错误 (MODULE-xxx)
    pub const MODULE_NOT_REGISTERED: &str = "MODULE-001";
    pub const MODULE_LOAD_FAILED: &str = "MODULE-003";
    pub const MODULE_CIRCULAR_DEPENDENCY: &str = "MODULE-005";
    pub const MODULE_DEPENDENCY_FAILED: &str = "MODULE-006";
    pub const MODULE_INVALID_NAME: &str = "MODULE-007";

    // 资源错误 (RESOURCE-xxx)
    pub const RESOURCE_NOT_FOUND: &str = "RESOURCE-001";
    pub const RESOURCE_ACCESS_FAILED: &str = "RESOURCE-002";

    // 配置错误 (CONFIG-xxx)
    pub const CONFIG_LOAD_FAILED: &str = "CONFIG-001";
    pub const CONFIG_INVALID_VALUE: &str = "CONFIG-002";
}

impl CoreError {
    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Load(LoadError::NotRegistered { .. }) => error_code::MODULE_NOT_REGISTERED,
            CoreError::Load(LoadError::FetchFailed { .. }) => error_code::MODULE_LOAD_FAILED,
            CoreError::Load(LoadError::DependencyFailed { .. }) => {
                error_code::MODULE_DEPENDENCY_FAILED
            }
            CoreError::CircularDependency(_) => error_code::MODULE_CIRCULAR_DEPENDENCY,
            CoreError::InvalidModuleName(_) => error_code::MODULE_INVALID_NAME,
            CoreError::DirectoryReadFailed { .. } => error_code::RESOURCE_ACCESS_FAILED,
            CoreError::ArtifactUnavailable { .. } => error_code::RESOURCE_NOT_FOUND,
            CoreError::ConfigLoadFailed(_) => error_code::CONFIG_LOAD_FAILED,
            CoreError::InvalidConfigValue { .. } => error_code::CONFIG_INVALID_VALUE,
            _ => "UNKNOWN",
        }
    }

    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Load(LoadError::NotRegistered { .. }) => status_code::NOT_FOUND,
            CoreError::Load(LoadError::DependencyFailed { .. }) => status_code::FAILED_DEPENDENCY,
            CoreError::Load(LoadError::FetchFailed { .. }) => status_code::SERVICE_UNAVAILABLE,
            CoreError::CircularDependency(_) => status_code::CONFLICT,
            CoreError::InvalidModuleName(_) => status_code::BAD_REQUEST,
            CoreError::ArtifactUnavailable { .. } => status_code::NOT_FOUND,
            CoreError::InvalidConfigValue { .. } => status_code::BAD_REQUEST,
            _ => status_code::INTERNAL_ERROR,
        }
    }

    /// 是否为“模块未注册”错误
    pub fn is_not_registered(&self) -> bool {
        matches!(self, CoreError::Load(LoadError::NotRegistered { .. }))
    }
}
