//! 命名空间配置
//!
//! 定义日志配置、模块发现/加载配置以及从文件加载的逻辑。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::module::dependency::DependencyPolicy;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件目录
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 日志轮转策略
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_dir: None,
            json_format: false,
            rotation: default_rotation(),
        }
    }
}

/// 模块发现与加载配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// 基础目录，模块路径和构件路径都相对于它
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// 默认的模块搜索路径（相对于 `base_dir`）
    #[serde(default = "default_module_path")]
    pub module_path: PathBuf,

    /// 会被自动注册的文件扩展名
    #[serde(default = "default_include_extensions")]
    pub include_extensions: Vec<String>,

    /// 是否把已加载的模块发布到命名空间
    #[serde(default = "default_true")]
    pub publish_globally: bool,

    /// 依赖加载失败时的处理策略
    #[serde(default)]
    pub dependency_policy: DependencyPolicy,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_module_path() -> PathBuf {
    PathBuf::from("lib")
}

fn default_include_extensions() -> Vec<String> {
    vec!["mjs".to_string(), "js".to_string(), "ts".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            module_path: default_module_path(),
            include_extensions: default_include_extensions(),
            publish_globally: true,
            dependency_policy: DependencyPolicy::default(),
        }
    }
}

impl ModuleConfig {
    /// 规范化后的扩展名列表（去掉前导点，保留大小写）
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.include_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

/// 命名空间配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// 配置文件路径
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// 日志配置
    #[serde(default)]
    pub logging: LogConfig,

    /// 模块配置
    #[serde(default)]
    pub modules: ModuleConfig,

    /// 是否为开发模式
    #[serde(default)]
    pub dev_mode: bool,
}

impl NamespaceConfig {
    /// 创建配置构建器
    pub fn builder() -> NamespaceConfigBuilder {
        NamespaceConfigBuilder::new()
    }

    /// 从文件加载配置
    ///
    /// `.json` 扩展名按 JSON 解析，其余按 YAML 解析。
    pub async fn from_file(path: impl Into<PathBuf>) -> crate::utils::Result<Self> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path).await?;

        let mut config: NamespaceConfig = if path.extension().map(|e| e == "json").unwrap_or(false)
        {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.config_path = Some(path);
        Ok(config)
    }

    /// 合并另一个配置（只覆盖非默认值）
    pub fn merge(&mut self, other: NamespaceConfig) {
        if other.logging.level != default_log_level() {
            self.logging.level = other.logging.level;
        }
        if other.logging.file_output {
            self.logging.file_output = true;
            self.logging.log_dir = other.logging.log_dir;
        }
        if other.logging.json_format {
            self.logging.json_format = true;
        }
        if other.modules.base_dir != default_base_dir() {
            self.modules.base_dir = other.modules.base_dir;
        }
        if other.modules.module_path != default_module_path() {
            self.modules.module_path = other.modules.module_path;
        }
        if other.modules.include_extensions != default_include_extensions() {
            self.modules.include_extensions = other.modules.include_extensions;
        }
        if !other.modules.publish_globally {
            self.modules.publish_globally = false;
        }
        if other.modules.dependency_policy != DependencyPolicy::default() {
            self.modules.dependency_policy = other.modules.dependency_policy;
        }
        if other.dev_mode {
            self.dev_mode = true;
        }
    }

    /// 校验配置
    ///
    /// # Errors
    ///
    /// 扩展名列表为空、日志级别未知或启用文件日志却没有目录时返回
    /// [`CoreError::InvalidConfigValue`](crate::utils::CoreError::InvalidConfigValue)
    pub fn validate(&self) -> crate::utils::Result<()> {
        use crate::utils::CoreError;

        if self.modules.normalized_extensions().is_empty() {
            return Err(CoreError::InvalidConfigValue {
                key: "modules.include_extensions".to_string(),
                reason: "至少需要一个扩展名".to_string(),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error", "off"].contains(&level.as_str()) {
            return Err(CoreError::InvalidConfigValue {
                key: "logging.level".to_string(),
                reason: format!("未知的日志级别 '{}'", self.logging.level),
            });
        }

        if self.logging.file_output && self.logging.log_dir.is_none() {
            return Err(CoreError::InvalidConfigValue {
                key: "logging.log_dir".to_string(),
                reason: "启用文件日志时必须指定目录".to_string(),
            });
        }

        Ok(())
    }
}

/// 配置构建器
#[derive(Debug, Default)]
pub struct NamespaceConfigBuilder {
    config: NamespaceConfig,
}

impl NamespaceConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: NamespaceConfig::default(),
        }
    }

    /// 设置日志级别
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// 启用文件日志
    pub fn file_logging(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.config.logging.file_output = true;
        self.config.logging.log_dir = Some(log_dir.into());
        self
    }

    /// 设置基础目录
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.modules.base_dir = dir.into();
        self
    }

    /// 设置模块搜索路径
    pub fn module_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.modules.module_path = path.into();
        self
    }

    /// 设置自动注册的扩展名
    pub fn include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.modules.include_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// 设置是否发布到命名空间
    pub fn publish_globally(mut self, enable: bool) -> Self {
        self.config.modules.publish_globally = enable;
        self
    }

    /// 设置依赖失败策略
    pub fn dependency_policy(mut self, policy: DependencyPolicy) -> Self {
        self.config.modules.dependency_policy = policy;
        self
    }

    /// 启用开发模式
    pub fn dev_mode(mut self) -> Self {
        self.config.dev_mode = true;
        self
    }

    /// 构建配置
    pub fn build(self) -> NamespaceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NamespaceConfig::default();
        assert!(!config.dev_mode);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.modules.module_path, PathBuf::from("lib"));
        assert!(config.modules.publish_globally);
        assert_eq!(config.modules.dependency_policy, DependencyPolicy::Soft);
        assert_eq!(config.modules.include_extensions, vec!["mjs", "js", "ts"]);
    }

    #[test]
    fn test_config_builder() {
        let config = NamespaceConfig::builder()
            .log_level("debug")
            .base_dir("/srv/app")
            .module_path("modules")
            .include_extensions([".wasm"])
            .publish_globally(false)
            .dependency_policy(DependencyPolicy::Hard)
            .dev_mode()
            .build();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.modules.base_dir, PathBuf::from("/srv/app"));
        assert_eq!(config.modules.module_path, PathBuf::from("modules"));
        assert!(!config.modules.publish_globally);
        assert_eq!(config.modules.dependency_policy, DependencyPolicy::Hard);
        assert!(config.dev_mode);
    }

    #[test]
    fn test_normalized_extensions() {
        let config = NamespaceConfig::builder()
            .include_extensions([".MJS", "js", " .ts ", ""])
            .build();

        assert_eq!(config.modules.normalized_extensions(), vec!["MJS", "js", "ts"]);
    }

    #[test]
    fn test_config_merge() {
        let mut base = NamespaceConfig::default();
        let override_config = NamespaceConfig::builder()
            .log_level("warn")
            .module_path("plugins")
            .publish_globally(false)
            .build();

        base.merge(override_config);

        assert_eq!(base.logging.level, "warn");
        assert_eq!(base.modules.module_path, PathBuf::from("plugins"));
        assert!(!base.modules.publish_globally);
        // 未覆盖的值保持默认
        assert_eq!(base.modules.base_dir, PathBuf::from("."));
    }

    #[test]
    fn test_config_serialization() {
        let config = NamespaceConfig::builder()
            .module_path("mods")
            .dependency_policy(DependencyPolicy::Hard)
            .build();

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: NamespaceConfig = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.modules.module_path, PathBuf::from("mods"));
        assert_eq!(parsed.modules.dependency_policy, DependencyPolicy::Hard);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: NamespaceConfig = serde_yaml::from_str("modules:\n  module_path: src\n").unwrap();
        assert_eq!(parsed.modules.module_path, PathBuf::from("src"));
        assert!(parsed.modules.publish_globally);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_validate() {
        assert!(NamespaceConfig::default().validate().is_ok());

        let config = NamespaceConfig::builder().include_extensions([" . "]).build();
        assert!(config.validate().is_err());

        let config = NamespaceConfig::builder().log_level("loud").build();
        assert!(config.validate().is_err());
    }
}
