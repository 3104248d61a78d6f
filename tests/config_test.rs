//! 配置系统集成测试
//!
//! 测试配置文件加载、合并、校验以及配置对命名空间行为的影响

use chips_namespace::{
    CoreError, DependencyPolicy, LoggerConfig, Namespace, NamespaceConfig, RotationStrategy,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// 测试从 YAML 文件加载完整配置
#[tokio::test]
async fn test_load_yaml_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("namespace.yaml");
    tokio::fs::write(
        &config_path,
        r#"
logging:
  level: debug
  json_format: true
  rotation: hourly
modules:
  base_dir: /srv/app
  module_path: modules
  include_extensions: [".mjs", "wasm"]
  publish_globally: false
  dependency_policy: hard
dev_mode: true
"#,
    )
    .await
    .unwrap();

    let config = NamespaceConfig::from_file(&config_path).await.unwrap();

    assert_eq!(config.config_path, Some(config_path));
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);
    assert_eq!(config.modules.base_dir, PathBuf::from("/srv/app"));
    assert_eq!(config.modules.module_path, PathBuf::from("modules"));
    assert_eq!(config.modules.normalized_extensions(), vec!["mjs", "wasm"]);
    assert!(!config.modules.publish_globally);
    assert_eq!(config.modules.dependency_policy, DependencyPolicy::Hard);
    assert!(config.dev_mode);
    assert!(config.validate().is_ok());

    let logger_config = LoggerConfig::from_log_config(&config.logging);
    assert_eq!(logger_config.level, "debug");
    assert!(logger_config.json_format);
    assert_eq!(logger_config.rotation, RotationStrategy::Hourly);
}

/// 测试从 JSON 文件加载配置
#[tokio::test]
async fn test_load_json_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("namespace.json");
    tokio::fs::write(
        &config_path,
        r#"{ "modules": { "module_path": "plugins" } }"#,
    )
    .await
    .unwrap();

    let config = NamespaceConfig::from_file(&config_path).await.unwrap();

    assert_eq!(config.modules.module_path, PathBuf::from("plugins"));
    // 未指定的字段使用默认值
    assert_eq!(config.modules.include_extensions, vec!["mjs", "js", "ts"]);
    assert!(config.modules.publish_globally);
    assert_eq!(config.logging.level, "info");
}

/// 测试文件不存在和格式错误
#[tokio::test]
async fn test_load_config_errors() {
    let temp_dir = TempDir::new().unwrap();

    let missing = NamespaceConfig::from_file(temp_dir.path().join("missing.yaml")).await;
    assert!(matches!(missing, Err(CoreError::Io(_))));

    let broken_path = temp_dir.path().join("broken.yaml");
    tokio::fs::write(&broken_path, "modules: [not, a, map")
        .await
        .unwrap();
    let broken = NamespaceConfig::from_file(&broken_path).await;
    assert!(matches!(broken, Err(CoreError::Yaml(_))));

    let broken_json = temp_dir.path().join("broken.json");
    tokio::fs::write(&broken_json, "{").await.unwrap();
    let broken = NamespaceConfig::from_file(&broken_json).await;
    assert!(matches!(broken, Err(CoreError::Json(_))));
}

/// 测试文件配置与命令行配置的合并
#[tokio::test]
async fn test_merge_file_and_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("namespace.yaml");
    tokio::fs::write(
        &config_path,
        "modules:\n  module_path: modules\n  dependency_policy: hard\n",
    )
    .await
    .unwrap();

    let mut config = NamespaceConfig::from_file(&config_path).await.unwrap();
    config.merge(NamespaceConfig::builder().log_level("warn").dev_mode().build());

    assert_eq!(config.logging.level, "warn");
    assert!(config.dev_mode);
    assert_eq!(config.modules.module_path, PathBuf::from("modules"));
    assert_eq!(config.modules.dependency_policy, DependencyPolicy::Hard);
}

/// 测试无效配置被命名空间拒绝
#[test]
fn test_invalid_config_rejected() {
    let config = NamespaceConfig::builder()
        .include_extensions(["", "."])
        .build();

    let err = Namespace::new(config).unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidConfigValue { ref key, .. } if key == "modules.include_extensions"
    ));
    assert_eq!(err.status_code(), chips_namespace::status_code::BAD_REQUEST);

    let mut config = NamespaceConfig::default();
    config.logging.file_output = true;
    assert!(config.validate().is_err());
}

/// 测试配置中的扩展名和搜索路径决定自动注册结果，扩展名区分大小写
#[tokio::test]
async fn test_config_drives_discovery() {
    let temp_dir = TempDir::new().unwrap();
    let modules = temp_dir.path().join("plugins");
    tokio::fs::create_dir_all(modules.join("net")).await.unwrap();
    tokio::fs::write(modules.join("Http.wasm"), b"\0asm").await.unwrap();
    tokio::fs::write(modules.join("Upper.WASM"), b"\0asm").await.unwrap();
    tokio::fs::write(modules.join("net/Socket.wasm"), b"\0asm").await.unwrap();
    tokio::fs::write(modules.join("Skip.js"), "skip").await.unwrap();

    let config = NamespaceConfig::builder()
        .base_dir(temp_dir.path())
        .module_path("plugins")
        .include_extensions([".wasm"])
        .build();
    let namespace = Namespace::new(config).unwrap();

    let registered = namespace.auto_register(None).await.unwrap();

    let mut names: Vec<&String> = registered.keys().collect();
    names.sort();
    assert_eq!(names, vec!["Http", "Socket"]);
    assert_eq!(registered["Socket"].dependency(), Some("net"));
    assert_eq!(
        registered["Socket"].source_path,
        PathBuf::from("plugins/net/Socket.wasm")
    );
}
