//! Chips Namespace 命令行入口
//!
//! 模块命名空间的命令行工具，用于扫描、加载和诊断模块目录。
//!
//! # 命令概览
//!
//! - `scan` - 扫描模块目录并列出注册结果
//! - `load` - 扫描并加载全部模块
//! - `check-config` - 验证配置文件
//! - `version` - 显示版本信息
//!
//! # 使用示例
//!
//! ```bash
//! # 扫描默认目录 (./lib)
//! chips-namespace scan
//!
//! # 指定基础目录和搜索路径加载
//! chips-namespace load --base ./app --path modules
//!
//! # 使用自定义配置文件
//! chips-namespace -c namespace.yaml load
//!
//! # 检查配置文件
//! chips-namespace check-config -c namespace.yaml
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use chips_namespace::{
    Logger, LoggerConfig, LogGuard, Namespace, NamespaceConfig, Registration,
};

/// Chips Namespace - 模块命名空间
///
/// 扫描模块目录，按依赖顺序加载模块。
#[derive(Parser)]
#[command(name = "chips-namespace")]
#[command(version, about = "按依赖顺序加载模块的命名空间工具", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "namespace.yaml", global = true)]
    config: PathBuf,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// 开发模式（显示文件名和行号）
    #[arg(long, global = true)]
    dev: bool,

    /// 子命令
    #[command(subcommand)]
    command: Option<Commands>,
}

/// 可用的子命令
#[derive(Subcommand)]
enum Commands {
    /// 扫描模块目录
    ///
    /// 注册找到的所有模块并列出模块名、构件路径和依赖。
    Scan {
        /// 搜索路径（相对于基础目录）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 基础目录
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 扫描并加载全部模块
    ///
    /// 单个模块失败不会导致命令失败，失败的模块会列在输出中。
    Load {
        /// 搜索路径（相对于基础目录）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 基础目录
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 验证配置文件
    ///
    /// 检查配置文件是否有效，并显示解析后的配置内容。
    CheckConfig {
        /// 配置文件路径（不指定则使用全局 -c 选项）
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 查看版本信息
    Version,
}

/// 初始化日志系统
fn init_logging(config: &NamespaceConfig, level: Option<&str>, dev_mode: bool) -> LogGuard {
    let mut logger_config = LoggerConfig::from_log_config(&config.logging);
    if let Some(level) = level {
        logger_config.level = level.to_string();
    }
    if dev_mode {
        logger_config.show_file_line = true;
        if level.is_none() {
            logger_config.level = "debug".to_string();
        }
    }
    Logger::try_init(logger_config)
}

/// 加载配置文件
async fn load_config(
    config_path: &Path,
    dev_mode: bool,
) -> Result<NamespaceConfig, Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        NamespaceConfig::from_file(config_path).await?
    } else {
        NamespaceConfig::default()
    };
    if dev_mode {
        config.dev_mode = true;
    }
    Ok(config)
}

/// 应用命令行上的目录覆盖
fn apply_overrides(config: &mut NamespaceConfig, path: Option<PathBuf>, base: Option<PathBuf>) {
    if let Some(base) = base {
        config.modules.base_dir = base;
    }
    if let Some(path) = path {
        config.modules.module_path = path;
    }
}

fn sorted(registered: impl IntoIterator<Item = Registration>) -> Vec<Registration> {
    let mut registrations: Vec<Registration> = registered.into_iter().collect();
    registrations.sort_by(|a, b| a.name.cmp(&b.name));
    registrations
}

/// 扫描模块目录
async fn run_scan(config: NamespaceConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let namespace = Namespace::new(config)?;
    let registered = sorted(namespace.auto_register(None).await?.into_values());

    if json {
        println!("{}", serde_json::to_string_pretty(&registered)?);
        return Ok(());
    }

    println!();
    println!("已注册模块 ({})", registered.len());
    println!("═══════════════════════════════════════");
    for reg in &registered {
        match reg.dependency() {
            Some(dep) => println!("  {:<24} {}  (依赖 {})", reg.name, reg.source_path.display(), dep),
            None => println!("  {:<24} {}", reg.name, reg.source_path.display()),
        }
    }
    println!("═══════════════════════════════════════");
    println!();
    Ok(())
}

/// 扫描并加载全部模块
async fn run_load(config: NamespaceConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let namespace = Namespace::new(config)?;
    namespace.auto_register(None).await?;

    if let Err(e) = namespace.load_order().await {
        warn!(error = %e, "依赖关系中存在环");
    }

    let loaded = namespace.auto_load().await;
    let failed = namespace.failed().await;

    let mut loaded_names: Vec<&String> = loaded.keys().collect();
    loaded_names.sort();
    let mut failed_entries: Vec<(&String, &String)> =
        failed.iter().map(|(name, record)| (name, &record.reason)).collect();
    failed_entries.sort();

    if json {
        let output = serde_json::json!({
            "stats": namespace.stats().await,
            "loaded": loaded_names,
            "failed": failed_entries
                .iter()
                .map(|(name, reason)| serde_json::json!({ "name": name, "reason": reason }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("已加载模块 ({})", loaded_names.len());
    println!("═══════════════════════════════════════");
    for name in &loaded_names {
        let handle = &loaded[*name];
        println!("  ✅ {:<24} {} 字节", name, handle.len());
    }
    if !failed_entries.is_empty() {
        println!();
        println!("加载失败 ({})", failed_entries.len());
        println!("───────────────────────────────────────");
        for (name, reason) in &failed_entries {
            println!("  ❌ {:<24} {}", name, reason);
        }
    }
    println!("═══════════════════════════════════════");
    println!();
    Ok(())
}

/// 检查配置文件
async fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("检查配置文件: {}", path.display());
    println!();

    let config = if path.exists() {
        NamespaceConfig::from_file(path).await?
    } else {
        println!("⚠️  警告: 配置文件不存在，将使用默认配置");
        println!();
        NamespaceConfig::default()
    };

    if let Err(e) = config.validate() {
        println!("❌ 配置文件无效: {}", e);
        return Err(Box::new(e));
    }

    println!("✅ 配置有效！");
    println!();
    println!("配置内容:");
    println!("────────────────────────────────────────");
    println!("  [日志配置]");
    println!("    日志级别:       {}", config.logging.level);
    println!("    文件输出:       {}", if config.logging.file_output { "是" } else { "否" });
    println!("    JSON 格式:      {}", if config.logging.json_format { "是" } else { "否" });
    println!();
    println!("  [模块配置]");
    println!("    基础目录:       {}", config.modules.base_dir.display());
    println!("    搜索路径:       {}", config.modules.module_path.display());
    println!("    扩展名:         {}", config.modules.normalized_extensions().join(", "));
    println!("    全局发布:       {}", if config.modules.publish_globally { "是" } else { "否" });
    println!("    依赖失败策略:   {:?}", config.modules.dependency_policy);
    println!("────────────────────────────────────────");
    Ok(())
}

/// 打印版本信息
fn print_version() {
    println!();
    println!("Chips Namespace - 模块命名空间");
    println!("═══════════════════════════════════════");
    println!("  版本:             {}", chips_namespace::VERSION);
    println!();
    println!("构建信息:");
    println!("  目标平台:         {}", std::env::consts::ARCH);
    println!("  操作系统:         {}", std::env::consts::OS);
    println!("═══════════════════════════════════════");
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            print_version();
        }

        Some(Commands::CheckConfig { config }) => {
            let config_path = config.unwrap_or(cli.config);
            check_config(&config_path).await?;
        }

        Some(Commands::Scan { path, base, json }) => {
            let mut config = load_config(&cli.config, cli.dev).await?;
            apply_overrides(&mut config, path, base);
            let _guard = init_logging(&config, cli.log_level.as_deref(), cli.dev);
            run_scan(config, json).await?;
        }

        Some(Commands::Load { path, base, json }) => {
            let mut config = load_config(&cli.config, cli.dev).await?;
            apply_overrides(&mut config, path, base);
            let _guard = init_logging(&config, cli.log_level.as_deref(), cli.dev);
            run_load(config, json).await?;
        }
        // 默认命令：加载
        None => {
            let config = load_config(&cli.config, cli.dev).await?;
            let _guard = init_logging(&config, cli.log_level.as_deref(), cli.dev);
            run_load(config, false).await?;
        }
    }

    Ok(())
}
