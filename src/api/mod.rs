//! API 模块
//!
//! 包含对外提供的 SDK 接口。
//!
//! # 模块概览
//!
//! - `sdk`: Namespace 主接口，组合模块发现、注册和加载
//!
//! # 示例
//!
//! ```rust,no_run
//! use chips_namespace::{Namespace, NamespaceConfig, Registration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let namespace = Namespace::new(NamespaceConfig::default())?;
//!
//!     namespace
//!         .register(Registration::new("Log", "lib/Log.mjs"))
//!         .await;
//!     let log = namespace.resolve("Log").await?;
//!     println!("{} 字节", log.len());
//!     Ok(())
//! }
//! ```

pub mod sdk;

// 重导出主要类型
pub use sdk::{Namespace, NamespaceStats};
