//! 运行模式
//!
//! - server: HTTP 重定向服务（默认）
//! - cli: 读取点击记录等离线命令

pub mod cli;
#[cfg(feature = "server")]
pub mod server;

pub use cli::run_cli;
#[cfg(feature = "server")]
pub use server::run_server;
