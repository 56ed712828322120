//! kurz - short-link redirect engine
//!
//! 请求路径只做链接解析并立即返回重定向；会话去重和点击写入在响应
//! 交给传输层之后由后台 worker 池完成。
//!
//! # Architecture
//! - `services`: 链接解析、会话去重、重定向决策（与 HTTP 框架无关）
//! - `analytics`: 记账队列、点击记录与读取
//! - `storage`: 链接目录与有序点击存储（memory / SeaORM）
//! - `cache`: 链接解析缓存（moka）
//! - `session`: 请求方会话
//! - `api`: actix-web 适配层
//! - `config` / `system` / `runtime`: 配置、日志、生命周期

pub mod analytics;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod session;
pub mod storage;
pub mod system;
pub mod utils;
