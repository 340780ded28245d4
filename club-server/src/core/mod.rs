//! 核心模块 - 配置、状态、持久化与 HTTP 服务器
//!
//! - [`Config`] - 服务器配置
//! - [`ServerState`] - 共享文档状态
//! - [`DocumentStore`] - redb 持久化
//! - [`Server`] - HTTP 服务器

pub mod config;
pub mod server;
pub mod state;
pub mod store;

pub use config::Config;
pub use server::{Server, build_app, serve};
pub use state::ServerState;
pub use store::{DocumentStore, StoreError, StoreResult};
