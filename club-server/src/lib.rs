//! Club Server - 会员俱乐部共享文档服务
//!
//! 唯一的权威数据源：保存整份共享文档，接受管理员的整份推送，
//! 并对会员操作 (预订、取消、答题) 做最终裁决。
//!
//! ```text
//! club-server/src/
//! ├── core/          # 配置、状态、持久化、HTTP 服务器
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod core;
pub mod utils;

pub use core::{Config, DocumentStore, Server, ServerState, build_app, serve};
pub use utils::{AppError, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// 加载 .env、读取配置、初始化日志
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    config
}
