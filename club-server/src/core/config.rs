use std::net::SocketAddr;
use std::path::PathBuf;

/// 默认管理员 PIN (与客户端一致)
pub const DEFAULT_ADMIN_PIN: &str = "190894";

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_HOST | 127.0.0.1 | 监听地址 |
/// | HTTP_PORT | 8888 | HTTP 服务端口 |
/// | WORK_DIR | ./data | 工作目录 (数据库文件) |
/// | ADMIN_PIN | 190894 | 推送整份文档所需的管理员 PIN |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (存在时按天滚动写文件) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/club HTTP_PORT=9000 cargo run -p club-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_host: String,
    pub http_port: u16,
    /// 工作目录，存放 redb 数据库
    pub work_dir: String,
    pub admin_pin: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置，未设置时使用默认值
    pub fn from_env() -> Self {
        Self {
            http_host: std::env::var("HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8888),
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            admin_pin: std::env::var("ADMIN_PIN")
                .ok()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_ADMIN_PIN.into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("club.redb")
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.http_host, self.http_port).parse()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
