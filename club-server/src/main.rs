use anyhow::Context;
use club_server::{Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    let config = setup_environment();
    tracing::info!("Club server starting...");

    // 2. 加载共享文档
    let state = ServerState::initialize(&config)
        .with_context(|| format!("failed to open store in {}", config.work_dir))?;

    // 3. 启动 HTTP 服务器
    Server::new(config, state).run().await?;
    Ok(())
}
