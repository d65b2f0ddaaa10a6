//! 节点接入网关进程：加载配置、选择存储、启动连接监管与分发任务，Ctrl-C 停机。

mod gateway;

use gateway_config::GatewayConfig;
use gateway_telemetry::{init_tracing, metrics};
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = GatewayConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 未配置数据库时使用内存存储
    let store = gateway::build_store(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let gateway::GatewayTasks {
        mut supervisor,
        dispatcher,
    } = gateway::spawn_gateway(&config, store, shutdown_rx);

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
            let _ = shutdown_tx.send(true);
            supervisor.await
        }
        outcome = &mut supervisor => outcome,
    };

    // 监管任务退出后通道关闭，分发任务处理完剩余事件再返回
    dispatcher.await?;
    info!(metrics = ?metrics().snapshot(), "gateway stopped");

    outcome??;
    Ok(())
}
