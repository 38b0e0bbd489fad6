// ==========================================
// 工作中心目标引擎 - 主入口
// ==========================================
// 启动: 日志 → AppState → 变更轮询器 → 等待 Ctrl-C
// ==========================================

use anyhow::{anyhow, Context};
use workcenter_targets::app::{get_default_db_path, AppState};
use workcenter_targets::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", workcenter_targets::APP_NAME);
    tracing::info!("系统版本: {}", workcenter_targets::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    // 推送摘要日志
    let _subscription = app_state
        .production_api
        .subscribe_to_changes(|grid| {
            let total: i64 = workcenter_targets::Shift::ALL
                .iter()
                .map(|shift| grid.shift_total(*shift))
                .sum();
            tracing::info!(
                workcenters = grid.workcenters.len(),
                total,
                "实绩网格已更新"
            );
        })
        .context("注册变更订阅失败")?;

    let poller = app_state.start_change_poller();

    tokio::signal::ctrl_c().await.context("等待 Ctrl-C 失败")?;
    tracing::info!("收到退出信号，停止轮询器");
    poller.abort();

    Ok(())
}
