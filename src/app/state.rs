// ==========================================
// 工作中心目标引擎 - 应用状态
// ==========================================
// 职责: 组装仓储 / 引擎 / API 实例与共享资源
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::{ProductionApi, TargetApi};
use crate::config::{ConfigManager, EngineSettings};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{
    BroadcastGridPublisher, ChangePoller, GridBuilder, GridChangePublisher, ReconciliationEngine,
    TargetStore,
};
use crate::repository::{ProductionRepository, TargetRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "WORKCENTER_TARGETS_DB_PATH";

const DB_FILE_NAME: &str = "workcenter_targets.db";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 启动时读取的引擎配置
    pub settings: EngineSettings,

    pub config_manager: Arc<ConfigManager>,

    /// 生产实绩API
    pub production_api: Arc<ProductionApi>,

    /// 目标与对账API
    pub target_api: Arc<TargetApi>,

    /// 网格变更广播
    pub publisher: Arc<BroadcastGridPublisher>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 所有仓储共享同一个 SQLite 连接（SQLite 单写者）
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let settings = config_manager
            .load_settings()
            .map_err(|e| format!("读取配置失败: {}", e))?;
        tracing::info!(?settings, "引擎配置已加载");

        // ==========================================
        // Repository / Engine
        // ==========================================
        let production_repo = Arc::new(ProductionRepository::from_connection(conn.clone()));
        let target_repo = Arc::new(TargetRepository::from_connection(conn));

        let grid_builder = GridBuilder::new().with_other_slot_warning(settings.warn_on_other_slot);
        let target_store = Arc::new(
            TargetStore::new(target_repo).with_default_created_by(settings.default_created_by.clone()),
        );
        let publisher = Arc::new(BroadcastGridPublisher::new(settings.broadcast_capacity));

        // ==========================================
        // API
        // ==========================================
        let production_api = Arc::new(ProductionApi::new(
            production_repo.clone(),
            grid_builder.clone(),
            publisher.clone(),
        ));
        let target_api = Arc::new(TargetApi::new(
            target_store,
            production_repo,
            ReconciliationEngine::new(grid_builder),
        ));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            settings,
            config_manager,
            production_api,
            target_api,
            publisher,
        })
    }

    /// 在当前 tokio 运行时上启动变更轮询器
    pub fn start_change_poller(&self) -> JoinHandle<()> {
        self.start_change_poller_every(Duration::from_secs(self.settings.poll_interval_secs))
    }

    pub fn start_change_poller_every(&self, period: Duration) -> JoinHandle<()> {
        let poller = ChangePoller::new(self.production_api.snapshot_source());
        let publisher: Arc<dyn GridChangePublisher> = self.publisher.clone();
        tokio::spawn(poller.run(period, publisher))
    }
}

/// 默认数据库路径
///
/// 优先环境变量，其次用户数据目录，最后当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(".").join(DB_FILE_NAME);

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("workcenter-targets-dev");
        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("workcenter-targets");

        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join(DB_FILE_NAME),
            Err(e) => tracing::warn!(error = %e, "无法创建数据目录，使用当前目录"),
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
