// ==========================================
// 工作中心目标引擎 - 应用层
// ==========================================
// 职责: 组装与启动
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
