// ==========================================
// 工作中心目标引擎 - 核心库
// ==========================================
// 职责: 生产实绩聚合 / 班次目标写入 / 实绩目标对账 / 效率计算 / 变更推送
// 技术栈: Rust + SQLite + tokio
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与启动
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    DailyEfficiencyRow, HourlyTargetGrid, ProductionGrid, ProductionRecord, ReconciliationGrid,
    SetTargetInput, SetTargetOutcome, Shift, SlotPosition, SlotStatus, Target, TargetCell,
    TargetKey, TargetWithSlots, TimeSlotTarget,
};

pub use engine::{ChangePoller, GridBuilder, ReconciliationEngine, TargetStore};

pub use api::{ApiError, ApiResult, ProductionApi, SetTargetRequest, TargetApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工作中心目标引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
