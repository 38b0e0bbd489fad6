// ==========================================
// 工作中心目标引擎 - 引擎层
// ==========================================
// 职责: 聚合 / 目标写入协议 / 对账 / 效率 / 变更轮询
// 红线: Engine 不拼 SQL，SQL 只在 Repository
// ==========================================

pub mod aggregation;
pub mod efficiency;
pub mod events;
pub mod poller;
pub mod reconciliation;
pub mod target_store;

// 重导出核心引擎
pub use aggregation::GridBuilder;
pub use efficiency::{efficiency, round2};
pub use events::{
    BroadcastGridPublisher, GridChangeEvent, GridChangeKind, GridChangePublisher,
    NoOpGridPublisher,
};
pub use poller::{ChangePoller, PollerState, SnapshotSource};
pub use reconciliation::{classify, workcenter_union, ReconciliationEngine};
pub use target_store::{apply_set_target, plan_slot_targets, KeyedLocks, SlotTargetPlan, TargetStore};
