// ==========================================
// 工作中心目标引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、时段常量表
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod grid;
pub mod production;
pub mod target;
pub mod time_slot;
pub mod types;

// 重导出核心类型
pub use grid::{
    DailyEfficiencyRow, HourlyTargetGrid, ProductionGrid, QuantityGrid, ReconciliationGrid,
    ShiftGrid, SlotRow, TargetCell,
};
pub use production::ProductionRecord;
pub use target::{
    SetTargetInput, SetTargetOutcome, Target, TargetKey, TargetWithSlots, TimeSlotTarget,
};
pub use time_slot::{TimeSlotDef, OTHER_SLOT_LABEL};
pub use types::{Shift, SlotPosition, SlotStatus};
