// ==========================================
// 工作中心目标引擎 - 时段映射表 (TimeSlotMap)
// ==========================================
// 早班 05:30-13:30 / 晚班 13:30-21:30，各 8 个时段，合计 480 分钟
// 时段宽度不均匀: 30 / 90 / 其余 60
// ==========================================

use crate::domain::types::{Shift, SlotPosition};

/// 无法归入固定时段的数据标签，统一计入第 8 时段
pub const OTHER_SLOT_LABEL: &str = "Other";

/// 单班总分钟数
pub const SHIFT_MINUTES: u32 = 480;

/// 时段定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlotDef {
    pub label: &'static str,
    pub position: u8,
    pub duration_minutes: u32,
}

const fn slot(label: &'static str, position: u8, duration_minutes: u32) -> TimeSlotDef {
    TimeSlotDef {
        label,
        position,
        duration_minutes,
    }
}

const MORNING_SLOTS: [TimeSlotDef; 8] = [
    slot("05:30-06:00", 1, 30),
    slot("06:00-07:00", 2, 60),
    slot("07:00-08:00", 3, 60),
    slot("08:00-09:30", 4, 90),
    slot("09:30-10:30", 5, 60),
    slot("10:30-11:30", 6, 60),
    slot("11:30-12:30", 7, 60),
    slot("12:30-13:30", 8, 60),
];

const EVENING_SLOTS: [TimeSlotDef; 8] = [
    slot("13:30-14:00", 1, 30),
    slot("14:00-15:00", 2, 60),
    slot("15:00-16:00", 3, 60),
    slot("16:00-17:00", 4, 60),
    slot("17:00-18:30", 5, 90),
    slot("18:30-19:30", 6, 60),
    slot("19:30-20:30", 7, 60),
    slot("20:30-21:30", 8, 60),
];

/// 班次的有序时段表
pub fn slots(shift: Shift) -> &'static [TimeSlotDef; 8] {
    match shift {
        Shift::Morning => &MORNING_SLOTS,
        Shift::Evening => &EVENING_SLOTS,
    }
}

/// 按标签查找时段定义
pub fn lookup(time_slot: &str, shift: Shift) -> Option<&'static TimeSlotDef> {
    slots(shift).iter().find(|def| def.label == time_slot)
}

/// 标签 → 位置 (1..=8)；未知标签返回 0（调用方按“未映射”处理，不是错误）
pub fn position(time_slot: &str, shift: Shift) -> u8 {
    lookup(time_slot, shift).map(|def| def.position).unwrap_or(0)
}

/// 标签 → 时长（分钟）
pub fn duration(time_slot: &str, shift: Shift) -> Option<u32> {
    lookup(time_slot, shift).map(|def| def.duration_minutes)
}

/// 位置 → 时段定义
pub fn slot_at(shift: Shift, position: SlotPosition) -> &'static TimeSlotDef {
    &slots(shift)[position.index()]
}

/// 位置 → 时段标签
pub fn label_at(shift: Shift, position: SlotPosition) -> &'static str {
    slot_at(shift, position).label
}
