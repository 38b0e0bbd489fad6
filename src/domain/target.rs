// ==========================================
// 工作中心目标引擎 - 班次目标与时段目标
// ==========================================
// 唯一键: (target_date, workcenter, shift)
// 不变量: 每个 Target 在任意一次成功写入后恰好拥有 8 条时段目标
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Shift, SlotPosition};

/// 未指定创建人时写入的默认值
pub const DEFAULT_CREATED_BY: &str = "system";

/// 默认班次工时
pub const DEFAULT_HOURS: i64 = 8;

/// 默认班组人数
pub const DEFAULT_TEAM_MEMBER_COUNT: i64 = 1;

/// 目标唯一键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetKey {
    pub target_date: NaiveDate,
    pub workcenter: String,
    pub shift: Shift,
}

impl TargetKey {
    pub fn new(target_date: NaiveDate, workcenter: impl Into<String>, shift: Shift) -> Self {
        Self {
            target_date,
            workcenter: workcenter.into(),
            shift,
        }
    }
}

/// 班次目标
///
/// `team_member_count` / `smv` 在历史数据中可能为空，读取后按缺失处理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub target_date: NaiveDate,
    pub workcenter: String,
    pub shift: Shift,
    pub plan_qty: i64,
    pub hours: i64,
    pub team_member_count: Option<i64>,
    pub smv: Option<f64>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Target {
    pub fn key(&self) -> TargetKey {
        TargetKey::new(self.target_date, self.workcenter.clone(), self.shift)
    }
}

/// 时段目标（归属唯一的 Target）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotTarget {
    pub target_id: i64,
    pub position: SlotPosition,
    pub time_slot: String,
    pub target_qty: i64,
}

/// 目标及其时段明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetWithSlots {
    #[serde(flatten)]
    pub target: Target,
    pub time_slot_targets: Vec<TimeSlotTarget>,
}

impl TargetWithSlots {
    pub fn slot_target(&self, position: SlotPosition) -> Option<&TimeSlotTarget> {
        self.time_slot_targets.iter().find(|s| s.position == position)
    }
}

/// 已校验的设定目标输入
///
/// `slot_overrides[i]` 对应第 i+1 时段；Some 时原样写入，None 时按时长比例计算
#[derive(Debug, Clone, PartialEq)]
pub struct SetTargetInput {
    pub key: TargetKey,
    pub plan_qty: i64,
    pub hours: i64,
    pub team_member_count: i64,
    pub smv: f64,
    pub created_by: Option<String>,
    pub slot_overrides: [Option<i64>; 8],
}

/// 设定目标结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTargetOutcome {
    pub id: i64,
    pub was_updated: bool,
    pub message: String,
}

impl SetTargetOutcome {
    pub fn new(id: i64, was_updated: bool) -> Self {
        let message = if was_updated {
            "Target updated successfully"
        } else {
            "Target created successfully"
        };
        Self {
            id,
            was_updated,
            message: message.to_string(),
        }
    }
}
