// ==========================================
// 工作中心目标引擎 - 生产记录
// ==========================================
// 对引擎只读；字段允许缺失，聚合时丢弃不完整记录
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::Shift;

/// 生产汇总记录（按 日期×班次×时段×工作中心×子工序 汇总）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub production_date: NaiveDate,
    /// 存储中的非法班次值读取为 None
    pub shift: Option<Shift>,
    pub time_slot: Option<String>,
    pub workcenter: Option<String>,
    pub sub_operation_id: Option<String>,
    pub quantity: i64,
}

impl ProductionRecord {
    /// 完整记录构造（测试与演示数据使用）
    pub fn new(
        production_date: NaiveDate,
        shift: Shift,
        time_slot: &str,
        workcenter: &str,
        quantity: i64,
    ) -> Self {
        Self {
            production_date,
            shift: Some(shift),
            time_slot: Some(time_slot.to_string()),
            workcenter: Some(workcenter.to_string()),
            sub_operation_id: None,
            quantity,
        }
    }

    /// 班次/时段/工作中心齐全时返回三元组
    pub fn complete_key(&self) -> Option<(Shift, &str, &str)> {
        let shift = self.shift?;
        let time_slot = self.time_slot.as_deref().filter(|s| !s.is_empty())?;
        let workcenter = self.workcenter.as_deref().filter(|s| !s.is_empty())?;
        Some((shift, time_slot, workcenter))
    }
}
