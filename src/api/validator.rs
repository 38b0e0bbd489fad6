// ==========================================
// 工作中心目标引擎 - 请求校验
// ==========================================
// 职责: 原始请求 → 强类型输入
// 红线: 校验失败必须发生在任何存储访问之前
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::target::{
    SetTargetInput, TargetKey, DEFAULT_HOURS, DEFAULT_TEAM_MEMBER_COUNT,
};
use crate::domain::types::{Shift, SlotPosition};

/// 日期格式: YYYY-MM-DD
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("日期不能为空".to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ApiError::InvalidInput(format!("日期格式错误(需要 YYYY-MM-DD): {}", raw)))
}

pub fn parse_shift(raw: &str) -> ApiResult<Shift> {
    raw.parse::<Shift>().map_err(ApiError::InvalidInput)
}

// ==========================================
// SetTargetRequest - 设定目标请求
// ==========================================

/// 单个时段的显式目标量（缺省或非整数时按比例计算）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTargetRequest {
    #[serde(default, deserialize_with = "lenient_qty")]
    pub target_qty: Option<i64>,
}

impl SlotTargetRequest {
    pub fn qty(target_qty: i64) -> Self {
        Self {
            target_qty: Some(target_qty),
        }
    }
}

/// 整数值（含 12.0 这类整值小数）→ Some，其余一律视为未提供
fn integer_of(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn lenient_qty<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(integer_of(&value))
}

/// 时段列表: 非数组视为未提供；null 或非对象的条目视为该位置未提供
fn lenient_slots<'de, D>(deserializer: D) -> Result<Option<Vec<Option<SlotTargetRequest>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let slots = items
        .iter()
        .map(|item| match item {
            Value::Object(fields) => Some(SlotTargetRequest {
                target_qty: fields.get("targetQty").and_then(integer_of),
            }),
            _ => None,
        })
        .collect();
    Ok(Some(slots))
}

/// 设定目标原始请求
///
/// 字段与前端提交的 JSON 一致（camelCase）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTargetRequest {
    pub target_date: String,
    pub workcenter: String,
    pub shift: String,
    pub plan_qty: i64,
    #[serde(default)]
    pub hours: Option<i64>,
    #[serde(default)]
    pub team_member_count: Option<i64>,
    #[serde(default)]
    pub smv: Option<f64>,
    #[serde(default)]
    pub created_by: Option<String>,
    /// 按位置排列，下标 0 对应第 1 时段
    #[serde(default, deserialize_with = "lenient_slots")]
    pub time_slot_targets: Option<Vec<Option<SlotTargetRequest>>>,
}

impl SetTargetRequest {
    /// 校验并转换为写入输入
    pub fn validate(&self) -> ApiResult<SetTargetInput> {
        let target_date = parse_date(&self.target_date)?;
        let shift = parse_shift(&self.shift)?;

        let workcenter = self.workcenter.trim();
        if workcenter.is_empty() {
            return Err(ApiError::InvalidInput("工作中心不能为空".to_string()));
        }
        if self.plan_qty < 0 {
            return Err(ApiError::InvalidInput(format!("计划量不能为负: {}", self.plan_qty)));
        }

        let hours = self.hours.unwrap_or(DEFAULT_HOURS);
        if hours <= 0 {
            return Err(ApiError::InvalidInput(format!("工时必须大于 0: {}", hours)));
        }

        let team_member_count = self.team_member_count.unwrap_or(DEFAULT_TEAM_MEMBER_COUNT);
        if team_member_count < 0 {
            return Err(ApiError::InvalidInput(format!(
                "班组人数不能为负: {}",
                team_member_count
            )));
        }

        let smv = self.smv.unwrap_or(0.0);
        if !smv.is_finite() || smv < 0.0 {
            return Err(ApiError::InvalidInput(format!("SMV 无效: {}", smv)));
        }

        let mut slot_overrides = [None; 8];
        if let Some(slots) = &self.time_slot_targets {
            if slots.len() > SlotPosition::MAX as usize {
                return Err(ApiError::InvalidInput(format!(
                    "时段目标最多 {} 条，实际 {} 条",
                    SlotPosition::MAX,
                    slots.len()
                )));
            }
            for (i, slot) in slots.iter().enumerate() {
                let target_qty = slot.as_ref().and_then(|s| s.target_qty);
                if let Some(qty) = target_qty {
                    if qty < 0 {
                        return Err(ApiError::InvalidInput(format!(
                            "第 {} 时段目标量不能为负: {}",
                            i + 1,
                            qty
                        )));
                    }
                }
                slot_overrides[i] = target_qty;
            }
        }

        Ok(SetTargetInput {
            key: TargetKey::new(target_date, workcenter, shift),
            plan_qty: self.plan_qty,
            hours,
            team_member_count,
            smv,
            created_by: self.created_by.clone(),
            slot_overrides,
        })
    }
}
