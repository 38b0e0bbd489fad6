// ==========================================
// 工作中心目标引擎 - 输出网格结构
// ==========================================
// 形状: { workcenters, data|actualData|targetData: { Morning: [8], Evening: [8] } }
// 每个时段对象以工作中心为键
// ==========================================

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::{Shift, SlotPosition, SlotStatus};

/// 单个时段：工作中心 → 值
pub type SlotRow<T> = BTreeMap<String, T>;

/// 两个班次 × 8 个时段的稠密网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftGrid<T> {
    #[serde(rename = "Morning")]
    pub morning: [SlotRow<T>; 8],
    #[serde(rename = "Evening")]
    pub evening: [SlotRow<T>; 8],
}

impl<T> ShiftGrid<T> {
    /// 按工作中心集合初始化所有单元格
    pub fn filled(workcenters: &[String], init: impl Fn() -> T) -> Self {
        let row = || -> SlotRow<T> {
            workcenters
                .iter()
                .map(|wc| (wc.clone(), init()))
                .collect()
        };
        Self {
            morning: std::array::from_fn(|_| row()),
            evening: std::array::from_fn(|_| row()),
        }
    }

    pub fn shift(&self, shift: Shift) -> &[SlotRow<T>; 8] {
        match shift {
            Shift::Morning => &self.morning,
            Shift::Evening => &self.evening,
        }
    }

    pub fn shift_mut(&mut self, shift: Shift) -> &mut [SlotRow<T>; 8] {
        match shift {
            Shift::Morning => &mut self.morning,
            Shift::Evening => &mut self.evening,
        }
    }

    pub fn row(&self, shift: Shift, position: SlotPosition) -> &SlotRow<T> {
        &self.shift(shift)[position.index()]
    }

    pub fn row_mut(&mut self, shift: Shift, position: SlotPosition) -> &mut SlotRow<T> {
        &mut self.shift_mut(shift)[position.index()]
    }

    pub fn get(&self, shift: Shift, position: SlotPosition, workcenter: &str) -> Option<&T> {
        self.row(shift, position).get(workcenter)
    }
}

/// 数量网格（生产实绩 / 时段目标量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityGrid {
    pub workcenters: Vec<String>,
    pub data: ShiftGrid<i64>,
}

/// 生产实绩网格
pub type ProductionGrid = QuantityGrid;

/// 时段目标量网格
pub type HourlyTargetGrid = QuantityGrid;

impl QuantityGrid {
    pub fn zeroed(workcenters: Vec<String>) -> Self {
        let data = ShiftGrid::filled(&workcenters, || 0);
        Self { workcenters, data }
    }

    /// 某班次所有单元格之和
    pub fn shift_total(&self, shift: Shift) -> i64 {
        self.data
            .shift(shift)
            .iter()
            .flat_map(|row| row.values())
            .sum()
    }
}

/// 对账单元格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TargetCell {
    pub target: i64,
    pub efficiency: f64,
    pub status: SlotStatus,
}

/// 实绩 vs 目标 对账网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationGrid {
    pub workcenters: Vec<String>,
    pub actual_data: ShiftGrid<i64>,
    pub target_data: ShiftGrid<TargetCell>,
}

/// 日汇总效率（班次×工作中心）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEfficiencyRow {
    pub production_date: NaiveDate,
    pub shift: Shift,
    pub workcenter: String,
    pub total_output: i64,
    /// 无目标时为 None
    pub total_target: Option<i64>,
    pub smv: Option<f64>,
    pub team_member_count: Option<i64>,
    pub total_work_minutes: Option<i64>,
    pub efficiency: f64,
    pub achievement_percentage: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_grid_is_dense() {
        let wcs = vec!["WC1".to_string(), "WC2".to_string()];
        let grid = QuantityGrid::zeroed(wcs);
        for shift in Shift::ALL {
            assert_eq!(grid.data.shift(shift).len(), 8);
            for row in grid.data.shift(shift) {
                assert_eq!(row.len(), 2);
                assert!(row.values().all(|v| *v == 0));
            }
        }
    }

    #[test]
    fn test_grid_json_shape() {
        let grid = QuantityGrid::zeroed(vec!["WC1".to_string()]);
        let value = serde_json::to_value(&grid).unwrap();
        assert_eq!(value["workcenters"][0], "WC1");
        assert_eq!(value["data"]["Morning"].as_array().unwrap().len(), 8);
        assert_eq!(value["data"]["Evening"][7]["WC1"], 0);
    }

    #[test]
    fn test_reconciliation_json_keys() {
        let wcs = vec!["WC1".to_string()];
        let grid = ReconciliationGrid {
            workcenters: wcs.clone(),
            actual_data: ShiftGrid::filled(&wcs, || 0),
            target_data: ShiftGrid::filled(&wcs, TargetCell::default),
        };
        let value = serde_json::to_value(&grid).unwrap();
        assert!(value.get("actualData").is_some());
        assert_eq!(value["targetData"]["Morning"][0]["WC1"]["status"], "grey");
    }
}
