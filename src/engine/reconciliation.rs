// ==========================================
// 工作中心目标引擎 - 实绩/目标对账
// ==========================================
// 输入: 某日生产记录 + 某日目标（含时段明细）
// 输出:
// - 对账网格: 全组合 {2 班 × 8 时段} × {当日出现过的工作中心}
//   每格 {target, efficiency, status}
// - 日汇总效率: 班次 × 工作中心
// 说明: 纯计算，不访问存储
// ==========================================

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::instrument;

use crate::domain::grid::{
    DailyEfficiencyRow, HourlyTargetGrid, QuantityGrid, ReconciliationGrid, ShiftGrid, TargetCell,
};
use crate::domain::production::ProductionRecord;
use crate::domain::target::{Target, TargetWithSlots};
use crate::domain::time_slot;
use crate::domain::types::{Shift, SlotPosition, SlotStatus};
use crate::engine::aggregation::GridBuilder;
use crate::engine::efficiency::{efficiency, round2};

/// 黄灯下限：实绩 ≥ 目标 × 80%
const YELLOW_NUMERATOR: i64 = 8;
const YELLOW_DENOMINATOR: i64 = 10;

/// 单元格达成状态
///
/// 目标缺失或为 0 → grey；≥ 目标 → green；≥ 80% → yellow；其余 red
pub fn classify(actual: i64, target: Option<i64>) -> SlotStatus {
    match target {
        None | Some(0) => SlotStatus::Grey,
        Some(target) if actual >= target => SlotStatus::Green,
        // 整数比较，避免 target × 0.8 的浮点误差
        Some(target) if actual * YELLOW_DENOMINATOR >= target * YELLOW_NUMERATOR => SlotStatus::Yellow,
        Some(_) => SlotStatus::Red,
    }
}

/// 生产与目标中出现过的工作中心（升序去重）
pub fn workcenter_union(records: &[ProductionRecord], targets: &[Target]) -> Vec<String> {
    let set: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.workcenter.as_deref())
        .filter(|wc| !wc.is_empty())
        .map(str::to_string)
        .chain(targets.iter().map(|t| t.workcenter.clone()))
        .collect();
    set.into_iter().collect()
}

/// 目标对应的人数/SMV 均有效时计算时段效率
fn slot_efficiency(target: &Target, actual: i64, duration_minutes: u32) -> f64 {
    match (target.team_member_count, target.smv) {
        (Some(team), Some(smv)) if team > 0 && smv > 0.0 => round2(efficiency(
            Some(actual as f64),
            Some(smv),
            team,
            duration_minutes as f64,
        )),
        _ => 0.0,
    }
}

// ==========================================
// ReconciliationEngine - 对账引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    grid_builder: GridBuilder,
}

impl ReconciliationEngine {
    pub fn new(grid_builder: GridBuilder) -> Self {
        Self { grid_builder }
    }

    pub fn grid_builder(&self) -> &GridBuilder {
        &self.grid_builder
    }

    /// 实绩 vs 目标 对账网格
    #[instrument(skip_all, fields(date = %date, records = records.len(), targets = targets.len()))]
    pub fn reconcile(
        &self,
        date: NaiveDate,
        records: &[ProductionRecord],
        targets: &[TargetWithSlots],
    ) -> ReconciliationGrid {
        let plain_targets: Vec<Target> = targets.iter().map(|t| t.target.clone()).collect();
        let workcenters = workcenter_union(records, &plain_targets);

        let actual = self.grid_builder.build(records, Some(&workcenters));
        let workcenters = actual.workcenters;
        let actual_data = actual.data;
        let mut target_data = ShiftGrid::filled(&workcenters, TargetCell::default);

        for owned in targets {
            let target = &owned.target;
            for position in SlotPosition::all() {
                let duration = time_slot::slot_at(target.shift, position).duration_minutes;
                let actual_qty = actual_data
                    .get(target.shift, position, &target.workcenter)
                    .copied()
                    .unwrap_or(0);
                let target_qty = owned.slot_target(position).map(|s| s.target_qty);

                target_data.row_mut(target.shift, position).insert(
                    target.workcenter.clone(),
                    TargetCell {
                        target: target_qty.unwrap_or(0),
                        efficiency: slot_efficiency(target, actual_qty, duration),
                        status: classify(actual_qty, target_qty),
                    },
                );
            }
        }

        ReconciliationGrid {
            workcenters,
            actual_data,
            target_data,
        }
    }

    /// 时段目标量网格（无目标的单元格为 0）
    pub fn hourly_targets(&self, targets: &[TargetWithSlots], workcenters: Vec<String>) -> HourlyTargetGrid {
        let mut grid = QuantityGrid::zeroed(workcenters);
        for owned in targets {
            for slot in &owned.time_slot_targets {
                grid.data
                    .row_mut(owned.target.shift, slot.position)
                    .insert(owned.target.workcenter.clone(), slot.target_qty);
            }
        }
        grid
    }

    /// 日汇总效率
    ///
    /// 仅输出有实绩的 班次×工作中心；工作分钟 = 工时 × 60
    ///
    /// 行序按班次枚举顺序（Morning 在前），再按工作中心；
    /// 不是班次名称的字典序（字典序会让 Evening 排在前面）
    #[instrument(skip_all, fields(date = %date, records = records.len()))]
    pub fn daily_efficiency(
        &self,
        date: NaiveDate,
        records: &[ProductionRecord],
        targets: &[Target],
    ) -> Vec<DailyEfficiencyRow> {
        let mut totals: BTreeMap<(Shift, String), i64> = BTreeMap::new();
        for record in records {
            let (Some(shift), Some(workcenter)) = (record.shift, record.workcenter.as_deref()) else {
                continue;
            };
            if workcenter.is_empty() {
                continue;
            }
            *totals.entry((shift, workcenter.to_string())).or_insert(0) += record.quantity;
        }

        let by_key: HashMap<(Shift, &str), &Target> = targets
            .iter()
            .map(|t| ((t.shift, t.workcenter.as_str()), t))
            .collect();

        totals
            .into_iter()
            .map(|((shift, workcenter), total_output)| {
                let target = by_key.get(&(shift, workcenter.as_str())).copied();
                let total_target = target.map(|t| t.plan_qty);
                let smv = target.and_then(|t| t.smv);
                let team_member_count = target.and_then(|t| t.team_member_count);
                let total_work_minutes = target.map(|t| t.hours * 60);

                let efficiency = round2(efficiency(
                    Some(total_output as f64),
                    smv,
                    team_member_count.unwrap_or(0),
                    total_work_minutes.unwrap_or(0) as f64,
                ));
                let achievement_percentage = match total_target {
                    Some(t) if t > 0 => (100.0 * total_output as f64 / t as f64).round() as i64,
                    _ => 0,
                };

                DailyEfficiencyRow {
                    production_date: date,
                    shift,
                    workcenter,
                    total_output,
                    total_target,
                    smv,
                    team_member_count,
                    total_work_minutes,
                    efficiency,
                    achievement_percentage,
                }
            })
            .collect()
    }
}
