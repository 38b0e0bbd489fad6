// ==========================================
// 工作中心目标引擎 - 实绩聚合网格
// ==========================================
// 职责: 稀疏生产记录 → 每班 8 时段 × 工作中心 的稠密网格
// 规则:
// - 班次/时段/工作中心缺失的记录静默丢弃
// - 同一单元格累加，不覆盖
// - "Other" 时段累加进第 8 时段
// - 其余无法映射的时段丢弃
// ==========================================

use std::collections::BTreeSet;

use tracing::instrument;

use crate::domain::grid::ProductionGrid;
use crate::domain::production::ProductionRecord;
use crate::domain::time_slot::{self, OTHER_SLOT_LABEL};
use crate::domain::types::SlotPosition;

// ==========================================
// GridBuilder - 实绩网格构建器
// ==========================================
#[derive(Debug, Clone)]
pub struct GridBuilder {
    /// "Other" 时段数据是否输出数据质量告警
    warn_on_other_slot: bool,
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GridBuilder {
    pub fn new() -> Self {
        Self {
            warn_on_other_slot: true,
        }
    }

    pub fn with_other_slot_warning(mut self, enabled: bool) -> Self {
        self.warn_on_other_slot = enabled;
        self
    }

    /// 构建实绩网格
    ///
    /// `workcenters` 为 None 时取输入中出现过的工作中心（升序去重）；
    /// 传入时与输入中出现的工作中心合并，保证网格键都在清单内。
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn build(&self, records: &[ProductionRecord], workcenters: Option<&[String]>) -> ProductionGrid {
        let workcenters = merge_workcenters(records, workcenters);
        let mut grid = ProductionGrid::zeroed(workcenters);

        let mut dropped = 0usize;
        for record in records {
            let Some((shift, label, workcenter)) = record.complete_key() else {
                dropped += 1;
                continue;
            };

            let position = if label == OTHER_SLOT_LABEL {
                if self.warn_on_other_slot {
                    tracing::warn!(
                        target: "data_quality",
                        workcenter,
                        shift = %shift,
                        quantity = record.quantity,
                        "Other 时段数据计入第 8 时段"
                    );
                }
                SlotPosition::last()
            } else {
                match SlotPosition::new(time_slot::position(label, shift)) {
                    Some(position) => position,
                    None => {
                        tracing::debug!(workcenter, shift = %shift, time_slot = label, "未映射时段，丢弃");
                        dropped += 1;
                        continue;
                    }
                }
            };

            *grid
                .data
                .row_mut(shift, position)
                .entry(workcenter.to_string())
                .or_insert(0) += record.quantity;
        }

        if dropped > 0 {
            tracing::debug!(dropped, "聚合时丢弃不完整/未映射记录");
        }
        grid
    }
}

/// 合并显式传入与记录中出现的工作中心（升序去重）
fn merge_workcenters(records: &[ProductionRecord], supplied: Option<&[String]>) -> Vec<String> {
    let mut set: BTreeSet<String> = supplied
        .map(|wcs| wcs.iter().cloned().collect())
        .unwrap_or_default();
    set.extend(
        records
            .iter()
            .filter_map(|r| r.workcenter.as_deref())
            .filter(|wc| !wc.is_empty())
            .map(str::to_string),
    );
    set.into_iter().collect()
}
