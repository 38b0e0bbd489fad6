// ==========================================
// 工作中心目标引擎 - 目标与对账 API
// ==========================================
// 职责:
// - 设定目标（校验 → 事务写入）
// - 目标 / 时段目标查询
// - 实绩 vs 目标 对账、日汇总效率
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::validator::{parse_date, SetTargetRequest};
use crate::domain::grid::{DailyEfficiencyRow, HourlyTargetGrid, ReconciliationGrid};
use crate::domain::target::{SetTargetOutcome, TargetWithSlots};
use crate::engine::reconciliation::{workcenter_union, ReconciliationEngine};
use crate::engine::target_store::TargetStore;
use crate::perf::PerfGuard;
use crate::repository::production_repo::ProductionRepository;
use crate::repository::target_repo::TargetRepository;

// ==========================================
// TargetApi - 目标与对账 API
// ==========================================
pub struct TargetApi {
    target_store: Arc<TargetStore>,
    target_repo: Arc<TargetRepository>,
    production_repo: Arc<ProductionRepository>,
    engine: ReconciliationEngine,
}

impl TargetApi {
    pub fn new(
        target_store: Arc<TargetStore>,
        production_repo: Arc<ProductionRepository>,
        engine: ReconciliationEngine,
    ) -> Self {
        let target_repo = target_store.repository().clone();
        Self {
            target_store,
            target_repo,
            production_repo,
            engine,
        }
    }

    /// 设定（新增或更新）班次目标
    ///
    /// # 返回
    /// - Ok(SetTargetOutcome): id / 是否为更新 / 提示信息
    /// - Err(ApiError::InvalidInput): 校验失败，未访问存储
    /// - Err(其他): 写入失败，已整体回滚
    pub fn set_target(&self, request: &SetTargetRequest) -> ApiResult<SetTargetOutcome> {
        let _perf = PerfGuard::new("set_target");
        let input = request.validate()?;
        Ok(self.target_store.set_target(&input)?)
    }

    /// 某日全部目标（含 8 条时段明细）
    pub fn get_targets_for_date(&self, date: &str) -> ApiResult<Vec<TargetWithSlots>> {
        let _perf = PerfGuard::new("get_targets_for_date");
        let date = parse_date(date)?;
        Ok(self.target_repo.read_targets_with_slots(date)?)
    }

    /// 某日时段目标量网格
    pub fn get_hourly_targets_for_date(&self, date: &str) -> ApiResult<HourlyTargetGrid> {
        let _perf = PerfGuard::new("get_hourly_targets_for_date");
        let date = parse_date(date)?;

        let targets = self.target_repo.read_targets_with_slots(date)?;
        let records = self.production_repo.read_production_records(date)?;
        let plain: Vec<_> = targets.iter().map(|t| t.target.clone()).collect();
        let workcenters = workcenter_union(&records, &plain);

        Ok(self.engine.hourly_targets(&targets, workcenters))
    }

    /// 某日 实绩 vs 目标 对账网格
    pub fn get_reconciliation_for_date(&self, date: &str) -> ApiResult<ReconciliationGrid> {
        let _perf = PerfGuard::new("get_reconciliation_for_date");
        let date = parse_date(date)?;

        let records = self.production_repo.read_production_records(date)?;
        let targets = self.target_repo.read_targets_with_slots(date)?;

        Ok(self.engine.reconcile(date, &records, &targets))
    }

    /// 某日 班次×工作中心 汇总效率
    pub fn get_efficiency_for_date(&self, date: &str) -> ApiResult<Vec<DailyEfficiencyRow>> {
        let _perf = PerfGuard::new("get_efficiency_for_date");
        let date = parse_date(date)?;

        let records = self.production_repo.read_production_records(date)?;
        let targets = self.target_repo.read_targets(date)?;

        Ok(self.engine.daily_efficiency(date, &records, &targets))
    }
}
