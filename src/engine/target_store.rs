// ==========================================
// 工作中心目标引擎 - 目标写入协议
// ==========================================
// 步骤（同一事务内）:
// 1. 按唯一键查找
// 2. 存在 → 更新计划量/工时/人数/SMV/更新时间，沿用 id
// 3. 不存在 → 插入（创建人缺省为 "system"）
// 4. 删除该 id 全部时段目标，再插入 8 条
// 5. 时段目标量: 显式值原样写入；否则 round(计划量 × 时长/60 / 工时)
// 并发: 同一唯一键在进程内串行；不同键互不等待
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use tracing::instrument;

use crate::domain::target::{SetTargetInput, SetTargetOutcome, TargetKey, DEFAULT_CREATED_BY};
use crate::domain::time_slot;
use crate::domain::types::{Shift, SlotPosition};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::target_repo::{TargetRepository, TargetTransaction};

// ==========================================
// 时段目标分配
// ==========================================

/// 单个时段的目标量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTargetPlan {
    pub position: SlotPosition,
    pub time_slot: &'static str,
    pub target_qty: i64,
}

/// 按时长比例分配计划量；显式值优先
pub fn plan_slot_targets(
    shift: Shift,
    plan_qty: i64,
    hours: i64,
    overrides: &[Option<i64>; 8],
) -> Vec<SlotTargetPlan> {
    time_slot::slots(shift)
        .iter()
        .zip(SlotPosition::all())
        .map(|(def, position)| {
            let target_qty = overrides[position.index()]
                .unwrap_or_else(|| proportional_share(plan_qty, def.duration_minutes, hours));
            SlotTargetPlan {
                position,
                time_slot: def.label,
                target_qty,
            }
        })
        .collect()
}

fn proportional_share(plan_qty: i64, duration_minutes: u32, hours: i64) -> i64 {
    if hours <= 0 {
        return 0;
    }
    let share = plan_qty as f64 * (duration_minutes as f64 / 60.0) / hours as f64;
    share.round() as i64
}

// ==========================================
// KeyedLocks - 按唯一键串行化
// ==========================================

/// 唯一键粒度的进程内互斥
///
/// 条目在最后一个持有者释放后移除。
/// 注意: AppState 中所有仓储共用同一个 `Arc<Mutex<Connection>>`，
/// 不同键的写入最终仍在连接锁上串行；这里只保证同键的读改写不交错。
#[derive(Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<TargetKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_map(&self) -> RepositoryResult<std::sync::MutexGuard<HashMap<TargetKey, Arc<Mutex<()>>>>> {
        self.slots
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn with_lock<T>(
        &self,
        key: &TargetKey,
        f: impl FnOnce() -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let slot = {
            let mut map = self.lock_map()?;
            map.entry(key.clone()).or_default().clone()
        };

        let result = {
            let _guard = slot
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            f()
        };

        let mut map = self.lock_map()?;
        // map + 本地 clone = 2，说明没有其他等待者
        if Arc::strong_count(&slot) == 2 {
            map.remove(key);
        }
        result
    }

    /// 当前持有/等待中的键数量
    pub fn active_keys(&self) -> usize {
        self.lock_map().map(|m| m.len()).unwrap_or(0)
    }
}

// ==========================================
// TargetStore - 目标写入服务
// ==========================================
pub struct TargetStore {
    repo: Arc<TargetRepository>,
    locks: KeyedLocks,
    default_created_by: String,
}

impl TargetStore {
    pub fn new(repo: Arc<TargetRepository>) -> Self {
        Self {
            repo,
            locks: KeyedLocks::new(),
            default_created_by: DEFAULT_CREATED_BY.to_string(),
        }
    }

    pub fn with_default_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.default_created_by = created_by.into();
        self
    }

    pub fn repository(&self) -> &Arc<TargetRepository> {
        &self.repo
    }

    /// 设定（新增或更新）目标并重建 8 条时段目标
    pub fn set_target(&self, input: &SetTargetInput) -> RepositoryResult<SetTargetOutcome> {
        self.set_target_at(input, Local::now().naive_local())
    }

    #[instrument(
        skip(self, input, now),
        fields(
            date = %input.key.target_date,
            workcenter = %input.key.workcenter,
            shift = %input.key.shift
        )
    )]
    pub fn set_target_at(
        &self,
        input: &SetTargetInput,
        now: NaiveDateTime,
    ) -> RepositoryResult<SetTargetOutcome> {
        let outcome = self.locks.with_lock(&input.key, || {
            self.repo
                .in_transaction(|tx| apply_set_target(tx, input, &self.default_created_by, now))
        });

        match &outcome {
            Ok(o) => tracing::info!(id = o.id, was_updated = o.was_updated, "目标已写入"),
            Err(e) => tracing::error!(error = %e, "目标写入失败，已回滚"),
        }
        outcome
    }
}

/// 在给定事务内执行写入协议（提交/回滚由调用方负责）
pub fn apply_set_target(
    tx: &TargetTransaction<'_>,
    input: &SetTargetInput,
    default_created_by: &str,
    now: NaiveDateTime,
) -> RepositoryResult<SetTargetOutcome> {
    let (id, was_updated) = match tx.find_target_id(&input.key)? {
        Some(id) => {
            tx.update_target(
                id,
                input.plan_qty,
                input.hours,
                input.team_member_count,
                input.smv,
                now,
            )?;
            (id, true)
        }
        None => {
            let created_by = input
                .created_by
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default_created_by);
            let id = tx.insert_target(
                &input.key,
                input.plan_qty,
                input.hours,
                input.team_member_count,
                input.smv,
                created_by,
                now,
            )?;
            (id, false)
        }
    };

    let removed = tx.delete_time_slot_targets(id)?;
    tracing::debug!(target_id = id, removed, "旧时段目标已删除");

    for plan in plan_slot_targets(input.key.shift, input.plan_qty, input.hours, &input.slot_overrides) {
        tx.insert_time_slot_target(id, plan.position, plan.time_slot, plan.target_qty)?;
    }

    Ok(SetTargetOutcome::new(id, was_updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn qtys(plans: &[SlotTargetPlan]) -> Vec<i64> {
        plans.iter().map(|p| p.target_qty).collect()
    }

    #[test]
    fn test_proportional_allocation_follows_slot_widths() {
        let plans = plan_slot_targets(Shift::Morning, 480, 8, &[None; 8]);
        assert_eq!(qtys(&plans), vec![30, 60, 60, 90, 60, 60, 60, 60]);
        assert_eq!(plans[0].time_slot, "05:30-06:00");
    }

    #[test]
    fn test_evening_ninety_minute_slot_is_fifth() {
        let plans = plan_slot_targets(Shift::Evening, 480, 8, &[None; 8]);
        assert_eq!(qtys(&plans), vec![30, 60, 60, 60, 90, 60, 60, 60]);
    }

    #[test]
    fn test_override_is_used_verbatim() {
        let mut overrides = [None; 8];
        overrides[2] = Some(7);
        let plans = plan_slot_targets(Shift::Morning, 480, 8, &overrides);
        assert_eq!(qtys(&plans), vec![30, 60, 7, 90, 60, 60, 60, 60]);
    }

    #[test]
    fn test_rounding() {
        // 100 × 0.5 / 8 = 6.25 → 6；100 × 1.5 / 8 = 18.75 → 19
        let plans = plan_slot_targets(Shift::Morning, 100, 8, &[None; 8]);
        assert_eq!(plans[0].target_qty, 6);
        assert_eq!(plans[3].target_qty, 19);
    }

    #[test]
    fn test_keyed_locks_release_entries() {
        let locks = KeyedLocks::new();
        let key = TargetKey::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "WC1", Shift::Morning);
        let value = locks.with_lock(&key, || Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(locks.active_keys(), 0);
    }

    #[test]
    fn test_keyed_locks_distinct_keys_held_together() {
        use std::sync::Barrier;
        use std::thread;

        let locks = Arc::new(KeyedLocks::new());
        let barrier = Arc::new(Barrier::new(2));
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        // 两个线程都在持锁期间等待对方，键之间若共用一把锁则无法通过屏障
        let handles: Vec<_> = [Shift::Morning, Shift::Evening]
            .into_iter()
            .map(|shift| {
                let locks = locks.clone();
                let barrier = barrier.clone();
                let key = TargetKey::new(date, "WC1", shift);
                thread::spawn(move || {
                    locks
                        .with_lock(&key, || {
                            barrier.wait();
                            Ok(shift)
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(locks.active_keys(), 0);
    }
}
