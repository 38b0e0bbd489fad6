// ==========================================
// 工作中心目标引擎 - 班次目标仓储
// ==========================================
// 职责:
// - 管理 workcenter_target / workcenter_time_slot_target
// - 提供显式事务上下文 TargetTransaction（begin / commit / rollback）
// 说明:
// - 仓储不含业务逻辑：时段目标的计算在 engine::target_store 中完成
// - 写事务使用 IMMEDIATE，避免两个连接同时判定“不存在”后重复插入
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::target::{Target, TargetKey, TargetWithSlots, TimeSlotTarget};
use crate::domain::types::{Shift, SlotPosition};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction,
    TransactionBehavior,
};
use std::sync::{Arc, Mutex};

const TARGET_COLUMNS: &str = r#"
    id,
    target_date,
    workcenter,
    shift,
    plan_qty,
    hours,
    team_member_count,
    smv,
    created_by,
    created_at,
    updated_at
"#;

fn map_target(row: &Row<'_>) -> SqliteResult<Target> {
    let shift_raw: String = row.get(3)?;
    let shift = Shift::parse(&shift_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知班次: {}", shift_raw).into(),
        )
    })?;
    Ok(Target {
        id: row.get(0)?,
        target_date: row.get(1)?,
        workcenter: row.get(2)?,
        shift,
        plan_qty: row.get(4)?,
        hours: row.get(5)?,
        team_member_count: row.get(6)?,
        smv: row.get(7)?,
        created_by: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn map_time_slot_target(row: &Row<'_>) -> SqliteResult<TimeSlotTarget> {
    let raw_position: u8 = row.get(1)?;
    let position = SlotPosition::new(raw_position).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Integer,
            format!("时段位置越界: {}", raw_position).into(),
        )
    })?;
    Ok(TimeSlotTarget {
        target_id: row.get(0)?,
        position,
        time_slot: row.get(2)?,
        target_qty: row.get(3)?,
    })
}

fn query_time_slot_targets(conn: &Connection, target_id: i64) -> RepositoryResult<Vec<TimeSlotTarget>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT target_id, position, time_slot, target_qty
        FROM workcenter_time_slot_target
        WHERE target_id = ?1
        ORDER BY position
        "#,
    )?;
    let rows = stmt
        .query_map(params![target_id], map_time_slot_target)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

fn query_targets(conn: &Connection, date: NaiveDate) -> RepositoryResult<Vec<Target>> {
    let sql = format!(
        "SELECT {} FROM workcenter_target WHERE target_date = ?1 ORDER BY workcenter, shift",
        TARGET_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date], map_target)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

// ==========================================
// TargetRepository
// ==========================================

pub struct TargetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TargetRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 某日全部目标（按 工作中心, 班次 排序）
    pub fn read_targets(&self, date: NaiveDate) -> RepositoryResult<Vec<Target>> {
        let conn = self.get_conn()?;
        query_targets(&conn, date)
    }

    /// 某目标的时段明细（按位置排序）
    pub fn read_time_slot_targets(&self, target_id: i64) -> RepositoryResult<Vec<TimeSlotTarget>> {
        let conn = self.get_conn()?;
        query_time_slot_targets(&conn, target_id)
    }

    /// 某日全部目标及其时段明细（单次加锁，读到一致快照）
    pub fn read_targets_with_slots(&self, date: NaiveDate) -> RepositoryResult<Vec<TargetWithSlots>> {
        let conn = self.get_conn()?;
        let targets = query_targets(&conn, date)?;
        targets
            .into_iter()
            .map(|target| {
                let time_slot_targets = query_time_slot_targets(&conn, target.id)?;
                Ok(TargetWithSlots {
                    target,
                    time_slot_targets,
                })
            })
            .collect()
    }

    pub fn find_by_key(&self, key: &TargetKey) -> RepositoryResult<Option<Target>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM workcenter_target WHERE target_date = ?1 AND workcenter = ?2 AND shift = ?3",
            TARGET_COLUMNS
        );
        let target = conn
            .query_row(
                &sql,
                params![key.target_date, key.workcenter, key.shift.as_str()],
                map_target,
            )
            .optional()?;
        Ok(target)
    }

    /// 在一个写事务中执行 f：Ok 提交，Err 回滚并原样返回错误
    pub fn in_transaction<T>(
        &self,
        f: impl FnOnce(&TargetTransaction<'_>) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let mut conn = self.get_conn()?;
        let tx = TargetTransaction::begin(&mut conn)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(error = %rollback_err, "目标写事务回滚失败");
                }
                Err(err)
            }
        }
    }
}

// ==========================================
// TargetTransaction - 显式事务上下文
// ==========================================

/// 目标写事务
///
/// 对外可见的状态转换只有 begin / commit / rollback；
/// 未提交即被 drop 时由 rusqlite 回滚。
pub struct TargetTransaction<'c> {
    tx: Transaction<'c>,
}

impl<'c> TargetTransaction<'c> {
    pub fn begin(conn: &'c mut Connection) -> RepositoryResult<Self> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(Self { tx })
    }

    pub fn commit(self) -> RepositoryResult<()> {
        self.tx
            .commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    pub fn rollback(self) -> RepositoryResult<()> {
        self.tx
            .rollback()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    pub fn find_target_id(&self, key: &TargetKey) -> RepositoryResult<Option<i64>> {
        let id = self
            .tx
            .query_row(
                r#"
                SELECT id FROM workcenter_target
                WHERE target_date = ?1 AND workcenter = ?2 AND shift = ?3
                "#,
                params![key.target_date, key.workcenter, key.shift.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn update_target(
        &self,
        id: i64,
        plan_qty: i64,
        hours: i64,
        team_member_count: i64,
        smv: f64,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = self.tx.execute(
            r#"
            UPDATE workcenter_target
            SET plan_qty = ?2,
                hours = ?3,
                team_member_count = ?4,
                smv = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![id, plan_qty, hours, team_member_count, smv, updated_at],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WorkcenterTarget".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_target(
        &self,
        key: &TargetKey,
        plan_qty: i64,
        hours: i64,
        team_member_count: i64,
        smv: f64,
        created_by: &str,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        self.tx.execute(
            r#"
            INSERT INTO workcenter_target (
                target_date,
                workcenter,
                shift,
                plan_qty,
                hours,
                team_member_count,
                smv,
                created_by,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                key.target_date,
                key.workcenter,
                key.shift.as_str(),
                plan_qty,
                hours,
                team_member_count,
                smv,
                created_by,
                created_at,
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn delete_time_slot_targets(&self, target_id: i64) -> RepositoryResult<usize> {
        let affected = self.tx.execute(
            "DELETE FROM workcenter_time_slot_target WHERE target_id = ?1",
            params![target_id],
        )?;
        Ok(affected)
    }

    pub fn insert_time_slot_target(
        &self,
        target_id: i64,
        position: SlotPosition,
        time_slot: &str,
        target_qty: i64,
    ) -> RepositoryResult<()> {
        self.tx.execute(
            r#"
            INSERT INTO workcenter_time_slot_target (target_id, time_slot, target_qty, position)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![target_id, time_slot, target_qty, position.get()],
        )?;
        Ok(())
    }
}
