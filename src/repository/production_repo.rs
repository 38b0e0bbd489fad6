// ==========================================
// 工作中心目标引擎 - 生产实绩仓储
// ==========================================
// 职责:
// - 读取 production_summary（按 日期×班次×时段×子工序×工作中心 汇总）
// - 提供日期 / 工作中心清单
// 说明:
// - 对引擎只读；append_record 仅用于演示数据与测试夹具
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::production::ProductionRecord;
use crate::domain::types::Shift;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct ProductionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRepository {
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

    fn map_record(row: &Row<'_>) -> SqliteResult<ProductionRecord> {
        let shift: Option<String> = row.get(1)?;
        Ok(ProductionRecord {
            production_date: row.get(0)?,
            shift: shift.as_deref().and_then(Shift::parse),
            time_slot: row.get(2)?,
            workcenter: row.get(3)?,
            sub_operation_id: row.get(4)?,
            quantity: row.get(5)?,
        })
    }

    /// 读取某日生产记录（已按明细维度 SUM）
    pub fn read_production_records(&self, date: NaiveDate) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                production_date,
                shift,
                time_slot,
                workcenter,
                sub_operation_id,
                COALESCE(SUM(total_qty), 0) AS total_quantity
            FROM production_summary
            WHERE production_date = ?1
            GROUP BY production_date, shift, time_slot, sub_operation_id, workcenter
            ORDER BY shift, time_slot
            "#,
        )?;

        let rows = stmt
            .query_map(params![date], Self::map_record)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 有生产数据的日期（倒序）
    pub fn available_dates(&self) -> RepositoryResult<Vec<NaiveDate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT production_date FROM production_summary ORDER BY production_date DESC",
        )?;
        let rows = stmt
            .query_map([], |row| row.get::<_, NaiveDate>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 全部出现过的工作中心（升序）
    pub fn distinct_workcenters(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT workcenter
            FROM production_summary
            WHERE workcenter IS NOT NULL AND workcenter <> ''
            ORDER BY workcenter
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 追加一条生产汇总记录，返回行 ID
    pub fn append_record(&self, record: &ProductionRecord) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_summary (
                production_date,
                shift,
                time_slot,
                workcenter,
                sub_operation_id,
                total_qty
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.production_date,
                record.shift.map(|s| s.as_str()),
                record.time_slot,
                record.workcenter,
                record.sub_operation_id,
                record.quantity,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
