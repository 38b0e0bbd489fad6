// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、组装好的 API 实例、常用请求构造
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use workcenter_targets::api::{ProductionApi, SetTargetRequest, TargetApi};
use workcenter_targets::db::{init_schema, open_sqlite_connection};
use workcenter_targets::engine::{BroadcastGridPublisher, GridBuilder, ReconciliationEngine, TargetStore};
use workcenter_targets::repository::{ProductionRepository, TargetRepository};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn set_target_request(date: &str, workcenter: &str, shift: &str, plan_qty: i64) -> SetTargetRequest {
    SetTargetRequest {
        target_date: date.to_string(),
        workcenter: workcenter.to_string(),
        shift: shift.to_string(),
        plan_qty,
        hours: Some(8),
        team_member_count: None,
        smv: None,
        created_by: None,
        time_slot_targets: None,
    }
}

/// 组装好的测试环境（共享一个连接）
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub production_repo: Arc<ProductionRepository>,
    pub target_repo: Arc<TargetRepository>,
    pub target_store: Arc<TargetStore>,
    pub publisher: Arc<BroadcastGridPublisher>,
    pub production_api: Arc<ProductionApi>,
    pub target_api: Arc<TargetApi>,
}

pub fn setup_env() -> TestEnv {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));

    let production_repo = Arc::new(ProductionRepository::from_connection(conn.clone()));
    let target_repo = Arc::new(TargetRepository::from_connection(conn.clone()));
    let target_store = Arc::new(TargetStore::new(target_repo.clone()));
    let publisher = Arc::new(BroadcastGridPublisher::new(16));

    let production_api = Arc::new(ProductionApi::new(
        production_repo.clone(),
        GridBuilder::new(),
        publisher.clone(),
    ));
    let target_api = Arc::new(TargetApi::new(
        target_store.clone(),
        production_repo.clone(),
        ReconciliationEngine::default(),
    ));

    TestEnv {
        _temp_file: temp_file,
        db_path,
        conn,
        production_repo,
        target_repo,
        target_store,
        publisher,
        production_api,
        target_api,
    }
}

/// 统计某表行数
pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    let conn = conn.lock().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}
