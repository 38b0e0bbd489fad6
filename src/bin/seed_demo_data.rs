use chrono::{Datelike, Duration, Local, NaiveDate};
use std::error::Error;
use std::sync::Arc;

use workcenter_targets::api::{SetTargetRequest, SlotTargetRequest, TargetApi};
use workcenter_targets::app::get_default_db_path;
use workcenter_targets::domain::time_slot;
use workcenter_targets::domain::{ProductionRecord, Shift};
use workcenter_targets::engine::{ReconciliationEngine, TargetStore};
use workcenter_targets::logging;
use workcenter_targets::repository::{ProductionRepository, TargetRepository};

const WORKCENTERS: [&str; 3] = ["CUT-01", "SEW-A", "SEW-B"];
const HISTORY_DAYS: i64 = 3;

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    let today = Local::now().date_naive();

    let production_repo = Arc::new(ProductionRepository::new(&db_path)?);
    let target_repo = Arc::new(TargetRepository::new(&db_path)?);
    let target_api = TargetApi::new(
        Arc::new(TargetStore::new(target_repo)),
        production_repo.clone(),
        ReconciliationEngine::default(),
    );

    for offset in 0..HISTORY_DAYS {
        let date = today - Duration::days(offset);
        let inserted = seed_production(&production_repo, date)?;
        let targets = seed_targets(&target_api, date)?;
        eprintln!("{}: 生产记录 {} 条, 目标 {} 条", date, inserted, targets);
    }

    eprintln!("演示数据已写入 {}", db_path);
    Ok(())
}

fn seed_production(repo: &ProductionRepository, date: NaiveDate) -> Result<usize, Box<dyn Error>> {
    let mut count = 0;
    for (w, workcenter) in WORKCENTERS.iter().enumerate() {
        for shift in Shift::ALL {
            for (i, slot) in time_slot::slots(shift).iter().enumerate() {
                // 产量随工作中心/时段变化，约为计划节奏的 70%~110%
                let base = slot.duration_minutes as i64;
                let factor = 70 + ((w * 13 + i * 7 + date.day() as usize) % 41) as i64;
                let qty = base * factor / 100;
                repo.append_record(&ProductionRecord::new(date, shift, slot.label, *workcenter, qty))?;
                count += 1;
            }
            // 少量无法归属时段的数据
            repo.append_record(&ProductionRecord::new(
                date,
                shift,
                time_slot::OTHER_SLOT_LABEL,
                *workcenter,
                5,
            ))?;
            count += 1;
        }
    }
    Ok(count)
}

fn seed_targets(api: &TargetApi, date: NaiveDate) -> Result<usize, Box<dyn Error>> {
    let mut count = 0;
    // 最后一个工作中心不设目标，对账网格中显示为 grey
    for workcenter in &WORKCENTERS[..WORKCENTERS.len() - 1] {
        for shift in Shift::ALL {
            let mut slots: Vec<Option<SlotTargetRequest>> = vec![None; 8];
            if shift == Shift::Evening {
                slots[7] = Some(SlotTargetRequest::qty(40));
            }
            let request = SetTargetRequest {
                target_date: date.format("%Y-%m-%d").to_string(),
                workcenter: workcenter.to_string(),
                shift: shift.as_str().to_string(),
                plan_qty: 480,
                hours: Some(8),
                team_member_count: Some(4),
                smv: Some(3.5),
                created_by: Some("seed".to_string()),
                time_slot_targets: Some(slots),
            };
            api.set_target(&request)?;
            count += 1;
        }
    }
    Ok(count)
}
