// ==========================================
// 对账与效率集成测试
// ==========================================
// 数据路径: production_summary + workcenter_target → TargetApi
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod reconciliation_test {
    use workcenter_targets::domain::{ProductionRecord, Shift, SlotPosition, SlotStatus};

    use crate::test_helpers::{day, set_target_request, setup_env, TestEnv};

    fn pos(p: u8) -> SlotPosition {
        SlotPosition::new(p).unwrap()
    }

    fn seed(env: &TestEnv) {
        let date = day(2024, 1, 1);
        let records = [
            ProductionRecord::new(date, Shift::Morning, "06:00-07:00", "WC1", 60),
            ProductionRecord::new(date, Shift::Morning, "07:00-08:00", "WC1", 50),
            ProductionRecord::new(date, Shift::Morning, "08:00-09:30", "WC1", 40),
            ProductionRecord::new(date, Shift::Morning, "Other", "WC1", 48),
            ProductionRecord::new(date, Shift::Evening, "13:30-14:00", "WC2", 10),
            // 其他日期不应出现
            ProductionRecord::new(day(2024, 1, 2), Shift::Morning, "06:00-07:00", "WC9", 999),
        ];
        for record in &records {
            env.production_repo.append_record(record).unwrap();
        }

        let mut request = set_target_request("2024-01-01", "WC1", "Morning", 480);
        request.team_member_count = Some(2);
        request.smv = Some(1.2);
        env.target_api.set_target(&request).unwrap();

        env.target_api
            .set_target(&set_target_request("2024-01-01", "WC3", "Evening", 240))
            .unwrap();
    }

    #[test]
    fn test_reconciliation_grid_shape_and_statuses() {
        let env = setup_env();
        seed(&env);

        let grid = env.target_api.get_reconciliation_for_date("2024-01-01").unwrap();
        assert_eq!(grid.workcenters, vec!["WC1", "WC2", "WC3"]);

        for shift in Shift::ALL {
            for p in SlotPosition::all() {
                assert_eq!(grid.actual_data.row(shift, p).len(), 3);
                assert_eq!(grid.target_data.row(shift, p).len(), 3);
            }
        }

        let cell = |shift, p, wc| grid.target_data.get(shift, pos(p), wc).unwrap().clone();

        // 60 / 60 → green
        assert_eq!(cell(Shift::Morning, 2, "WC1").status, SlotStatus::Green);
        // 50 / 60 → 83% yellow
        assert_eq!(cell(Shift::Morning, 3, "WC1").status, SlotStatus::Yellow);
        // 40 / 90 → red
        assert_eq!(cell(Shift::Morning, 4, "WC1").status, SlotStatus::Red);
        // Other 48 计入第 8 时段, 48 / 60 = 80% yellow
        assert_eq!(grid.actual_data.get(Shift::Morning, pos(8), "WC1"), Some(&48));
        assert_eq!(cell(Shift::Morning, 8, "WC1").status, SlotStatus::Yellow);

        // WC2 无目标 → grey
        let wc2 = cell(Shift::Evening, 1, "WC2");
        assert_eq!(wc2.status, SlotStatus::Grey);
        assert_eq!(wc2.target, 0);
        assert_eq!(wc2.efficiency, 0.0);

        // WC3 有目标无实绩 → red
        let wc3 = cell(Shift::Evening, 5, "WC3");
        assert_eq!(wc3.target, 45);
        assert_eq!(wc3.status, SlotStatus::Red);
    }

    #[test]
    fn test_reconciliation_cell_efficiency() {
        let env = setup_env();
        seed(&env);

        let grid = env.target_api.get_reconciliation_for_date("2024-01-01").unwrap();
        // 1.2 × 60 × 100 / (2 × 60) = 60
        let cell = grid.target_data.get(Shift::Morning, pos(2), "WC1").unwrap();
        assert_eq!(cell.efficiency, 60.0);
        // 1.2 × 40 × 100 / (2 × 90) = 26.666… → 26.67
        let cell = grid.target_data.get(Shift::Morning, pos(4), "WC1").unwrap();
        assert_eq!(cell.efficiency, 26.67);
        // smv 缺省为 0 → 效率 0
        let cell = grid.target_data.get(Shift::Evening, pos(1), "WC3").unwrap();
        assert_eq!(cell.efficiency, 0.0);
    }

    #[test]
    fn test_daily_efficiency_rows() {
        let env = setup_env();
        seed(&env);

        let rows = env.target_api.get_efficiency_for_date("2024-01-01").unwrap();
        assert_eq!(rows.len(), 2);

        let wc1 = &rows[0];
        assert_eq!((wc1.shift, wc1.workcenter.as_str()), (Shift::Morning, "WC1"));
        assert_eq!(wc1.total_output, 198);
        assert_eq!(wc1.total_target, Some(480));
        assert_eq!(wc1.total_work_minutes, Some(480));
        // 1.2 × 198 × 100 / (2 × 480) = 24.75
        assert_eq!(wc1.efficiency, 24.75);
        // 198 / 480 = 41.25% → 41
        assert_eq!(wc1.achievement_percentage, 41);

        let wc2 = &rows[1];
        assert_eq!((wc2.shift, wc2.workcenter.as_str()), (Shift::Evening, "WC2"));
        assert_eq!(wc2.total_target, None);
        assert_eq!(wc2.achievement_percentage, 0);
    }

    #[test]
    fn test_hourly_targets_grid() {
        let env = setup_env();
        seed(&env);

        let grid = env.target_api.get_hourly_targets_for_date("2024-01-01").unwrap();
        assert_eq!(grid.workcenters, vec!["WC1", "WC2", "WC3"]);
        assert_eq!(grid.data.get(Shift::Morning, pos(4), "WC1"), Some(&90));
        assert_eq!(grid.data.get(Shift::Evening, pos(5), "WC3"), Some(&45));
        assert_eq!(grid.data.get(Shift::Evening, pos(5), "WC2"), Some(&0));
        assert_eq!(grid.shift_total(Shift::Morning), 480);
        assert_eq!(grid.shift_total(Shift::Evening), 240);
    }

    #[test]
    fn test_empty_date_returns_empty_grids() {
        let env = setup_env();
        let grid = env.target_api.get_reconciliation_for_date("2023-12-31").unwrap();
        assert!(grid.workcenters.is_empty());
        assert!(grid.target_data.shift(Shift::Morning).iter().all(|row| row.is_empty()));
        assert!(env.target_api.get_efficiency_for_date("2023-12-31").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let env = setup_env();
        assert!(env.target_api.get_reconciliation_for_date("2024-13-01").is_err());
        assert!(env.target_api.get_efficiency_for_date("").is_err());
    }
}
