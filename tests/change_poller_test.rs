// ==========================================
// 变更轮询与订阅集成测试
// ==========================================
// 数据路径: production_summary → ChangePoller → 广播 → 订阅回调
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod change_poller_test {
    use std::time::Duration;

    use chrono::Local;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use workcenter_targets::domain::{ProductionGrid, ProductionRecord, Shift, SlotPosition};
    use workcenter_targets::engine::{ChangePoller, GridChangeKind, GridChangePublisher, SnapshotSource};

    use crate::test_helpers::setup_env;

    const WAIT: Duration = Duration::from_secs(5);

    fn pos(p: u8) -> SlotPosition {
        SlotPosition::new(p).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_source_reads_today() {
        let env = setup_env();
        let today = Local::now().date_naive();
        env.production_repo
            .append_record(&ProductionRecord::new(today, Shift::Morning, "09:30-10:30", "WC1", 21))
            .unwrap();

        let (date, grid) = env.production_api.snapshot_source().snapshot().await.unwrap();
        assert_eq!(date, today);
        assert_eq!(grid.data.get(Shift::Morning, pos(5), "WC1"), Some(&21));
    }

    #[tokio::test]
    async fn test_poller_check_once_against_database() {
        let env = setup_env();
        let today = Local::now().date_naive();
        let mut poller = ChangePoller::new(env.production_api.snapshot_source());

        let baseline = poller.check_once().await.unwrap().unwrap();
        assert_eq!(baseline.kind, GridChangeKind::Baseline);
        assert!(baseline.grid.workcenters.is_empty());

        assert!(poller.check_once().await.unwrap().is_none());

        env.production_repo
            .append_record(&ProductionRecord::new(today, Shift::Evening, "15:00-16:00", "WC2", 4))
            .unwrap();
        let changed = poller.check_once().await.unwrap().unwrap();
        assert_eq!(changed.kind, GridChangeKind::Changed);
        assert_eq!(changed.grid.data.get(Shift::Evening, pos(3), "WC2"), Some(&4));
    }

    #[tokio::test]
    async fn test_subscriber_receives_baseline_and_changes() {
        let env = setup_env();
        let today = Local::now().date_naive();
        env.production_repo
            .append_record(&ProductionRecord::new(today, Shift::Morning, "06:00-07:00", "WC1", 10))
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel::<ProductionGrid>();
        let subscription = env
            .production_api
            .subscribe_to_changes(move |grid| {
                let _ = tx.send(grid.clone());
            })
            .unwrap();
        assert!(subscription.is_active());

        let poller = ChangePoller::new(env.production_api.snapshot_source());
        let handle = tokio::spawn(poller.run(Duration::from_millis(50), env.publisher.clone()));

        // 订阅时推送的当前网格；轮询器基线内容相同，不再重复推送
        let baseline = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(baseline, env.production_api.get_current_grid().unwrap());
        assert_eq!(baseline.data.get(Shift::Morning, pos(2), "WC1"), Some(&10));

        env.production_repo
            .append_record(&ProductionRecord::new(today, Shift::Morning, "06:00-07:00", "WC1", 5))
            .unwrap();
        let changed = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(changed.data.get(Shift::Morning, pos(2), "WC1"), Some(&15));

        // 取消订阅后回调任务结束，发送端随之释放
        subscription.unsubscribe();
        let closed = timeout(WAIT, rx.recv()).await.unwrap();
        assert!(closed.is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn test_late_subscriber_receives_current_grid_once() {
        let env = setup_env();
        let today = Local::now().date_naive();
        env.production_repo
            .append_record(&ProductionRecord::new(today, Shift::Morning, "06:00-07:00", "WC1", 8))
            .unwrap();

        // 基线在订阅之前已经发布
        let mut poller = ChangePoller::new(env.production_api.snapshot_source());
        let baseline = poller.check_once().await.unwrap().unwrap();
        assert_eq!(env.publisher.publish(baseline).unwrap(), 0);

        let (tx, mut rx) = mpsc::unbounded_channel::<ProductionGrid>();
        let _subscription = env
            .production_api
            .subscribe_to_changes(move |grid| {
                let _ = tx.send(grid.clone());
            })
            .unwrap();

        let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.data.get(Shift::Morning, pos(2), "WC1"), Some(&8));

        // 数据未变化的轮询不产生回调
        for _ in 0..3 {
            assert!(poller.check_once().await.unwrap().is_none());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());

        env.production_repo
            .append_record(&ProductionRecord::new(today, Shift::Morning, "06:00-07:00", "WC1", 2))
            .unwrap();
        let changed = poller.check_once().await.unwrap().unwrap();
        assert_eq!(env.publisher.publish(changed).unwrap(), 1);

        let next = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(next.data.get(Shift::Morning, pos(2), "WC1"), Some(&10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
