// ==========================================
// 工作中心目标引擎 - 网格变更事件发布
// ==========================================
// 职责: 定义网格变更发布 trait，轮询器只依赖 trait
// 实现:
// - BroadcastGridPublisher: tokio broadcast 通道，多订阅者
// - NoOpGridPublisher: 单元测试/无订阅场景
// ==========================================

use std::error::Error;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::grid::ProductionGrid;

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridChangeKind {
    /// 首次检查，建立基线
    Baseline,
    /// 与上次发布结果存在差异
    Changed,
}

impl GridChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridChangeKind::Baseline => "Baseline",
            GridChangeKind::Changed => "Changed",
        }
    }
}

/// 网格变更事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridChangeEvent {
    pub production_date: NaiveDate,
    pub kind: GridChangeKind,
    pub grid: ProductionGrid,
}

/// 网格变更发布者
pub trait GridChangePublisher: Send + Sync {
    /// 发布事件，返回收到事件的订阅者数量
    fn publish(&self, event: GridChangeEvent) -> Result<usize, Box<dyn Error + Send + Sync>>;
}

/// 空操作发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpGridPublisher;

impl GridChangePublisher for NoOpGridPublisher {
    fn publish(&self, event: GridChangeEvent) -> Result<usize, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            date = %event.production_date,
            kind = event.kind.as_str(),
            "NoOpGridPublisher: 跳过事件发布"
        );
        Ok(0)
    }
}

// ==========================================
// BroadcastGridPublisher - 广播发布者
// ==========================================
#[derive(Debug, Clone)]
pub struct BroadcastGridPublisher {
    tx: broadcast::Sender<GridChangeEvent>,
}

impl BroadcastGridPublisher {
    /// `capacity`: 每个订阅者可缓冲的事件数
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        tracing::info!(capacity, "网格变更广播通道已初始化");
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl GridChangePublisher for BroadcastGridPublisher {
    fn publish(&self, event: GridChangeEvent) -> Result<usize, Box<dyn Error + Send + Sync>> {
        // 无订阅者不算失败
        match self.tx.send(event) {
            Ok(count) => {
                tracing::debug!(subscribers = count, "网格变更已广播");
                Ok(count)
            }
            Err(_) => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: GridChangeKind) -> GridChangeEvent {
        GridChangeEvent {
            production_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            kind,
            grid: ProductionGrid::zeroed(vec!["WC1".to_string()]),
        }
    }

    #[test]
    fn test_noop_publisher() {
        let result = NoOpGridPublisher.publish(event(GridChangeKind::Baseline));
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let publisher = BroadcastGridPublisher::new(4);
        assert_eq!(publisher.subscriber_count(), 0);
        assert_eq!(publisher.publish(event(GridChangeKind::Changed)).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let publisher = BroadcastGridPublisher::new(4);
        let mut a = publisher.subscribe();
        let mut b = publisher.subscribe();

        assert_eq!(publisher.publish(event(GridChangeKind::Baseline)).unwrap(), 2);
        assert_eq!(a.recv().await.unwrap().kind, GridChangeKind::Baseline);
        assert_eq!(b.recv().await.unwrap().kind, GridChangeKind::Baseline);

        drop(b);
        assert_eq!(publisher.subscriber_count(), 1);
    }
}
