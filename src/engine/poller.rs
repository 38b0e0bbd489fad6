// ==========================================
// 工作中心目标引擎 - 变更轮询器
// ==========================================
// 状态: Idle（等待下一拍）/ Checking（重算快照中）
// 规则:
// - 首次检查必定发布（建立基线）
// - 之后仅在快照结构性不同时发布
// - 检查失败只记录日志，下一拍照常执行
// 上一次快照仅由轮询器自身持有
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::grid::ProductionGrid;
use crate::engine::events::{GridChangeEvent, GridChangeKind, GridChangePublisher};

/// 快照来源（当前日期的实绩网格）
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<(NaiveDate, ProductionGrid)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Checking,
}

pub struct ChangePoller<S> {
    source: S,
    last: Option<ProductionGrid>,
    state: PollerState,
}

impl<S: SnapshotSource> ChangePoller<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last: None,
            state: PollerState::Idle,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// 执行一次检查
    ///
    /// 返回 Some 表示需要发布；出错时保留上一次快照
    pub async fn check_once(&mut self) -> anyhow::Result<Option<GridChangeEvent>> {
        self.state = PollerState::Checking;
        let result = self.source.snapshot().await;
        self.state = PollerState::Idle;

        let (production_date, grid) = result?;
        let kind = match &self.last {
            None => GridChangeKind::Baseline,
            Some(previous) if previous == &grid => return Ok(None),
            Some(_) => GridChangeKind::Changed,
        };

        self.last = Some(grid.clone());
        Ok(Some(GridChangeEvent {
            production_date,
            kind,
            grid,
        }))
    }

    /// 按固定间隔循环检查，直到任务被取消
    pub async fn run(mut self, period: Duration, publisher: Arc<dyn GridChangePublisher>) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(period_secs = period.as_secs(), "变更轮询器已启动");

        loop {
            ticker.tick().await;

            match self.check_once().await {
                Ok(Some(event)) => {
                    let kind = event.kind;
                    if let Err(e) = publisher.publish(event) {
                        tracing::warn!(error = %e, "网格变更发布失败");
                    } else {
                        tracing::debug!(kind = kind.as_str(), "网格变更已发布");
                    }
                }
                Ok(None) => tracing::trace!("网格无变化"),
                Err(e) => tracing::error!(error = %e, "变更检查失败，等待下一拍"),
            }
        }
    }
}
