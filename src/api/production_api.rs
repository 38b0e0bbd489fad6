// ==========================================
// 工作中心目标引擎 - 生产实绩 API
// ==========================================
// 职责: 实绩网格查询、日期/工作中心清单、变更订阅
// 说明: 每次查询都从存储重算，无缓存
// ==========================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::parse_date;
use crate::domain::grid::ProductionGrid;
use crate::engine::aggregation::GridBuilder;
use crate::engine::events::BroadcastGridPublisher;
use crate::engine::poller::SnapshotSource;
use crate::perf::PerfGuard;
use crate::repository::production_repo::ProductionRepository;

// ==========================================
// ProductionApi - 生产实绩 API
// ==========================================
pub struct ProductionApi {
    production_repo: Arc<ProductionRepository>,
    grid_builder: GridBuilder,
    publisher: Arc<BroadcastGridPublisher>,
}

impl ProductionApi {
    pub fn new(
        production_repo: Arc<ProductionRepository>,
        grid_builder: GridBuilder,
        publisher: Arc<BroadcastGridPublisher>,
    ) -> Self {
        Self {
            production_repo,
            grid_builder,
            publisher,
        }
    }

    /// 当日实绩网格（本地日期）
    pub fn get_current_grid(&self) -> ApiResult<ProductionGrid> {
        let _perf = PerfGuard::new("get_current_grid");
        self.grid_for(Local::now().date_naive())
    }

    /// 指定日期实绩网格
    ///
    /// # 参数
    /// - date: YYYY-MM-DD
    pub fn get_grid_for_date(&self, date: &str) -> ApiResult<ProductionGrid> {
        let _perf = PerfGuard::new("get_grid_for_date");
        let date = parse_date(date)?;
        self.grid_for(date)
    }

    fn grid_for(&self, date: NaiveDate) -> ApiResult<ProductionGrid> {
        let records = self.production_repo.read_production_records(date)?;
        Ok(self.grid_builder.build(&records, None))
    }

    /// 有实绩的日期（降序）
    pub fn get_available_dates(&self) -> ApiResult<Vec<NaiveDate>> {
        let _perf = PerfGuard::new("get_available_dates");
        Ok(self.production_repo.available_dates()?)
    }

    /// 全部工作中心（升序）
    pub fn get_workcenters(&self) -> ApiResult<Vec<String>> {
        let _perf = PerfGuard::new("get_workcenters");
        Ok(self.production_repo.distinct_workcenters()?)
    }

    /// 供变更轮询器使用的快照来源
    pub fn snapshot_source(&self) -> ProductionSnapshotSource {
        ProductionSnapshotSource {
            production_repo: self.production_repo.clone(),
            grid_builder: self.grid_builder.clone(),
        }
    }

    /// 订阅实绩网格变更
    ///
    /// 回调收到与 `get_current_grid` 相同形状的网格：
    /// 订阅建立后先推送一次当前网格，之后每次变更推送一次；
    /// 与上次推送内容相同的事件（例如轮询器的基线）不重复推送。
    /// 返回的句柄被 drop 或调用 `unsubscribe` 后不再回调。
    /// 必须在 tokio 运行时内调用。
    pub fn subscribe_to_changes<F>(&self, callback: F) -> ApiResult<ChangeSubscription>
    where
        F: Fn(&ProductionGrid) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ApiError::InternalError(format!("订阅需要 tokio 运行时: {}", e)))?;
        // 先订阅再读当前网格，期间发生的变更留在通道里
        let mut rx = self.publisher.subscribe();
        let source = self.snapshot_source();

        let handle = runtime.spawn(async move {
            let mut last: Option<ProductionGrid> = match source.snapshot().await {
                Ok((_, grid)) => {
                    callback(&grid);
                    Some(grid)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "订阅初始网格读取失败，等待下一次变更");
                    None
                }
            };

            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if last.as_ref() == Some(&event.grid) {
                            continue;
                        }
                        callback(&event.grid);
                        last = Some(event.grid);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "订阅者处理过慢，跳过部分变更");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("变更订阅已结束");
        });

        tracing::info!(subscribers = self.publisher.subscriber_count(), "新增变更订阅");
        Ok(ChangeSubscription { handle })
    }
}

// ==========================================
// ChangeSubscription - 订阅句柄
// ==========================================
pub struct ChangeSubscription {
    handle: JoinHandle<()>,
}

impl ChangeSubscription {
    pub fn unsubscribe(self) {
        // Drop 负责 abort
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ==========================================
// ProductionSnapshotSource - 当日实绩快照
// ==========================================
#[derive(Clone)]
pub struct ProductionSnapshotSource {
    production_repo: Arc<ProductionRepository>,
    grid_builder: GridBuilder,
}

#[async_trait]
impl SnapshotSource for ProductionSnapshotSource {
    async fn snapshot(&self) -> anyhow::Result<(NaiveDate, ProductionGrid)> {
        let repo = self.production_repo.clone();
        let builder = self.grid_builder.clone();

        // rusqlite 为同步调用，放到阻塞线程池
        tokio::task::spawn_blocking(move || -> anyhow::Result<(NaiveDate, ProductionGrid)> {
            let date = Local::now().date_naive();
            let records = repo.read_production_records(date)?;
            Ok((date, builder.build(&records, None)))
        })
        .await?
    }
}
