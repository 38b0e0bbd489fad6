// ==========================================
// 工作中心目标引擎 - API 层
// ==========================================
// 职责: 提供给路由/传输层调用的业务接口
// ==========================================

pub mod error;
pub mod production_api;
pub mod target_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use production_api::{ChangeSubscription, ProductionApi, ProductionSnapshotSource};
pub use target_api::TargetApi;
pub use validator::{parse_date, parse_shift, SetTargetRequest, SlotTargetRequest};
