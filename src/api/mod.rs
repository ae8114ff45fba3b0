// ==========================================
// 混植群落空间规划 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供控制台/批处理前端调用
// ==========================================

pub mod error;
pub mod planner_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use planner_api::{PlanRequest, PlanRun, PlannerApi};
