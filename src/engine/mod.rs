// ==========================================
// 混植群落空间规划 - 引擎层
// ==========================================
// 职责: 群落构建会话 + 空间计算规则
// 红线: Engine 不拼 SQL, 目录通过 SpeciesCatalog 句柄注入
// ==========================================

pub mod group_session;
pub mod space_calculator;

// 重导出核心引擎
pub use crate::domain::types::{SelectionOutcome, SessionState};
pub use group_session::{GroupSession, SessionError};
pub use space_calculator::{plant_area, plant_units, SpaceCalculator, UNIT_AREA_M2};
