// ==========================================
// 混植群落空间规划 - 领域模型层
// ==========================================
// 职责: 定义物种、群落、需求表、计算结果等领域实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod calculation;
pub mod demand;
pub mod guild;
pub mod species;
pub mod types;

// 重导出核心类型
pub use calculation::{CalculationResult, GuildArea, GuildFault, PlantAllocation};
pub use demand::{parse_demand_input, DemandError, DemandMap};
pub use guild::{GroupModel, Guild, GuildMember};
pub use species::{
    CatalogError, CatalogLookup, CatalogResult, SpeciesCatalog, SpeciesEntry, SpeciesParams,
};
pub use types::{SelectionOutcome, SessionState};
