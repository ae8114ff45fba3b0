// ==========================================
// 混植群落空间规划 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 种植规划辅助 (农户最终决定群落组合)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 物种目录访问
pub mod repository;

// 引擎层 - 群落构建会话与空间计算
pub mod engine;

// 导入层 - 物种目录 CSV
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 控制台/批处理前端
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CalculationResult, CatalogError, CatalogLookup, DemandMap, GroupModel, Guild, GuildArea,
    GuildFault, PlantAllocation, SpeciesCatalog, SpeciesEntry, SpeciesParams,
};

// 引擎
pub use engine::{GroupSession, SelectionOutcome, SessionState, SpaceCalculator};

// API
pub use api::PlannerApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
