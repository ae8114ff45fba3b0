// ==========================================
// 混植群落空间规划 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供物种目录访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod in_memory_catalog;
pub mod species_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use in_memory_catalog::InMemoryCatalog;
pub use species_repo::SpeciesRepository;
