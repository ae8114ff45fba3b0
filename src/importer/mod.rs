// ==========================================
// 混植群落空间规划 - 导入层
// ==========================================
// 职责: 物种目录 CSV 导入 (校验 → 写入 species 表)
// ==========================================

pub mod error;
pub mod species_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use species_importer::{RowRejection, SpeciesImportReport, SpeciesImporter};
