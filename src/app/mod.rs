// ==========================================
// 混植群落空间规划 - 应用层
// ==========================================
// 职责: 控制台/批处理前端, 连接用户输入与 API 层
// ==========================================

pub mod batch;
pub mod console;
pub mod report;
pub mod state;

// 重导出
pub use batch::{run_plan_file, BatchError, OutputFormat};
pub use console::{Console, ConsoleError, ConsoleRun};
pub use report::{render_text, ReportEnvelope};
pub use state::{get_default_db_path, resolve_db_path, AppState};
