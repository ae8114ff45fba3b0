// ==========================================
// 混植群落空间规划 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储与 API 实例
// ==========================================

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::api::{ApiResult, PlannerApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::species::SpeciesCatalog;
use crate::importer::{SpeciesImportReport, SpeciesImporter};
use crate::repository::SpeciesRepository;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "HUERTO_PLANNER_DB_PATH";

/// 应用状态
///
/// 控制台与批处理共用同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 物种目录仓储
    pub species_repo: Arc<SpeciesRepository>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 规划 API
    pub planner_api: Arc<PlannerApi>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 打开连接后先执行幂等建表, 新库可以直接使用
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;

        Ok(Self::from_connection(db_path, Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建（测试用内存库）
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Self {
        let species_repo = Arc::new(SpeciesRepository::from_connection(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn));

        let catalog: Arc<dyn SpeciesCatalog> = species_repo.clone();
        let planner_api = Arc::new(PlannerApi::new(catalog));

        Self {
            db_path,
            species_repo,
            config,
            planner_api,
        }
    }

    /// 界面语言（读取失败时回退 en）
    pub fn locale(&self) -> String {
        self.config.get_locale().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "读取界面语言失败，使用 en");
            "en".to_string()
        })
    }

    /// 面积显示精度（读取失败时回退 1）
    pub fn area_precision(&self) -> usize {
        self.config.get_area_precision().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "读取面积精度失败，使用默认值");
            1
        })
    }

    /// 从 CSV 导入物种目录
    pub fn import_species(&self, path: &Path) -> ApiResult<SpeciesImportReport> {
        Ok(SpeciesImporter::import_file(path, &self.species_repo)?)
    }

    /// 当前配置快照（读取失败时为空对象）
    pub fn config_snapshot(&self) -> serde_json::Value {
        self.config
            .get_config_snapshot()
            .unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// 解析数据库路径
///
/// 优先级: 命令行 --db > 环境变量 > 用户数据目录 > ./species.db
pub fn resolve_db_path(cli_path: Option<&str>) -> String {
    match cli_path.map(str::trim) {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => get_default_db_path(),
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./species.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("huerto-planner");
        // 目录创建失败时保持当前目录回退值
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("species.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::species::SpeciesEntry;

    #[test]
    fn test_resolve_db_path_prefers_cli() {
        assert_eq!(resolve_db_path(Some(" /tmp/x.db ")), "/tmp/x.db");
        assert!(resolve_db_path(Some("  ")).ends_with(".db"));
        assert!(resolve_db_path(None).ends_with(".db"));
    }

    #[test]
    fn test_state_shares_connection() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let state = AppState::from_connection(":memory:".to_string(), Arc::new(Mutex::new(conn)));

        state
            .species_repo
            .upsert_single(&SpeciesEntry::new("Allium_cepa", "Onion", "Cebolla", 3.0, 0.5))
            .unwrap();

        assert_eq!(state.planner_api.list_species().unwrap().len(), 1);
        assert_eq!(state.area_precision(), 1);
        assert_eq!(state.locale(), "en");
    }
}
