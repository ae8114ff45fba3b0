// ==========================================
// 混植群落空间规划 - 物种目录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::species::{
    CatalogLookup, CatalogResult, SpeciesCatalog, SpeciesEntry, SpeciesParams,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const SELECT_COLUMNS: &str =
    "SELECT latin_name, english_name, spanish_name, weekly_kg, weekly_area FROM species";

// ==========================================
// SpeciesRepository - 物种目录仓储
// ==========================================

/// 物种目录仓储
/// 职责: 管理 species 表的查询与写入
pub struct SpeciesRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SpeciesRepository {
    /// 创建新的物种目录仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<SpeciesEntry> {
        Ok(SpeciesEntry {
            latin_name: row.get(0)?,
            english_name: row.get(1)?,
            spanish_name: row.get(2)?,
            params: SpeciesParams::new(row.get(3)?, row.get(4)?),
        })
    }

    /// 按拉丁学名查询单个物种
    ///
    /// # 返回
    /// - Ok(Some(SpeciesEntry)): 找到
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_latin_name(&self, latin_name: &str) -> RepositoryResult<Option<SpeciesEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE latin_name = ?1", SELECT_COLUMNS);

        let entry = conn
            .query_row(&sql, params![latin_name], Self::map_row)
            .optional()?;

        Ok(entry)
    }

    /// 查询全部物种（按英文名排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<SpeciesEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY english_name", SELECT_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<SpeciesEntry>>>()?;

        Ok(entries)
    }

    /// 模糊搜索（任一名称包含搜索词，不区分大小写）
    ///
    /// 空白搜索词返回空列表
    pub fn search_by_name(&self, term: &str) -> RepositoryResult<Vec<SpeciesEntry>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let matches: Vec<SpeciesEntry> = self
            .find_all()?
            .into_iter()
            .filter(|entry| entry.matches(&needle))
            .collect();

        debug!(term = %needle, matches = matches.len(), "物种搜索");
        Ok(matches)
    }

    /// 物种总数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM species", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// 插入或更新单个物种
    pub fn upsert_single(&self, entry: &SpeciesEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::upsert_on(&conn, entry)?;
        Ok(())
    }

    /// 批量插入或更新物种（单事务）
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    pub fn upsert_batch(&self, entries: &[SpeciesEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut written = 0;
        for entry in entries {
            written += Self::upsert_on(&tx, entry)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(written)
    }

    fn upsert_on(conn: &Connection, entry: &SpeciesEntry) -> SqliteResult<usize> {
        conn.execute(
            r#"
            INSERT INTO species (latin_name, english_name, spanish_name, weekly_kg, weekly_area)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(latin_name) DO UPDATE SET
                english_name = excluded.english_name,
                spanish_name = excluded.spanish_name,
                weekly_kg = excluded.weekly_kg,
                weekly_area = excluded.weekly_area
            "#,
            params![
                entry.latin_name,
                entry.english_name,
                entry.spanish_name,
                entry.params.weekly_kg,
                entry.params.weekly_area,
            ],
        )
    }
}

// ==========================================
// SpeciesCatalog trait 实现
// ==========================================
// 查询失败与未找到分开返回, 不做任何兜底替换
impl SpeciesCatalog for SpeciesRepository {
    fn lookup(&self, latin_name: &str) -> CatalogLookup {
        match self.find_by_latin_name(latin_name) {
            Ok(Some(entry)) => CatalogLookup::Found(entry),
            Ok(None) => CatalogLookup::NotFound,
            Err(e) => CatalogLookup::Failed(e.into()),
        }
    }

    fn search(&self, term: &str) -> CatalogResult<Vec<SpeciesEntry>> {
        Ok(self.search_by_name(term)?)
    }

    fn list_all(&self) -> CatalogResult<Vec<SpeciesEntry>> {
        Ok(self.find_all()?)
    }
}
