// ==========================================
// 混植群落空间规划 - 物种领域模型
// ==========================================
// 红线: 物种目录对核心只读
// 红线: weekly_kg / weekly_area 必须 > 0 (目录数据完整性)
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// SpeciesParams - 物种产量/占地常量
// ==========================================
// weekly_area: 单独种植时维持 weekly_kg 周产量所需面积 (m²)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    pub weekly_kg: f64,   // 周产能 (kg/周)
    pub weekly_area: f64, // 占地面积 (m²)
}

impl SpeciesParams {
    pub fn new(weekly_kg: f64, weekly_area: f64) -> Self {
        Self {
            weekly_kg,
            weekly_area,
        }
    }

    /// 目录常量是否满足完整性约束（两个值均为有限正数）
    pub fn is_valid(&self) -> bool {
        self.weekly_kg.is_finite()
            && self.weekly_area.is_finite()
            && self.weekly_kg > 0.0
            && self.weekly_area > 0.0
    }
}

// ==========================================
// SpeciesEntry - 物种目录条目
// ==========================================
// latin_name 为唯一标识 (species id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    pub latin_name: String,   // 拉丁学名 (主键)
    pub english_name: String, // 英文名
    pub spanish_name: String, // 西班牙文名
    pub params: SpeciesParams,
}

impl SpeciesEntry {
    pub fn new(
        latin_name: impl Into<String>,
        english_name: impl Into<String>,
        spanish_name: impl Into<String>,
        weekly_kg: f64,
        weekly_area: f64,
    ) -> Self {
        Self {
            latin_name: latin_name.into(),
            english_name: english_name.into(),
            spanish_name: spanish_name.into(),
            params: SpeciesParams::new(weekly_kg, weekly_area),
        }
    }

    /// 模糊匹配：任一名称包含搜索词（不区分大小写）
    ///
    /// 调用方负责传入已 trim + 小写化的搜索词
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.english_name.to_lowercase().contains(needle_lower)
            || self.spanish_name.to_lowercase().contains(needle_lower)
            || self.latin_name.to_lowercase().contains(needle_lower)
    }
}

// ==========================================
// CatalogError - 目录访问错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// 目录存储不可读（数据库错误、锁中毒等）
    #[error("物种目录不可用: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

// ==========================================
// CatalogLookup - 目录查询结果
// ==========================================
// 区分 "未找到" 与 "查询失败"：前者是正常缺失，后者是数据完整性故障
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogLookup {
    Found(SpeciesEntry),
    NotFound,
    Failed(CatalogError),
}

impl CatalogLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, CatalogLookup::Found(_))
    }
}

// ==========================================
// Trait: SpeciesCatalog
// ==========================================
// 用途: 空间计算引擎 / 群落构建会话的只读目录句柄
// 实现: SpeciesRepository (SQLite) / InMemoryCatalog (固定夹具)
pub trait SpeciesCatalog {
    /// 按拉丁学名查询单个物种
    fn lookup(&self, latin_name: &str) -> CatalogLookup;

    /// 模糊搜索（英文名/西班牙文名/拉丁学名）
    fn search(&self, term: &str) -> CatalogResult<Vec<SpeciesEntry>>;

    /// 列出全部物种（按英文名排序）
    fn list_all(&self) -> CatalogResult<Vec<SpeciesEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validity() {
        assert!(SpeciesParams::new(5.0, 2.0).is_valid());
        assert!(!SpeciesParams::new(0.0, 2.0).is_valid());
        assert!(!SpeciesParams::new(5.0, -1.0).is_valid());
        assert!(!SpeciesParams::new(f64::NAN, 1.0).is_valid());
        assert!(!SpeciesParams::new(f64::INFINITY, 1.0).is_valid());
    }

    #[test]
    fn test_entry_matches_any_name() {
        let tomato = SpeciesEntry::new("Solanum_lycopersicum", "Tomato", "Tomate", 5.0, 2.0);
        assert!(tomato.matches("tom"));
        assert!(tomato.matches("lycoper"));
        assert!(tomato.matches("mate"));
        assert!(!tomato.matches("basil"));
    }
}
