// ==========================================
// 混植群落空间规划 - 内存物种目录
// ==========================================
// 用途: 固定目录夹具 (测试 / 批处理演示), 不访问数据库
// ==========================================

use crate::domain::species::{
    CatalogError, CatalogLookup, CatalogResult, SpeciesCatalog, SpeciesEntry,
};
use std::collections::{BTreeMap, HashMap};

/// 内存物种目录
///
/// 可为指定物种注入查询失败, 用于区分 "未找到" 与 "查询失败"
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: BTreeMap<String, SpeciesEntry>,
    failures: HashMap<String, String>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从条目列表构造，latin_name 重复时后者覆盖前者
    pub fn from_entries(entries: Vec<SpeciesEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    pub fn insert(&mut self, entry: SpeciesEntry) {
        self.entries.insert(entry.latin_name.clone(), entry);
    }

    /// 让该物种的查询返回 Failed
    pub fn with_failure(mut self, latin_name: &str, reason: &str) -> Self {
        self.failures
            .insert(latin_name.to_string(), reason.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SpeciesCatalog for InMemoryCatalog {
    fn lookup(&self, latin_name: &str) -> CatalogLookup {
        if let Some(reason) = self.failures.get(latin_name) {
            return CatalogLookup::Failed(CatalogError::Unavailable(reason.clone()));
        }
        match self.entries.get(latin_name) {
            Some(entry) => CatalogLookup::Found(entry.clone()),
            None => CatalogLookup::NotFound,
        }
    }

    fn search(&self, term: &str) -> CatalogResult<Vec<SpeciesEntry>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|entry| entry.matches(&needle))
            .collect())
    }

    fn list_all(&self) -> CatalogResult<Vec<SpeciesEntry>> {
        let mut all: Vec<SpeciesEntry> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| a.english_name.cmp(&b.english_name));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_found_not_found_failed() {
        let catalog = InMemoryCatalog::from_entries(vec![SpeciesEntry::new(
            "Solanum_lycopersicum",
            "Tomato",
            "Tomate",
            5.0,
            2.0,
        )])
        .with_failure("Ocimum_basilicum", "boom");

        assert!(catalog.lookup("Solanum_lycopersicum").is_found());
        assert_eq!(catalog.lookup("Allium_cepa"), CatalogLookup::NotFound);
        assert_eq!(
            catalog.lookup("Ocimum_basilicum"),
            CatalogLookup::Failed(CatalogError::Unavailable("boom".to_string()))
        );
    }

    #[test]
    fn test_search_and_list_order() {
        let catalog = InMemoryCatalog::from_entries(vec![
            SpeciesEntry::new("Solanum_lycopersicum", "Tomato", "Tomate", 5.0, 2.0),
            SpeciesEntry::new("Ocimum_basilicum", "Basil", "Albahaca", 2.0, 1.0),
        ]);

        let names: Vec<String> = catalog
            .list_all()
            .unwrap()
            .into_iter()
            .map(|e| e.english_name)
            .collect();
        assert_eq!(names, vec!["Basil", "Tomato"]);

        assert_eq!(catalog.search("ALBA").unwrap().len(), 1);
        assert!(catalog.search("  ").unwrap().is_empty());
    }
}
