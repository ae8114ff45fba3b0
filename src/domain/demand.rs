// ==========================================
// 混植群落空间规划 - 需求表 (Demand Map)
// ==========================================
// 红线: 需求值必须为有限正数 (0/空白不入表)
// 红线: 只收录群落中出现过的物种
// ==========================================

use crate::domain::guild::GroupModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// 需求录入错误（输入边界层拦截并重新提示，不会进入核心）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DemandError {
    #[error("需求值不是有效数字: {0}")]
    NotANumber(String),

    #[error("需求值必须为正数: {0}")]
    NonPositive(f64),
}

/// 解析单条需求输入
///
/// # 返回
/// - Ok(None): 空白输入，表示该物种无需求
/// - Ok(Some(kg)): 有效的正数需求
/// - Err(DemandError): 非数字 / 非正数 / 非有限值
pub fn parse_demand_input(raw: &str) -> Result<Option<f64>, DemandError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let kg: f64 = trimmed
        .parse()
        .map_err(|_| DemandError::NotANumber(trimmed.to_string()))?;

    if !kg.is_finite() {
        return Err(DemandError::NotANumber(trimmed.to_string()));
    }
    if kg <= 0.0 {
        return Err(DemandError::NonPositive(kg));
    }

    Ok(Some(kg))
}

// ==========================================
// DemandMap - 周产量需求表 (kg/周)
// ==========================================
// BTreeMap 保证遍历顺序固定，合计值可复现
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandMap {
    entries: BTreeMap<String, f64>,
}

impl DemandMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一条需求
    ///
    /// 非正数 / 非有限值被拒绝，已有值会被覆盖
    pub fn set(&mut self, species_id: impl Into<String>, kg: f64) -> Result<(), DemandError> {
        if !kg.is_finite() {
            return Err(DemandError::NotANumber(kg.to_string()));
        }
        if kg <= 0.0 {
            return Err(DemandError::NonPositive(kg));
        }
        self.entries.insert(species_id.into(), kg);
        Ok(())
    }

    pub fn get(&self, species_id: &str) -> Option<f64> {
        self.entries.get(species_id).copied()
    }

    pub fn remove(&mut self, species_id: &str) -> Option<f64> {
        self.entries.remove(species_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// 需求总量 (kg/周)
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    /// 丢弃未被任何群落引用的物种
    ///
    /// # 返回
    /// 被丢弃的物种 id 列表
    pub fn retain_referenced(&mut self, groups: &GroupModel) -> Vec<String> {
        let dropped: Vec<String> = self
            .entries
            .keys()
            .filter(|id| !groups.references(id))
            .cloned()
            .collect();
        for id in &dropped {
            self.entries.remove(id);
        }
        dropped
    }
}
