// ==========================================
// 混植群落空间规划 - 计算结果模型
// ==========================================
// 用途: 空间计算引擎输出，交给报告层展示
// 说明: 派生数据，每次运行重新计算，不落库
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// PlantAllocation - 单个物种的种植分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantAllocation {
    pub species_id: String,
    pub display_name: String,
    pub plant_area_m2: f64,     // 单独种植所需面积
    pub plant_units: u64,       // 株数 = ceil(面积 / 单株面积)
    pub expected_yield_kg: f64, // 预期周产量 (= 需求值)
}

// ==========================================
// GuildArea - 单个群落的面积
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildArea {
    pub guild_number: usize, // 在群落集合中的序号 (从 1 开始)
    pub area_m2: f64,        // 群落面积 = 成员面积最大值
    pub plants: Vec<PlantAllocation>,
}

// ==========================================
// GuildFault - 群落级数据完整性故障
// ==========================================
// 目录数据违反约束时拒绝计算该群落，其余群落照常计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuildFault {
    /// 周产能或占地面积非正 / 非有限, 或推导出的面积溢出
    ArithmeticInvariantViolation {
        guild_number: usize,
        species_id: String,
        weekly_kg: f64,
        weekly_area: f64,
    },
    /// 目录查询失败（区别于未找到）
    CatalogLookupFailed {
        guild_number: usize,
        species_id: String,
        reason: String,
    },
}

impl GuildFault {
    pub fn guild_number(&self) -> usize {
        match self {
            GuildFault::ArithmeticInvariantViolation { guild_number, .. } => *guild_number,
            GuildFault::CatalogLookupFailed { guild_number, .. } => *guild_number,
        }
    }

    pub fn species_id(&self) -> &str {
        match self {
            GuildFault::ArithmeticInvariantViolation { species_id, .. } => species_id,
            GuildFault::CatalogLookupFailed { species_id, .. } => species_id,
        }
    }
}

impl fmt::Display for GuildFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuildFault::ArithmeticInvariantViolation {
                guild_number,
                species_id,
                weekly_kg,
                weekly_area,
            } => write!(
                f,
                "群落 {} 物种 {} 目录常量无效: weekly_kg={}, weekly_area={}",
                guild_number, species_id, weekly_kg, weekly_area
            ),
            GuildFault::CatalogLookupFailed {
                guild_number,
                species_id,
                reason,
            } => write!(
                f,
                "群落 {} 物种 {} 目录查询失败: {}",
                guild_number, species_id, reason
            ),
        }
    }
}

// ==========================================
// CalculationResult - 空间计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub guilds: Vec<GuildArea>,   // 有贡献的群落 (按群落集合顺序)
    pub total_area_m2: f64,       // 总面积
    pub total_production_kg: f64, // 需求总量
    pub guild_count: usize,       // 群落集合中的群落总数
    pub faults: Vec<GuildFault>,  // 被拒绝计算的群落
}

impl CalculationResult {
    /// 各群落面积（与 guilds 顺序一致）
    pub fn per_guild_area(&self) -> Vec<f64> {
        self.guilds.iter().map(|g| g.area_m2).collect()
    }

    pub fn has_faults(&self) -> bool {
        !self.faults.is_empty()
    }
}
