// ==========================================
// 混植群落空间规划 - 空间计算引擎
// ==========================================
// 职责: 由群落集合 + 需求表 + 物种目录推导群落面积、株数与合计
// 输入: GroupModel + DemandMap + &dyn SpeciesCatalog
// 输出: CalculationResult
// ==========================================
// 红线: 群落面积取成员面积最大值, 不求和 (同床混植)
// 红线: 目录常量非正或面积溢出时拒绝计算该群落, 不输出无穷/负面积
// 红线: 无状态, 相同输入得到逐位相同的结果
// ==========================================

use crate::domain::calculation::{CalculationResult, GuildArea, GuildFault, PlantAllocation};
use crate::domain::demand::DemandMap;
use crate::domain::guild::{GroupModel, Guild};
use crate::domain::species::{CatalogLookup, SpeciesCatalog, SpeciesParams};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// 单株占地面积 (m²)，与物种无关
pub const UNIT_AREA_M2: f64 = 0.1;

/// 单物种所需面积 = (需求 / 周产能) * 占地面积
///
/// 假设产量与面积线性相关（无密植收益、无重叠折扣）
pub fn plant_area(demand_kg: f64, params: &SpeciesParams) -> f64 {
    (demand_kg / params.weekly_kg) * params.weekly_area
}

/// 面积换算株数 = ceil(面积 / 单株面积)
pub fn plant_units(area_m2: f64) -> u64 {
    if area_m2 <= 0.0 {
        return 0;
    }
    (area_m2 / UNIT_AREA_M2).ceil() as u64
}

// ==========================================
// SpaceCalculator - 空间计算引擎
// ==========================================
pub struct SpaceCalculator {
    // 无状态引擎，目录句柄通过参数注入
}

impl Default for SpaceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpaceCalculator {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算所有群落的空间需求
    ///
    /// 规则：
    /// 1) 只计算需求表中有正需求的成员 D(g)，D(g) 为空的群落不出现在结果中
    /// 2) 目录中不存在的物种静默跳过
    /// 3) 群落面积 = max(成员面积)
    /// 4) 目录常量无效或查询失败 → 该群落记为故障，其余群落继续
    /// 5) 总需求量 = 需求表合计，与目录解析结果无关
    ///
    /// 调用方应在需求表为空时直接终止，不调用本方法
    #[instrument(skip_all, fields(
        guild_count = groups.len(),
        demand_count = demand.len()
    ))]
    pub fn calculate(
        &self,
        groups: &GroupModel,
        demand: &DemandMap,
        catalog: &dyn SpeciesCatalog,
    ) -> CalculationResult {
        // 单次计算内每个物种只查询一次目录
        let mut lookups: HashMap<String, CatalogLookup> = HashMap::new();

        let mut guild_areas = Vec::new();
        let mut faults = Vec::new();
        let mut total_area_m2 = 0.0;

        for (index, guild) in groups.guilds().iter().enumerate() {
            let guild_number = index + 1;

            match self.calculate_guild(guild_number, guild, demand, catalog, &mut lookups) {
                Ok(Some(area)) => {
                    debug!(
                        guild_number = guild_number,
                        area_m2 = area.area_m2,
                        species_count = area.plants.len(),
                        "群落面积计算完成"
                    );
                    total_area_m2 += area.area_m2;
                    guild_areas.push(area);
                }
                Ok(None) => {
                    debug!(guild_number = guild_number, "群落无有效需求, 不计面积");
                }
                Err(fault) => {
                    warn!(
                        guild_number = guild_number,
                        species_id = %fault.species_id(),
                        fault = %fault,
                        "目录数据完整性故障, 拒绝计算该群落"
                    );
                    faults.push(fault);
                }
            }
        }

        let result = CalculationResult {
            guilds: guild_areas,
            total_area_m2,
            total_production_kg: demand.total(),
            guild_count: groups.len(),
            faults,
        };

        info!(
            total_area_m2 = result.total_area_m2,
            total_production_kg = result.total_production_kg,
            contributing_guilds = result.guilds.len(),
            faults = result.faults.len(),
            "空间计算完成"
        );

        result
    }

    /// 计算单个群落
    ///
    /// # 返回
    /// - Ok(Some(GuildArea)): 至少一个成员解析成功
    /// - Ok(None): 没有可计算的成员
    /// - Err(GuildFault): 目录数据完整性故障
    fn calculate_guild(
        &self,
        guild_number: usize,
        guild: &Guild,
        demand: &DemandMap,
        catalog: &dyn SpeciesCatalog,
        lookups: &mut HashMap<String, CatalogLookup>,
    ) -> Result<Option<GuildArea>, GuildFault> {
        let mut plants = Vec::new();
        let mut area_m2: f64 = 0.0;

        for member in guild.members() {
            let demand_kg = match demand.get(&member.species_id) {
                Some(kg) if kg > 0.0 => kg,
                _ => continue,
            };

            let lookup = lookups
                .entry(member.species_id.clone())
                .or_insert_with(|| catalog.lookup(&member.species_id));

            let params = match lookup {
                CatalogLookup::Found(entry) => entry.params,
                CatalogLookup::NotFound => {
                    debug!(species_id = %member.species_id, "物种不在目录中, 跳过");
                    continue;
                }
                CatalogLookup::Failed(reason) => {
                    return Err(GuildFault::CatalogLookupFailed {
                        guild_number,
                        species_id: member.species_id.clone(),
                        reason: reason.to_string(),
                    });
                }
            };

            // 常量有效但极端时面积仍可能溢出为无穷
            let species_area = plant_area(demand_kg, &params);
            if !params.is_valid() || !species_area.is_finite() {
                return Err(GuildFault::ArithmeticInvariantViolation {
                    guild_number,
                    species_id: member.species_id.clone(),
                    weekly_kg: params.weekly_kg,
                    weekly_area: params.weekly_area,
                });
            }

            area_m2 = area_m2.max(species_area);

            plants.push(PlantAllocation {
                species_id: member.species_id.clone(),
                display_name: member.display_name.clone(),
                plant_area_m2: species_area,
                plant_units: plant_units(species_area),
                expected_yield_kg: demand_kg,
            });
        }

        if plants.is_empty() {
            return Ok(None);
        }

        Ok(Some(GuildArea {
            guild_number,
            area_m2,
            plants,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::guild::GuildMember;
    use crate::domain::species::SpeciesEntry;
    use crate::repository::InMemoryCatalog;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn tomato() -> SpeciesEntry {
        SpeciesEntry::new("Solanum_lycopersicum", "Tomato", "Tomate", 5.0, 2.0)
    }

    fn basil() -> SpeciesEntry {
        SpeciesEntry::new("Ocimum_basilicum", "Basil", "Albahaca", 2.0, 1.0)
    }

    fn guild(ids: &[(&str, &str)]) -> Guild {
        Guild::from_members(
            ids.iter()
                .map(|(id, name)| GuildMember::new(*id, *name))
                .collect(),
        )
        .unwrap()
    }

    fn demand(entries: &[(&str, f64)]) -> DemandMap {
        let mut map = DemandMap::new();
        for (id, kg) in entries {
            map.set(*id, *kg).unwrap();
        }
        map
    }

    // ==========================================
    // 测试用例
    // ==========================================

    #[test]
    fn test_tomato_basil_example() {
        let catalog = InMemoryCatalog::from_entries(vec![tomato(), basil()]);
        let groups = GroupModel::from_guilds(vec![guild(&[
            ("Solanum_lycopersicum", "Tomato"),
            ("Ocimum_basilicum", "Basil"),
        ])]);
        let demand = demand(&[("Solanum_lycopersicum", 5.0), ("Ocimum_basilicum", 2.0)]);

        let result = SpaceCalculator::new().calculate(&groups, &demand, &catalog);

        assert_eq!(result.per_guild_area(), vec![2.0]);
        assert_eq!(result.total_area_m2, 2.0);
        assert_eq!(result.total_production_kg, 7.0);
        assert_eq!(result.guild_count, 1);

        let plants = &result.guilds[0].plants;
        assert_eq!(plants[0].species_id, "Solanum_lycopersicum");
        assert_eq!(plants[0].plant_area_m2, 2.0);
        assert_eq!(plants[0].plant_units, 20);
        assert_eq!(plants[0].expected_yield_kg, 5.0);
        assert_eq!(plants[1].plant_area_m2, 1.0);
        assert_eq!(plants[1].plant_units, 10);
        assert_eq!(plants[1].expected_yield_kg, 2.0);
    }

    #[test]
    fn test_guild_area_is_max_not_sum() {
        let catalog = InMemoryCatalog::from_entries(vec![tomato(), basil()]);
        let groups = GroupModel::from_guilds(vec![guild(&[
            ("Solanum_lycopersicum", "Tomato"),
            ("Ocimum_basilicum", "Basil"),
        ])]);
        // 番茄 (2.5/5)*2 = 1.0, 罗勒 (6/2)*1 = 3.0
        let demand = demand(&[("Solanum_lycopersicum", 2.5), ("Ocimum_basilicum", 6.0)]);

        let result = SpaceCalculator::new().calculate(&groups, &demand, &catalog);
        assert_eq!(result.total_area_m2, 3.0);
        assert_ne!(result.total_area_m2, 4.0);
    }

    #[test]
    fn test_zero_or_absent_demand_is_excluded() {
        let catalog = InMemoryCatalog::from_entries(vec![tomato(), basil()]);
        let groups = GroupModel::from_guilds(vec![
            guild(&[("Solanum_lycopersicum", "Tomato"), ("Ocimum_basilicum", "Basil")]),
            guild(&[("Ocimum_basilicum", "Basil")]),
        ]);
        let demand = demand(&[("Solanum_lycopersicum", 10.0)]);

        let result = SpaceCalculator::new().calculate(&groups, &demand, &catalog);

        // 第 2 个群落没有需求, 不出现在结果中
        assert_eq!(result.guilds.len(), 1);
        assert_eq!(result.guilds[0].guild_number, 1);
        assert_eq!(result.guilds[0].plants.len(), 1);
        assert_eq!(result.total_area_m2, 4.0);
        assert_eq!(result.guild_count, 2);
    }

    #[test]
    fn test_catalog_miss_skips_species_only() {
        let catalog = InMemoryCatalog::from_entries(vec![tomato()]);
        let groups = GroupModel::from_guilds(vec![guild(&[
            ("Solanum_lycopersicum", "Tomato"),
            ("Ocimum_basilicum", "Basil"),
        ])]);
        let demand = demand(&[("Solanum_lycopersicum", 5.0), ("Ocimum_basilicum", 20.0)]);

        let result = SpaceCalculator::new().calculate(&groups, &demand, &catalog);

        assert_eq!(result.total_area_m2, 2.0);
        assert_eq!(result.guilds[0].plants.len(), 1);
        // 总需求量包含未解析的物种
        assert_eq!(result.total_production_kg, 25.0);
        assert!(!result.has_faults());
    }

    #[test]
    fn test_non_positive_capacity_refuses_only_that_guild() {
        let broken = SpeciesEntry::new("Allium_cepa", "Onion", "Cebolla", 0.0, 0.5);
        let catalog = InMemoryCatalog::from_entries(vec![tomato(), basil(), broken]);
        let groups = GroupModel::from_guilds(vec![
            guild(&[("Allium_cepa", "Onion"), ("Ocimum_basilicum", "Basil")]),
            guild(&[("Solanum_lycopersicum", "Tomato")]),
        ]);
        let demand = demand(&[
            ("Allium_cepa", 1.0),
            ("Ocimum_basilicum", 2.0),
            ("Solanum_lycopersicum", 5.0),
        ]);

        let result = SpaceCalculator::new().calculate(&groups, &demand, &catalog);

        assert_eq!(result.guilds.len(), 1);
        assert_eq!(result.guilds[0].guild_number, 2);
        assert_eq!(result.total_area_m2, 2.0);
        assert_eq!(result.faults.len(), 1);
        assert!(matches!(
            result.faults[0],
            GuildFault::ArithmeticInvariantViolation { guild_number: 1, .. }
        ));
        assert!(result.total_area_m2.is_finite());
    }

    #[test]
    fn test_overflowing_area_is_refused() {
        let extreme = SpeciesEntry::new("Allium_cepa", "Onion", "Cebolla", 1e-300, 1e10);
        let catalog = InMemoryCatalog::from_entries(vec![tomato(), extreme]);
        let groups = GroupModel::from_guilds(vec![
            guild(&[("Allium_cepa", "Onion")]),
            guild(&[("Solanum_lycopersicum", "Tomato")]),
        ]);
        let demand = demand(&[("Allium_cepa", 1e10), ("Solanum_lycopersicum", 5.0)]);

        let result = SpaceCalculator::new().calculate(&groups, &demand, &catalog);

        assert_eq!(result.guilds.len(), 1);
        assert_eq!(result.guilds[0].guild_number, 2);
        assert_eq!(result.total_area_m2, 2.0);
        assert!(matches!(
            &result.faults[0],
            GuildFault::ArithmeticInvariantViolation { guild_number: 1, species_id, .. }
                if species_id == "Allium_cepa"
        ));
        assert!(result
            .guilds
            .iter()
            .flat_map(|g| g.plants.iter())
            .all(|p| p.plant_area_m2.is_finite() && p.plant_units < u64::MAX));
    }

    #[test]
    fn test_lookup_failure_refuses_guild() {
        let catalog = InMemoryCatalog::from_entries(vec![tomato(), basil()])
            .with_failure("Ocimum_basilicum", "database is locked");
        let groups = GroupModel::from_guilds(vec![guild(&[
            ("Solanum_lycopersicum", "Tomato"),
            ("Ocimum_basilicum", "Basil"),
        ])]);
        let demand = demand(&[("Solanum_lycopersicum", 5.0), ("Ocimum_basilicum", 2.0)]);

        let result = SpaceCalculator::new().calculate(&groups, &demand, &catalog);

        assert!(result.guilds.is_empty());
        assert_eq!(result.total_area_m2, 0.0);
        assert!(matches!(
            &result.faults[0],
            GuildFault::CatalogLookupFailed { species_id, .. } if species_id == "Ocimum_basilicum"
        ));
    }

    #[test]
    fn test_plant_units_rounding() {
        assert_eq!(plant_units(2.0), 20);
        assert_eq!(plant_units(1.0), 10);
        assert_eq!(plant_units(0.001), 1);
        assert_eq!(plant_units(0.25), 3);
        assert_eq!(plant_units(0.0), 0);
    }

    #[test]
    fn test_calculation_is_idempotent() {
        let catalog = InMemoryCatalog::from_entries(vec![tomato(), basil()]);
        let groups = GroupModel::from_guilds(vec![
            guild(&[("Solanum_lycopersicum", "Tomato"), ("Ocimum_basilicum", "Basil")]),
            guild(&[("Ocimum_basilicum", "Basil")]),
        ]);
        let demand = demand(&[("Solanum_lycopersicum", 3.3), ("Ocimum_basilicum", 1.7)]);

        let calculator = SpaceCalculator::new();
        let first = calculator.calculate(&groups, &demand, &catalog);
        let second = calculator.calculate(&groups, &demand, &catalog);

        assert_eq!(first, second);
        assert_eq!(first.total_area_m2.to_bits(), second.total_area_m2.to_bits());
    }
}
