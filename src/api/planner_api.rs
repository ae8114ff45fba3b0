// ==========================================
// 混植群落空间规划 - 规划 API
// ==========================================
// 职责: 物种查询、群落构建会话、需求表、空间计算的统一入口
// 说明: 控制台与批处理前端只通过本 API 访问核心
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::calculation::CalculationResult;
use crate::domain::demand::DemandMap;
use crate::domain::guild::{GroupModel, GuildMember};
use crate::domain::species::{SpeciesCatalog, SpeciesEntry};
use crate::domain::types::SelectionOutcome;
use crate::engine::group_session::GroupSession;
use crate::engine::space_calculator::SpaceCalculator;

// ==========================================
// PlanRequest - 批处理规划输入
// ==========================================
/// 批处理规划文件
///
/// ```json
/// {"groups": [["Solanum_lycopersicum", "Ocimum_basilicum"]],
///  "demand": {"Solanum_lycopersicum": 5.0}}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub groups: Vec<Vec<String>>,
    #[serde(default)]
    pub demand: BTreeMap<String, f64>,
}

// ==========================================
// PlanRun - 批处理规划结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRun {
    pub group_model: GroupModel,
    /// 未改变会话的操作反馈（重复/未知物种等）
    pub feedback: Vec<SelectionOutcome>,
    /// 不在任何群落中的需求条目（已丢弃）
    pub dropped_demand: Vec<String>,
    /// None 表示需求表为空，未进行计算
    pub result: Option<CalculationResult>,
}

// ==========================================
// PlannerApi - 规划 API
// ==========================================
pub struct PlannerApi {
    catalog: Arc<dyn SpeciesCatalog>,
    calculator: SpaceCalculator,
}

impl PlannerApi {
    /// 创建新的 PlannerApi 实例
    ///
    /// # 参数
    /// - catalog: 只读物种目录句柄
    pub fn new(catalog: Arc<dyn SpeciesCatalog>) -> Self {
        Self {
            catalog,
            calculator: SpaceCalculator::new(),
        }
    }

    pub fn catalog(&self) -> &dyn SpeciesCatalog {
        self.catalog.as_ref()
    }

    // ==========================================
    // 物种查询
    // ==========================================

    /// 模糊搜索物种
    pub fn search_species(&self, term: &str) -> ApiResult<Vec<SpeciesEntry>> {
        Ok(self.catalog.search(term)?)
    }

    /// 列出全部物种（按英文名排序）
    pub fn list_species(&self) -> ApiResult<Vec<SpeciesEntry>> {
        Ok(self.catalog.list_all()?)
    }

    // ==========================================
    // 群落构建
    // ==========================================

    pub fn new_session(&self) -> GroupSession {
        GroupSession::new()
    }

    /// 按物种 id 加入会话当前群落
    pub fn add_species(
        &self,
        session: &mut GroupSession,
        species_id: &str,
    ) -> ApiResult<SelectionOutcome> {
        Ok(session.add(self.catalog.as_ref(), species_id)?)
    }

    // ==========================================
    // 需求与计算
    // ==========================================

    /// 需要录入需求的物种（去重，按英文名排序）
    pub fn demand_prompts(&self, groups: &GroupModel) -> Vec<GuildMember> {
        groups.distinct_species()
    }

    /// 执行空间计算
    ///
    /// # 返回
    /// - Ok(None): 需求表为空（或只含群落外物种），不计算
    /// - Ok(Some(result)): 计算结果
    pub fn calculate(
        &self,
        groups: &GroupModel,
        demand: &DemandMap,
    ) -> ApiResult<Option<CalculationResult>> {
        let mut demand = demand.clone();
        let dropped = demand.retain_referenced(groups);
        if !dropped.is_empty() {
            warn!(dropped = ?dropped, "需求表包含群落外物种, 已丢弃");
        }

        if demand.is_empty() {
            info!("需求表为空, 不进行空间计算");
            return Ok(None);
        }

        Ok(Some(
            self.calculator
                .calculate(groups, &demand, self.catalog.as_ref()),
        ))
    }

    /// 执行批处理规划
    ///
    /// 群落通过与交互模式相同的 GroupSession 构建；
    /// 需求值为 0 视为无需求，负数/非有限值返回 InvalidDemand
    pub fn run_plan(&self, request: &PlanRequest) -> ApiResult<PlanRun> {
        let mut session = self.new_session();
        let mut feedback = Vec::new();

        for group in &request.groups {
            for species_id in group {
                let outcome = self.add_species(&mut session, species_id)?;
                if !outcome.changed() {
                    feedback.push(outcome);
                }
            }
            session.commit();
        }
        session.finish();

        let group_model = session
            .group_model()
            .ok_or_else(|| ApiError::InternalError("会话未结束".to_string()))?;

        let mut demand = DemandMap::new();
        let mut dropped_demand = Vec::new();
        for (species_id, kg) in &request.demand {
            if *kg == 0.0 {
                continue;
            }
            if !group_model.references(species_id) {
                dropped_demand.push(species_id.clone());
                continue;
            }
            demand
                .set(species_id.clone(), *kg)
                .map_err(|source| ApiError::InvalidDemand {
                    species_id: species_id.clone(),
                    source,
                })?;
        }

        let result = self.calculate(&group_model, &demand)?;

        info!(
            guild_count = group_model.len(),
            demand_count = demand.len(),
            calculated = result.is_some(),
            "批处理规划完成"
        );

        Ok(PlanRun {
            group_model,
            feedback,
            dropped_demand,
            result,
        })
    }
}
