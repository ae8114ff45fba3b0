// ==========================================
// 混植群落空间规划 - 批处理规划
// ==========================================
// 职责: 读取规划文件 (JSON), 通过 PlannerApi 执行, 渲染结果
// 格式: {"groups": [["latin", ...]], "demand": {"latin": kg}}
// ==========================================

use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::api::{ApiError, PlanRequest, PlanRun, PlannerApi};
use crate::app::console::outcome_message;
use crate::app::report::{render_text, ReportEnvelope};
use crate::i18n::{t, t_with_args};

/// 批处理错误
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("规划文件不存在: {0}")]
    FileNotFound(String),

    #[error("规划文件读取失败: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("规划文件格式错误: {0}")]
    InvalidPlan(#[from] serde_json::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type BatchResult<T> = Result<T, BatchError>;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// 读取规划文件
pub fn load_plan(path: &Path) -> BatchResult<PlanRequest> {
    if !path.exists() {
        return Err(BatchError::FileNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// 执行规划文件并返回渲染后的输出
pub fn run_plan_file(
    api: &PlannerApi,
    path: &Path,
    format: OutputFormat,
    area_precision: usize,
    config: serde_json::Value,
) -> BatchResult<String> {
    let request = load_plan(path)?;
    info!(
        path = %path.display(),
        group_count = request.groups.len(),
        demand_count = request.demand.len(),
        "读取规划文件"
    );

    let run = api.run_plan(&request)?;
    render_plan_run(&run, format, area_precision, config)
}

/// 渲染批处理结果
pub fn render_plan_run(
    run: &PlanRun,
    format: OutputFormat,
    area_precision: usize,
    config: serde_json::Value,
) -> BatchResult<String> {
    match format {
        OutputFormat::Json => {
            let envelope = ReportEnvelope::new(run.result.as_ref(), &run.dropped_demand, config);
            Ok(envelope.to_json()?)
        }
        OutputFormat::Text => {
            let mut lines: Vec<String> = run
                .feedback
                .iter()
                .map(|outcome| outcome_message(outcome, ""))
                .collect();
            for species_id in &run.dropped_demand {
                lines.push(t_with_args(
                    "demand.dropped",
                    &[("name", species_id.as_str())],
                ));
            }

            match &run.result {
                Some(result) => lines.push(render_text(result, area_precision)),
                None => lines.push(t("demand.none")),
            }
            Ok(lines.join("\n"))
        }
    }
}
