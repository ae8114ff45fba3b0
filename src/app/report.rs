// ==========================================
// 混植群落空间规划 - 结果报告
// ==========================================
// 职责: 把 CalculationResult 渲染为控制台文本或 JSON
// 说明: 引擎只产出数据, 所有格式化集中在这里
// ==========================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::calculation::{CalculationResult, GuildFault};
use crate::i18n::{t, t_with_args};

const RULE_WIDTH: usize = 50;

// ==========================================
// 文本报告
// ==========================================

/// 渲染控制台文本报告
///
/// # 参数
/// - area_precision: 面积小数位数 (report.area_precision)
pub fn render_text(result: &CalculationResult, area_precision: usize) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![String::new(), rule.clone(), t("report.title"), rule];

    for guild in &result.guilds {
        let number = guild.guild_number.to_string();
        let area = format_area(guild.area_m2, area_precision);
        lines.push(t_with_args(
            "report.group_area",
            &[("number", number.as_str()), ("area", area.as_str())],
        ));

        for plant in &guild.plants {
            let units = plant.plant_units.to_string();
            let kg = format_kg(plant.expected_yield_kg);
            lines.push(t_with_args(
                "report.plant_line",
                &[
                    ("name", plant.display_name.as_str()),
                    ("plants", units.as_str()),
                    ("kg", kg.as_str()),
                ],
            ));
        }
        lines.push(String::new());
    }

    if result.has_faults() {
        lines.push(t("report.faults_title"));
        for fault in &result.faults {
            lines.push(format!("  {}", render_fault(fault)));
        }
        lines.push(String::new());
    }

    let total_area = format_area(result.total_area_m2, area_precision);
    let guild_count = result.guild_count.to_string();
    let total_kg = format_kg(result.total_production_kg);
    lines.push(t_with_args("report.total_area", &[("area", total_area.as_str())]));
    lines.push(t_with_args("report.group_count", &[("count", guild_count.as_str())]));
    lines.push(t_with_args("report.total_production", &[("kg", total_kg.as_str())]));

    lines.join("\n")
}

fn render_fault(fault: &GuildFault) -> String {
    let number = fault.guild_number().to_string();
    match fault {
        GuildFault::ArithmeticInvariantViolation {
            species_id,
            weekly_kg,
            weekly_area,
            ..
        } => {
            let kg = weekly_kg.to_string();
            let area = weekly_area.to_string();
            t_with_args(
                "report.fault_invalid",
                &[
                    ("number", number.as_str()),
                    ("name", species_id.as_str()),
                    ("kg", kg.as_str()),
                    ("area", area.as_str()),
                ],
            )
        }
        GuildFault::CatalogLookupFailed {
            species_id, reason, ..
        } => t_with_args(
            "report.fault_lookup",
            &[
                ("number", number.as_str()),
                ("name", species_id.as_str()),
                ("reason", reason.as_str()),
            ],
        ),
    }
}

pub fn format_area(area_m2: f64, precision: usize) -> String {
    format!("{:.*}", precision, area_m2)
}

pub fn format_kg(kg: f64) -> String {
    format!("{:.1}", kg)
}

// ==========================================
// JSON 报告
// ==========================================

/// JSON 报告外壳
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a> {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub version: &'static str,
    pub config: serde_json::Value,
    pub dropped_demand: &'a [String],
    /// None 表示没有录入需求, 未计算
    pub result: Option<&'a CalculationResult>,
}

impl<'a> ReportEnvelope<'a> {
    pub fn new(
        result: Option<&'a CalculationResult>,
        dropped_demand: &'a [String],
        config: serde_json::Value,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            version: crate::VERSION,
            config,
            dropped_demand,
            result,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calculation::{GuildArea, PlantAllocation};

    fn sample() -> CalculationResult {
        CalculationResult {
            guilds: vec![GuildArea {
                guild_number: 1,
                area_m2: 2.0,
                plants: vec![PlantAllocation {
                    species_id: "Solanum_lycopersicum".to_string(),
                    display_name: "Tomato".to_string(),
                    plant_area_m2: 2.0,
                    plant_units: 20,
                    expected_yield_kg: 5.0,
                }],
            }],
            total_area_m2: 2.0,
            total_production_kg: 5.0,
            guild_count: 2,
            faults: vec![GuildFault::CatalogLookupFailed {
                guild_number: 2,
                species_id: "Ocimum_basilicum".to_string(),
                reason: "disk I/O error".to_string(),
            }],
        }
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_area(2.0, 1), "2.0");
        assert_eq!(format_area(0.123456, 3), "0.123");
        assert_eq!(format_area(7.0, 0), "7");
        assert_eq!(format_kg(7.0), "7.0");
    }

    #[test]
    fn test_render_text_contains_values() {
        let text = render_text(&sample(), 2);
        assert!(text.contains("Tomato"));
        assert!(text.contains("20"));
        assert!(text.contains("2.00"));
        assert!(text.contains("Ocimum_basilicum"));
        assert!(text.contains("disk I/O error"));
    }

    #[test]
    fn test_json_envelope() {
        let result = sample();
        let dropped = vec!["Allium_cepa".to_string()];
        let envelope = ReportEnvelope::new(Some(&result), &dropped, serde_json::json!({}));
        let value: serde_json::Value =
            serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(value["result"]["total_area_m2"], 2.0);
        assert_eq!(value["result"]["guilds"][0]["plants"][0]["plant_units"], 20);
        assert_eq!(value["result"]["faults"][0]["kind"], "CATALOG_LOOKUP_FAILED");
        assert_eq!(value["dropped_demand"][0], "Allium_cepa");
        assert!(value["report_id"].is_string());
    }

    #[test]
    fn test_json_envelope_without_result() {
        let dropped: Vec<String> = Vec::new();
        let envelope = ReportEnvelope::new(None, &dropped, serde_json::json!({}));
        let value: serde_json::Value =
            serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert!(value["result"].is_null());
    }
}
