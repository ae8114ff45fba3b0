// ==========================================
// 混植群落空间规划 - 物种目录导入器
// ==========================================
// 职责: 解析物种 CSV, 逐行校验后写入 species 表
// 表头: latin_name,english_name,spanish_name,weekly_kg,weekly_area
// 红线: weekly_kg / weekly_area 必须为有限正数, 否则整行拒绝
// ==========================================

use crate::domain::species::SpeciesEntry;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::SpeciesRepository;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 5] = [
    "latin_name",
    "english_name",
    "spanish_name",
    "weekly_kg",
    "weekly_area",
];

/// 被拒绝的数据行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRejection {
    pub row: usize, // 文件行号（表头为第 1 行）
    pub reason: String,
}

/// 导入结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesImportReport {
    pub total_rows: usize,
    pub accepted: Vec<SpeciesEntry>,
    pub rejected: Vec<RowRejection>,
    pub written: usize,
}

// ==========================================
// SpeciesImporter - 物种目录导入器
// ==========================================
pub struct SpeciesImporter;

impl SpeciesImporter {
    /// 从文件导入并写入仓储
    pub fn import_file(path: &Path, repo: &SpeciesRepository) -> ImportResult<SpeciesImportReport> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        let mut report = Self::parse(file)?;
        report.written = repo.upsert_batch(&report.accepted)?;

        info!(
            path = %path.display(),
            total_rows = report.total_rows,
            written = report.written,
            rejected = report.rejected.len(),
            "物种目录导入完成"
        );
        Ok(report)
    }

    /// 解析并校验 CSV（不写库）
    pub fn parse<R: Read>(reader: R) -> ImportResult<SpeciesImportReport> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致，缺失字段按行拒绝
            .trim(Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let columns = Self::resolve_columns(&headers)?;

        let mut report = SpeciesImportReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_row = 1;

        for record in reader.records() {
            // 行号取记录起始位置: 空行被跳过, 引号字段可跨行
            let position = match &record {
                Ok(r) => r.position(),
                Err(e) => e.position(),
            };
            let row = position
                .map(|p| p.line() as usize)
                .unwrap_or(last_row + 1);
            last_row = row;
            report.total_rows += 1;

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    report.rejected.push(RowRejection {
                        row,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match Self::parse_row(&record, &columns) {
                Ok(entry) => {
                    if !seen.insert(entry.latin_name.clone()) {
                        report.rejected.push(RowRejection {
                            row,
                            reason: format!("latin_name 重复: {}", entry.latin_name),
                        });
                        continue;
                    }
                    report.accepted.push(entry);
                }
                Err(reason) => {
                    warn!(row = row, reason = %reason, "物种行校验失败");
                    report.rejected.push(RowRejection { row, reason });
                }
            }
        }

        Ok(report)
    }

    /// 表头字段 → 列下标（顺序同 REQUIRED_COLUMNS）
    fn resolve_columns(headers: &StringRecord) -> ImportResult<[usize; 5]> {
        let mut columns = [0usize; 5];
        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            columns[slot] = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| ImportError::MissingColumn(name.to_string()))?;
        }
        Ok(columns)
    }

    fn parse_row(record: &StringRecord, columns: &[usize; 5]) -> Result<SpeciesEntry, String> {
        let text = |slot: usize| -> Result<String, String> {
            let value = record.get(columns[slot]).unwrap_or("").trim();
            if value.is_empty() {
                Err(format!("{} 为空", REQUIRED_COLUMNS[slot]))
            } else {
                Ok(value.to_string())
            }
        };
        let positive = |slot: usize| -> Result<f64, String> {
            let raw = text(slot)?;
            let value: f64 = raw
                .parse()
                .map_err(|_| format!("{} 不是数字: {}", REQUIRED_COLUMNS[slot], raw))?;
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} 必须为正数: {}", REQUIRED_COLUMNS[slot], raw));
            }
            Ok(value)
        };

        Ok(SpeciesEntry::new(
            text(0)?,
            text(1)?,
            text(2)?,
            positive(3)?,
            positive(4)?,
        ))
    }
}
