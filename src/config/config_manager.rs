// ==========================================
// 混植群落空间规划 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// 说明: 配置缺失或格式错误时使用默认值, 不中断运行
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::debug!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - JSON 报告中附带当时生效的配置
    pub fn get_config_snapshot(&self) -> Result<serde_json::Value, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map))
    }

    // ===== 界面配置 =====

    /// 获取界面语言（默认 en）
    pub fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::UI_LOCALE, "en")?;
        let locale = value.trim();
        if SUPPORTED_LOCALES.contains(&locale) {
            Ok(locale.to_string())
        } else {
            tracing::warn!(
                config_key = config_keys::UI_LOCALE,
                raw_value = %value,
                "不支持的界面语言，使用 en"
            );
            Ok("en".to_string())
        }
    }

    // ===== 报告配置 =====

    /// 获取面积显示小数位数（默认 1，上限 6）
    pub fn get_area_precision(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::REPORT_AREA_PRECISION, "1")?;
        Ok(value.trim().parse::<usize>().map(|p| p.min(6)).unwrap_or(1))
    }
}

/// 支持的界面语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "es"];

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 界面
    pub const UI_LOCALE: &str = "ui.locale";

    // 报告
    pub const REPORT_AREA_PRECISION: &str = "report.area_precision";
}
