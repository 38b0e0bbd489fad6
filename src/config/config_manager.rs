// ==========================================
// 工作中心目标引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)，本系统只用 global
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::target::DEFAULT_CREATED_BY;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 轮询间隔缺省值（秒）
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// 广播通道缓冲缺省值
pub const DEFAULT_BROADCAST_CAPACITY: usize = 16;

// ==========================================
// EngineSettings - 启动时读取的一组配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub poll_interval_secs: u64,
    pub broadcast_capacity: usize,
    pub default_created_by: String,
    pub warn_on_other_slot: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            default_created_by: DEFAULT_CREATED_BY.to_string(),
            warn_on_other_slot: true,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager（对连接重新应用 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 轮询配置 =====

    pub fn get_poll_interval_secs(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::POLL_INTERVAL_SECS,
            &DEFAULT_POLL_INTERVAL_SECS.to_string(),
        )?;
        // 0 秒会让 interval panic
        Ok(value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }

    pub fn get_broadcast_capacity(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::BROADCAST_CAPACITY,
            &DEFAULT_BROADCAST_CAPACITY.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_BROADCAST_CAPACITY))
    }

    // ===== 目标写入配置 =====

    pub fn get_default_created_by(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_CREATED_BY, DEFAULT_CREATED_BY)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(DEFAULT_CREATED_BY.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    // ===== 数据质量配置 =====

    pub fn get_warn_on_other_slot(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::WARN_ON_OTHER_SLOT, "true")?;
        Ok(!matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ))
    }

    /// 一次性读取引擎配置
    pub fn load_settings(&self) -> Result<EngineSettings, Box<dyn Error>> {
        Ok(EngineSettings {
            poll_interval_secs: self.get_poll_interval_secs()?,
            broadcast_capacity: self.get_broadcast_capacity()?,
            default_created_by: self.get_default_created_by()?,
            warn_on_other_slot: self.get_warn_on_other_slot()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 变更轮询
    pub const POLL_INTERVAL_SECS: &str = "poll_interval_secs";
    pub const BROADCAST_CAPACITY: &str = "broadcast_capacity";

    // 目标写入
    pub const DEFAULT_CREATED_BY: &str = "default_created_by";

    // 数据质量
    pub const WARN_ON_OTHER_SLOT: &str = "warn_on_other_slot";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let settings = manager().load_settings().unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let cfg = manager();
        cfg.set_global_config_value(config_keys::POLL_INTERVAL_SECS, "5").unwrap();
        cfg.set_global_config_value(config_keys::BROADCAST_CAPACITY, "abc").unwrap();
        cfg.set_global_config_value(config_keys::DEFAULT_CREATED_BY, " planner ").unwrap();
        cfg.set_global_config_value(config_keys::WARN_ON_OTHER_SLOT, "off").unwrap();

        let settings = cfg.load_settings().unwrap();
        assert_eq!(settings.poll_interval_secs, 5);
        assert_eq!(settings.broadcast_capacity, DEFAULT_BROADCAST_CAPACITY);
        assert_eq!(settings.default_created_by, "planner");
        assert!(!settings.warn_on_other_slot);
    }

    #[test]
    fn test_zero_poll_interval_falls_back() {
        let cfg = manager();
        cfg.set_global_config_value(config_keys::POLL_INTERVAL_SECS, "0").unwrap();
        assert_eq!(cfg.get_poll_interval_secs().unwrap(), DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn test_snapshot_contains_values() {
        let cfg = manager();
        cfg.set_global_config_value(config_keys::POLL_INTERVAL_SECS, "10").unwrap();
        let snapshot: HashMap<String, String> =
            serde_json::from_str(&cfg.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.get("poll_interval_secs").map(String::as_str), Some("10"));
    }
}
