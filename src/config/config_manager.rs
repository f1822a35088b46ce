// ==========================================
// 模型铁路调车场交换系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表读取/写入交换参数覆写
// 存储: config_kv 表 (scope_id='global')
// ==========================================

use crate::config::exchange_config::ExchangeConfig;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 全局配置作用域
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const OFF_LAYOUT_SPOT_NAME: &str = "exchange.off_layout_spot_name";
    pub const REPLENISH_SPREAD: &str = "exchange.replenish_spread";
    pub const AUDIT_ENABLED: &str = "exchange.audit_enabled";
    pub const ACTOR: &str = "exchange.actor";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 所有 global 配置的快照
    pub fn snapshot(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// 在给定配置上应用 config_kv 中的覆写
    ///
    /// 无法解析的值保留默认并告警
    pub fn apply_overrides(&self, mut config: ExchangeConfig) -> RepositoryResult<ExchangeConfig> {
        if let Some(name) = self.get_global_value(config_keys::OFF_LAYOUT_SPOT_NAME)? {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                tracing::warn!(config_key = config_keys::OFF_LAYOUT_SPOT_NAME, "配置为空，使用默认值");
            } else {
                config.off_layout_spot_name = trimmed.to_string();
            }
        }

        if let Some(raw) = self.get_global_value(config_keys::REPLENISH_SPREAD)? {
            match raw.trim().parse::<usize>() {
                Ok(spread) => config.replenish_spread = spread,
                Err(_) => tracing::warn!(
                    config_key = config_keys::REPLENISH_SPREAD,
                    raw_value = %raw,
                    "补车区间配置格式错误，使用默认值"
                ),
            }
        }

        if let Some(raw) = self.get_global_value(config_keys::AUDIT_ENABLED)? {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => config.audit_enabled = true,
                "0" | "false" | "no" => config.audit_enabled = false,
                _ => tracing::warn!(
                    config_key = config_keys::AUDIT_ENABLED,
                    raw_value = %raw,
                    "审计开关配置格式错误，使用默认值"
                ),
            }
        }

        if let Some(actor) = self.get_global_value(config_keys::ACTOR)? {
            if !actor.trim().is_empty() {
                config.actor = actor.trim().to_string();
            }
        }

        Ok(config)
    }

    /// 以数据库路径加载完整交换配置（默认值 + config_kv 覆写）
    pub fn load_exchange_config(db_path: &str) -> RepositoryResult<ExchangeConfig> {
        let manager = Self::new(db_path)?;
        manager.apply_overrides(ExchangeConfig::new(db_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn memory_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_overrides_apply_when_valid() {
        let manager = memory_manager();
        manager.set_global_value(config_keys::REPLENISH_SPREAD, "3").unwrap();
        manager.set_global_value(config_keys::AUDIT_ENABLED, "false").unwrap();
        manager.set_global_value(config_keys::OFF_LAYOUT_SPOT_NAME, " STAGING ").unwrap();
        manager.set_global_value(config_keys::ACTOR, "dispatcher").unwrap();

        let config = manager.apply_overrides(ExchangeConfig::new("x.db")).unwrap();
        assert_eq!(config.replenish_spread, 3);
        assert!(!config.audit_enabled);
        assert_eq!(config.off_layout_spot_name, "STAGING");
        assert_eq!(config.actor, "dispatcher");
    }

    #[test]
    fn test_invalid_overrides_keep_defaults() {
        let manager = memory_manager();
        manager.set_global_value(config_keys::REPLENISH_SPREAD, "lots").unwrap();
        manager.set_global_value(config_keys::AUDIT_ENABLED, "maybe").unwrap();

        let config = manager.apply_overrides(ExchangeConfig::new("x.db")).unwrap();
        assert_eq!(config.replenish_spread, 2);
        assert!(config.audit_enabled);
    }

    #[test]
    fn test_set_global_value_upserts() {
        let manager = memory_manager();
        manager.set_global_value(config_keys::ACTOR, "a").unwrap();
        manager.set_global_value(config_keys::ACTOR, "b").unwrap();

        let snapshot = manager.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(config_keys::ACTOR).map(String::as_str), Some("b"));
    }
}
