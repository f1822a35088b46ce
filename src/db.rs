// ==========================================
// 模型铁路调车场交换系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 统一建表（幂等）
// - 一次交换 = 一个事务，任何退出路径未提交即回滚
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句（全部 IF NOT EXISTS，可重复执行）
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS industry_types (
    industry_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
    industry_type_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS industries (
    industry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    industry_name TEXT NOT NULL UNIQUE,
    industry_type_id INTEGER NOT NULL REFERENCES industry_types(industry_type_id)
);

CREATE TABLE IF NOT EXISTS car_spots (
    spot_id INTEGER PRIMARY KEY AUTOINCREMENT,
    spot_name TEXT NOT NULL,
    industry_id INTEGER NOT NULL REFERENCES industries(industry_id),
    capacity INTEGER NOT NULL CHECK (capacity > 0),
    service_frequency REAL
);

CREATE TABLE IF NOT EXISTS car_types (
    car_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
    car_type_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS spot_allowed_car_types (
    spot_id INTEGER NOT NULL REFERENCES car_spots(spot_id),
    car_type_id INTEGER NOT NULL REFERENCES car_types(car_type_id),
    PRIMARY KEY (spot_id, car_type_id)
);

CREATE TABLE IF NOT EXISTS cars (
    car_number TEXT PRIMARY KEY,
    car_type_id INTEGER NOT NULL REFERENCES car_types(car_type_id),
    build_year INTEGER,
    road_name TEXT NOT NULL,
    status TEXT,
    spot_id INTEGER NOT NULL REFERENCES car_spots(spot_id)
);

CREATE INDEX IF NOT EXISTS idx_cars_spot_id ON cars(spot_id);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表并写入 schema_version（幂等）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// TransactionGuard - 交换事务守卫
// ==========================================
// 说明:
// - 仓储各自持有 Arc<Mutex<Connection>> 并逐条加锁执行，
//   因此事务用显式 BEGIN/COMMIT 包住整次交换，而不是持锁的 rusqlite::Transaction。
// - BEGIN IMMEDIATE: 交换期间独占写入
// - Drop 时若未提交则 ROLLBACK
pub struct TransactionGuard {
    conn: Arc<Mutex<Connection>>,
    finished: bool,
}

impl TransactionGuard {
    /// 开启写事务
    pub fn begin(conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            guard
                .execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| format!("开启事务失败: {}", e))?;
        }
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// 提交事务
    pub fn commit(mut self) -> Result<(), String> {
        let guard = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        guard
            .execute_batch("COMMIT")
            .map_err(|e| format!("提交事务失败: {}", e))?;
        drop(guard);
        self.finished = true;
        Ok(())
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.conn.lock() {
            Ok(guard) => {
                if let Err(e) = guard.execute_batch("ROLLBACK") {
                    tracing::warn!("事务回滚失败: {}", e);
                } else {
                    tracing::debug!("事务未提交，已回滚");
                }
            }
            Err(e) => tracing::warn!("事务回滚时锁获取失败: {}", e),
        }
    }
}
