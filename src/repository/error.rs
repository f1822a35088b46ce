// ==========================================
// 模型铁路调车场交换系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束违反按 SQLite 扩展错误码区分
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 查找 =====
    #[error("记录未找到: {entity}={id}")]
    NotFound { entity: String, id: String },

    // ===== 连接与查询 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 表约束 =====
    #[error("重复记录: {0}")]
    UniqueConstraintViolation(String),

    #[error("引用不存在: {0}")]
    ForeignKeyViolation(String),

    // ===== 车位不变式（写入前复核） =====
    #[error("车位 '{spot_name}' 已满: 容量 {capacity}, 当前 {occupancy}")]
    CapacityExceeded {
        spot_name: String,
        capacity: u32,
        occupancy: u32,
    },

    #[error("车位 '{spot_name}' 不接受车型 '{car_type_name}' (车辆 {car_number})")]
    CarTypeNotAllowed {
        car_number: String,
        car_type_name: String,
        spot_name: String,
    },

    // ===== 布局数据 =====
    #[error("布局数据无效: {0}")]
    ValidationError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let msg = msg.unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(msg)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(msg),
                    ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                        RepositoryError::ValidationError(msg)
                    }
                    _ => RepositoryError::DatabaseQueryError(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "row".to_string(),
                id: "?".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
