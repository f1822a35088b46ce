// ==========================================
// 模型铁路调车场交换系统 - API层错误类型
// ==========================================
// 职责: 把仓储 / 引擎 / 导入错误转换为调用方可读的错误
// ==========================================

use crate::engine::error::ExchangeError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 车位不变式（存储层兜底检查命中）
    // ==========================================
    #[error("车位约束违反: {0}")]
    SpotConstraintViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("重复记录: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("引用不存在: {}", msg))
            }
            err @ (RepositoryError::CapacityExceeded { .. }
            | RepositoryError::CarTypeNotAllowed { .. }) => {
                ApiError::SpotConstraintViolation(err.to_string())
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
        }
    }
}

// ==========================================
// 从 ExchangeError 转换
// ==========================================
impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::NotFound { entity, name } => {
                ApiError::NotFound(format!("{} '{}' 不存在", entity, name))
            }
            ExchangeError::InvalidRequest(msg) => ApiError::InvalidInput(msg),
            ExchangeError::Transaction(msg) => ApiError::DatabaseTransactionError(msg),
            ExchangeError::Repository(err) => ApiError::from(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {}", path)),
            ImportError::OffLayoutSpotMissing(name) => {
                ApiError::NotFound(format!("场外暂存车位 '{}'", name))
            }
            ImportError::Repository(err) => ApiError::from(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
