// ==========================================
// 模型铁路调车场交换系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("字段缺失 (行 {row}): {field}")]
    MissingField { row: usize, field: String },

    #[error("字段值无效 (行 {row}, 字段 {field}): {message}")]
    InvalidValue {
        row: usize,
        field: String,
        message: String,
    },

    // ===== 布局错误 =====
    #[error("场外暂存车位不存在: {0}")]
    OffLayoutSpotMissing(String),

    // ===== 数据库错误 =====
    #[error("写入失败 (行 {row}): {source}")]
    RowRejected {
        row: usize,
        #[source]
        source: RepositoryError,
    },

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
