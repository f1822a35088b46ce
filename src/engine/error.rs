// ==========================================
// 模型铁路调车场交换系统 - 引擎层错误类型
// ==========================================
// 结构性错误: 在任何写入之前中止（NotFound / InvalidRequest）
// 单车无法放置、补车不足不是错误，记录在报告中
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// 调车场名称无法解析为 Yard 车位，或场外暂存车位缺失
    #[error("未找到{entity}: {name}")]
    NotFound { entity: String, name: String },

    /// 请求数量为负或非数字、调车场名称为空
    #[error("无效请求: {0}")]
    InvalidRequest(String),

    #[error("事务失败: {0}")]
    Transaction(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<rusqlite::Error> for ExchangeError {
    fn from(err: rusqlite::Error) -> Self {
        ExchangeError::Repository(RepositoryError::from(err))
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
