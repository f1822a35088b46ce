// ==========================================
// 模型铁路调车场交换系统 - API层
// ==========================================
// 职责: 对外入口，错误转换为调用方可读信息
// ==========================================

pub mod error;
pub mod exchange_api;

pub use error::{ApiError, ApiResult};
pub use exchange_api::ExchangeApi;
