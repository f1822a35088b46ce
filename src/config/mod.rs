// ==========================================
// 模型铁路调车场交换系统 - 配置层
// ==========================================
// 职责: 交换参数管理,支持 config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod exchange_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use exchange_config::{default_db_path, ExchangeConfig};
