// ==========================================
// 模型铁路调车场交换系统 - 交换配置
// ==========================================
// 职责: 交换引擎的运行参数（构造时注入编排器）
// 来源: 默认值 → config_kv 覆写（见 ConfigManager）
// ==========================================

use crate::domain::types::OFF_LAYOUT_SPOT_NAME;
use serde::{Deserialize, Serialize};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "RAILYARD_EXCHANGE_DB_PATH";

/// 默认数据库文件名（工作目录下）
pub const DEFAULT_DB_FILE: &str = "railcars.db";

/// 默认补车随机区间半宽: [moved-2, moved+2]
pub const DEFAULT_REPLENISH_SPREAD: usize = 2;

/// 交换配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// SQLite 数据库路径
    pub db_path: String,
    /// 场外暂存车位名称
    pub off_layout_spot_name: String,
    /// 补车随机区间半宽
    pub replenish_spread: usize,
    /// 是否写入 action_log
    pub audit_enabled: bool,
    /// 审计日志中的操作人
    pub actor: String,
}

impl ExchangeConfig {
    /// 使用默认参数创建配置
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            off_layout_spot_name: OFF_LAYOUT_SPOT_NAME.to_string(),
            replenish_spread: DEFAULT_REPLENISH_SPREAD,
            audit_enabled: true,
            actor: "system".to_string(),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::new(default_db_path())
    }
}

/// 默认数据库路径
///
/// 优先使用环境变量 RAILYARD_EXCHANGE_DB_PATH（便于调试/测试/CI），
/// 否则为工作目录下的 railcars.db
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    DEFAULT_DB_FILE.to_string()
}
