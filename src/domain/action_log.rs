// ==========================================
// 模型铁路调车场交换系统 - 操作日志领域模型
// ==========================================
// 红线: 每次提交的交换都必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,         // 日志ID (uuid v4)
    pub action_type: String,       // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,  // 操作时间戳
    pub actor: String,             // 操作人
    pub payload_json: Option<JsonValue>, // 交换报告 (JSON)
    pub detail: Option<String>,    // 详细描述
}

impl ActionLog {
    /// 以当前时间和新的 uuid 创建日志
    pub fn new(
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    YardExchange,      // 调车场 ↔ 工业
    OffLayoutExchange, // 调车场 ↔ 场外
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::YardExchange => write!(f, "YARD_EXCHANGE"),
            ActionType::OffLayoutExchange => write!(f, "OFF_LAYOUT_EXCHANGE"),
        }
    }
}
