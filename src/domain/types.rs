// ==========================================
// 模型铁路调车场交换系统 - 领域类型定义
// ==========================================
// 依据: 数据模型 - IndustryType / 交换数量
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 场外暂存车位的保留名称
pub const OFF_LAYOUT_SPOT_NAME: &str = "OFF_LAYOUT";

// ==========================================
// 产业类型 (Industry Type)
// ==========================================
// 红线: 只有 Yard 车位是交换的来源/补给目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndustryType {
    Yard,      // 调车场
    Industry,  // 工业支线
    #[serde(rename = "Off-Layout")]
    OffLayout, // 场外暂存
}

impl IndustryType {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            IndustryType::Yard => "Yard",
            IndustryType::Industry => "Industry",
            IndustryType::OffLayout => "Off-Layout",
        }
    }

    /// 场外暂存区视为容量无上限
    pub fn is_unbounded(&self) -> bool {
        matches!(self, IndustryType::OffLayout)
    }
}

impl fmt::Display for IndustryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl std::str::FromStr for IndustryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yard" => Ok(IndustryType::Yard),
            "industry" => Ok(IndustryType::Industry),
            "off-layout" | "off_layout" | "offlayout" => Ok(IndustryType::OffLayout),
            other => Err(format!("未知产业类型: {}", other)),
        }
    }
}

// ==========================================
// 交换数量 (Move Count)
// ==========================================
// 输入: 整数 或 "all"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveCount {
    Count(usize),
    All,
}

impl MoveCount {
    /// 按可用数量归一化
    ///
    /// # 参数
    /// - `available`: 当前可移动的车辆数
    ///
    /// # 返回
    /// 实际要移动的数量（不超过 available）
    pub fn resolve(&self, available: usize) -> usize {
        match self {
            MoveCount::Count(n) => (*n).min(available),
            MoveCount::All => available,
        }
    }
}

impl fmt::Display for MoveCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCount::Count(n) => write!(f, "{}", n),
            MoveCount::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for MoveCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(MoveCount::All);
        }

        let value: i64 = trimmed
            .parse()
            .map_err(|_| format!("无效的数量: '{}'", trimmed))?;
        if value < 0 {
            return Err(format!("数量不能为负数: {}", value));
        }

        usize::try_from(value)
            .map(MoveCount::Count)
            .map_err(|_| format!("数量超出范围: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_type_parse_and_display() {
        assert_eq!("Yard".parse::<IndustryType>(), Ok(IndustryType::Yard));
        assert_eq!(" industry ".parse::<IndustryType>(), Ok(IndustryType::Industry));
        assert_eq!("Off-Layout".parse::<IndustryType>(), Ok(IndustryType::OffLayout));
        assert!("Depot".parse::<IndustryType>().is_err());

        assert_eq!(IndustryType::OffLayout.to_string(), "Off-Layout");
        assert!(IndustryType::OffLayout.is_unbounded());
        assert!(!IndustryType::Yard.is_unbounded());
    }

    #[test]
    fn test_move_count_parse() {
        assert_eq!("all".parse::<MoveCount>(), Ok(MoveCount::All));
        assert_eq!(" ALL ".parse::<MoveCount>(), Ok(MoveCount::All));
        assert_eq!("3".parse::<MoveCount>(), Ok(MoveCount::Count(3)));
        assert_eq!("0".parse::<MoveCount>(), Ok(MoveCount::Count(0)));
        assert!("-1".parse::<MoveCount>().is_err());
        assert!("three".parse::<MoveCount>().is_err());
        assert!("".parse::<MoveCount>().is_err());
    }

    #[test]
    fn test_move_count_resolve_clamps() {
        assert_eq!(MoveCount::Count(5).resolve(3), 3);
        assert_eq!(MoveCount::Count(2).resolve(3), 2);
        assert_eq!(MoveCount::All.resolve(4), 4);
        assert_eq!(MoveCount::Count(0).resolve(4), 0);
    }
}
