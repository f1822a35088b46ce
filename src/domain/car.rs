// ==========================================
// 模型铁路调车场交换系统 - 车辆领域模型
// ==========================================
// 依据: 数据模型 - Car
// 红线: 每辆车在任意时刻只停放在一个车位
// ==========================================

use crate::domain::types::IndustryType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ==========================================
// Car - 车辆
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub car_number: String,    // 车号（唯一）
    pub car_type_id: i64,      // 车型ID
    pub car_type_name: String, // 车型名称
    pub road_name: String,     // 路局标记
    pub spot_id: i64,          // 当前车位
}

impl Car {
    /// 报表显示: "路局标记 车号"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.road_name, self.car_number)
    }

    /// 调车场内的列出顺序: 路局标记, 再按车号
    pub fn listing_order(a: &Car, b: &Car) -> Ordering {
        a.road_name
            .cmp(&b.road_name)
            .then_with(|| a.car_number.cmp(&b.car_number))
    }
}

// ==========================================
// CarLocation - 车辆位置（汇总报表行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarLocation {
    pub industry_type: IndustryType,
    pub industry_name: String,
    pub spot_name: String,
    pub road_name: String,
    pub car_number: String,
}
