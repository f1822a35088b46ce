// ==========================================
// 模型铁路调车场交换系统 - 车位领域模型
// ==========================================
// 依据: 数据模型 - Industry / Spot / AllowedCarTypes
// 红线: occupancy <= capacity
// ==========================================

use crate::domain::types::IndustryType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// CarType - 车型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarType {
    pub car_type_id: i64,
    pub car_type_name: String, // 例如 "boxcar"
}

// ==========================================
// Industry - 产业（车位分组）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub industry_id: i64,
    pub industry_name: String,
    pub industry_type: IndustryType,
}

// ==========================================
// Spot - 车位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub spot_id: i64,
    pub spot_name: String,
    pub industry_id: i64,
    pub industry_name: String,
    pub industry_type: IndustryType,
    pub capacity: u32,                  // 最大同时停放车辆数 (> 0)
    pub service_frequency: Option<f64>, // 服务频率（引擎不使用）
}

impl Spot {
    /// 报表中使用的车位标签: "产业 / 车位"
    pub fn label(&self) -> String {
        format!("{} / {}", self.industry_name, self.spot_name)
    }
}

// ==========================================
// SpotOccupancy - 车位占用快照
// ==========================================
// 用途: 放置规划时的候选车位（内存中递增，不回查数据库）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotOccupancy {
    pub spot: Spot,
    pub occupancy: u32, // 当前停放车辆数
}

// ==========================================
// Trait: SpotCapacity
// ==========================================
// 用途: 容量约束检查接口
pub trait SpotCapacity {
    /// 是否还有空位
    fn has_room(&self) -> bool;

    /// 剩余空位数
    fn free_slots(&self) -> u32;

    /// 是否为单车位且已被占用（可置换目标的容量前提）
    fn is_single_and_occupied(&self) -> bool;
}

impl SpotCapacity for SpotOccupancy {
    fn has_room(&self) -> bool {
        self.spot.industry_type.is_unbounded() || self.occupancy < self.spot.capacity
    }

    fn free_slots(&self) -> u32 {
        if self.spot.industry_type.is_unbounded() {
            return u32::MAX;
        }
        self.spot.capacity.saturating_sub(self.occupancy)
    }

    fn is_single_and_occupied(&self) -> bool {
        self.spot.capacity == 1 && self.occupancy >= 1
    }
}

// ==========================================
// AllowedCarTypes - 车位允许车型集合
// ==========================================
// 红线: 空集合 = 接受任意车型（不是"全部拒绝"）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedCarTypes(BTreeSet<i64>);

impl AllowedCarTypes {
    /// 接受任意车型
    pub fn any() -> Self {
        Self(BTreeSet::new())
    }

    /// 由车型ID列表构造
    pub fn from_ids<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    /// 判断车位是否接受该车型
    pub fn accepts(&self, car_type_id: i64) -> bool {
        self.0.is_empty() || self.0.contains(&car_type_id)
    }

    pub fn insert(&mut self, car_type_id: i64) {
        self.0.insert(car_type_id);
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}
