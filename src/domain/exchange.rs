// ==========================================
// 模型铁路调车场交换系统 - 交换结果模型
// ==========================================
// 依据: 外部接口 - exchange() 报告
// 用途: 记录 调车场→工业 / 工业→调车场 的每一次移动
// ==========================================

use crate::domain::car::Car;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CarMove - 单车移动记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarMove {
    pub car_number: String,
    pub road_name: String,
    pub car_type_name: String,
    pub from: String, // 起点标签
    pub to: String,   // 终点标签
}

impl CarMove {
    pub fn new(car: &Car, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            car_number: car.car_number.clone(),
            road_name: car.road_name.clone(),
            car_type_name: car.car_type_name.clone(),
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for CarMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} → {}",
            self.road_name, self.car_number, self.from, self.to
        )
    }
}

// ==========================================
// UnplacedCar - 无法放置的车辆
// ==========================================
// 说明: 不是错误，车辆留在调车场
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedCar {
    pub car_number: String,
    pub road_name: String,
    pub car_type_name: String,
}

impl From<&Car> for UnplacedCar {
    fn from(car: &Car) -> Self {
        Self {
            car_number: car.car_number.clone(),
            road_name: car.road_name.clone(),
            car_type_name: car.car_type_name.clone(),
        }
    }
}

// ==========================================
// ExchangeStatus - 交换终态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeStatus {
    Committed,        // 正常提交
    YardEmpty,        // 调车场无车，未做任何修改
    NothingRequested, // 请求数量归一化后为 0，未做任何修改
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeStatus::Committed => write!(f, "COMMITTED"),
            ExchangeStatus::YardEmpty => write!(f, "YARD_EMPTY"),
            ExchangeStatus::NothingRequested => write!(f, "NOTHING_REQUESTED"),
        }
    }
}

// ==========================================
// ReplenishmentDraw - 补车抽样结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentDraw {
    pub low: usize,             // 随机区间下界 max(0, moved-spread)
    pub high: usize,            // 随机区间上界 moved+spread
    pub desired: usize,         // 抽到的期望补车数
    pub yard_free_slots: usize, // 外发完成后调车场空位
    pub target: usize,          // min(desired, yard_free_slots)
    pub taken: usize,           // 实际补入数量
}

impl ReplenishmentDraw {
    /// 候选不足导致的缺口
    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.taken)
    }
}

// ==========================================
// ExchangeReport - 调车场↔工业交换报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeReport {
    pub yard_name: String,
    pub status: ExchangeStatus,
    pub requested: usize, // 归一化后的请求数量
    pub seed: Option<u64>,
    pub moved_to_industries: Vec<CarMove>,
    pub displaced_to_yard: Vec<CarMove>,
    pub replenished_to_yard: Vec<CarMove>,
    pub unplaced: Vec<UnplacedCar>,
    pub replenishment: Option<ReplenishmentDraw>,
}

impl ExchangeReport {
    /// 未修改任何数据的提前返回
    pub fn early_return(yard_name: &str, status: ExchangeStatus) -> Self {
        Self {
            yard_name: yard_name.to_string(),
            status,
            requested: 0,
            seed: None,
            moved_to_industries: Vec::new(),
            displaced_to_yard: Vec::new(),
            replenished_to_yard: Vec::new(),
            unplaced: Vec::new(),
            replenishment: None,
        }
    }

    /// 本次交换写入的车辆移动总数
    pub fn total_writes(&self) -> usize {
        self.moved_to_industries.len() + self.displaced_to_yard.len() + self.replenished_to_yard.len()
    }
}

impl fmt::Display for ExchangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ExchangeStatus::YardEmpty => {
                return writeln!(f, "调车场 '{}' 当前没有车辆。", self.yard_name);
            }
            ExchangeStatus::NothingRequested => {
                return writeln!(f, "无需移动任何车辆。");
            }
            ExchangeStatus::Committed => {}
        }

        writeln!(f, "交换完成，移动汇总:")?;
        if self.moved_to_industries.is_empty() {
            writeln!(f, "  没有车辆从调车场移往工业车位。")?;
        } else {
            for m in &self.moved_to_industries {
                writeln!(f, "  {}", m)?;
            }
        }

        if !self.unplaced.is_empty() {
            writeln!(f)?;
            writeln!(f, "无可用车位（仍留在调车场 '{}'）:", self.yard_name)?;
            for car in &self.unplaced {
                writeln!(f, "  {} {} ({})", car.road_name, car.car_number, car.car_type_name)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "从工业车位移入调车场:")?;
        if self.displaced_to_yard.is_empty() && self.replenished_to_yard.is_empty() {
            writeln!(f, "  没有车辆从工业车位移入调车场。")?;
        } else {
            for m in self.displaced_to_yard.iter().chain(self.replenished_to_yard.iter()) {
                writeln!(f, "  {}", m)?;
            }
        }

        if let Some(draw) = &self.replenishment {
            writeln!(f)?;
            writeln!(
                f,
                "补车: 区间 {}-{}, 抽取 {}, 调车场空位 {}, 目标 {}, 实际 {}",
                draw.low, draw.high, draw.desired, draw.yard_free_slots, draw.target, draw.taken
            )?;
            if draw.shortfall() > 0 {
                writeln!(f, "  候选车辆不足，缺口 {}", draw.shortfall())?;
            }
        }

        if let Some(seed) = self.seed {
            writeln!(f, "随机种子: {}", seed)?;
        }
        Ok(())
    }
}

// ==========================================
// OffLayoutReport - 调车场↔场外交换报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffLayoutReport {
    pub yard_name: String,
    pub requested: usize, // 归一化并按调车场容量截断后的数量
    pub seed: Option<u64>,
    pub sent_off_layout: Vec<CarMove>,
    pub pulled_to_yard: Vec<CarMove>,
}

impl OffLayoutReport {
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.pulled_to_yard.len())
    }
}

impl fmt::Display for OffLayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sent_off_layout.is_empty() {
            writeln!(f, "调车场 '{}' 当前没有车辆。", self.yard_name)?;
        }
        for m in &self.sent_off_layout {
            writeln!(f, "  {}", m)?;
        }

        if self.pulled_to_yard.is_empty() {
            writeln!(f, "场外暂存区没有可移入的车辆。")?;
        }
        for m in &self.pulled_to_yard {
            writeln!(f, "  {}", m)?;
        }

        if self.shortfall() > 0 {
            writeln!(f, "请求 {} 辆，缺口 {}", self.requested, self.shortfall())?;
        }
        writeln!(f, "交换完成。")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_car() -> Car {
        Car {
            car_number: "1001".to_string(),
            car_type_id: 1,
            car_type_name: "boxcar".to_string(),
            road_name: "ATSF".to_string(),
            spot_id: 7,
        }
    }

    #[test]
    fn test_car_move_display() {
        let m = CarMove::new(&sample_car(), "Yard A", "Acme Feed / Dock 1");
        assert_eq!(m.to_string(), "ATSF 1001: Yard A → Acme Feed / Dock 1");
    }

    #[test]
    fn test_replenishment_shortfall() {
        let draw = ReplenishmentDraw {
            low: 1,
            high: 5,
            desired: 4,
            yard_free_slots: 6,
            target: 4,
            taken: 1,
        };
        assert_eq!(draw.shortfall(), 3);
    }

    #[test]
    fn test_early_return_report_renders() {
        let report = ExchangeReport::early_return("Yard A", ExchangeStatus::YardEmpty);
        assert_eq!(report.total_writes(), 0);
        assert!(report.to_string().contains("Yard A"));
    }

    #[test]
    fn test_report_serializes_status() {
        let report = ExchangeReport::early_return("Yard A", ExchangeStatus::NothingRequested);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "NOTHING_REQUESTED");
    }
}
