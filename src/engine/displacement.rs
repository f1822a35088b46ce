// ==========================================
// 模型铁路调车场交换系统 - 置换解析器
// ==========================================
// 职责: 无空位时，逐出单车位的驻留车辆到调车场，为来车腾位
// 红线:
// - 只置换 capacity == 1 且已占用的车位（多车位只填不换）
// - 调车场必须有空位接收被逐出车辆，否则跳过该车位
//   （来车已记离场，满场调车场仍可与单车位互换）
// - 占用者取自当前内存状态，本批刚放入的车辆同样可被逐出
// - 每辆来车最多一次置换，不做链式置换
// ==========================================

use crate::domain::car::Car;
use crate::domain::spot::SpotCapacity;
use crate::engine::spot_arena::{SpotArena, YardLedger};
use tracing::debug;

// ==========================================
// Trait: OccupantSelector - 驻留车辆选择规则
// ==========================================
pub trait OccupantSelector {
    /// 从驻留车辆中选出被逐出的一辆
    fn select<'a>(&self, residents: &'a [Car]) -> Option<&'a Car>;
}

/// 默认规则: 车号最小的驻留车辆（单车位上只有一辆，结果唯一）
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstOccupant;

impl OccupantSelector for FirstOccupant {
    fn select<'a>(&self, residents: &'a [Car]) -> Option<&'a Car> {
        residents.iter().min_by(|a, b| a.car_number.cmp(&b.car_number))
    }
}

/// 置换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displacement {
    pub slot_idx: usize,
    pub evicted: Car,
}

// ==========================================
// DisplacementResolver - 置换解析器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DisplacementResolver<S: OccupantSelector = FirstOccupant> {
    selector: S,
}

impl DisplacementResolver<FirstOccupant> {
    pub fn new() -> Self {
        Self {
            selector: FirstOccupant,
        }
    }
}

impl<S: OccupantSelector> DisplacementResolver<S> {
    /// 使用自定义驻留车辆选择规则
    pub fn with_selector(selector: S) -> Self {
        Self { selector }
    }

    /// 尝试为来车腾出一个车位
    ///
    /// 按目录顺序扫描合格车位；成功时驻留车辆已从竞技场移除、
    /// 调车场账本已 +1，来车的入位由调用方完成。
    /// 调用前来车须已在账本上记离场。
    ///
    /// # 参数
    /// - `car`: 来车
    /// - `eligible`: 接受该车型的车位索引（目录顺序）
    /// - `arena`: 候选车位竞技场（会被修改）
    /// - `yard`: 调车场账本（会被修改）
    ///
    /// # 返回
    /// - Some(Displacement): 被逐出的车辆及车位
    /// - None: 无可置换车位
    pub fn try_displace(
        &self,
        car: &Car,
        eligible: &[usize],
        arena: &mut SpotArena,
        yard: &mut YardLedger,
    ) -> Option<Displacement> {
        for &idx in eligible {
            let slot = arena.slot(idx);
            if !slot.occupancy.is_single_and_occupied() {
                continue;
            }
            // 逐出一辆仍无空位（数据本身已超限）→ 不处理
            if slot.occupancy.occupancy > slot.occupancy.spot.capacity {
                continue;
            }
            if yard.free_slots() == 0 {
                debug!(
                    car_number = %car.car_number,
                    spot = %slot.occupancy.spot.label(),
                    "调车场无空位接收被置换车辆，跳过"
                );
                continue;
            }
            let Some(occupant) = self.selector.select(&slot.residents) else {
                continue;
            };
            let occupant_number = occupant.car_number.clone();

            let evicted = arena.evict(idx, &occupant_number)?;
            yard.receive();
            return Some(Displacement {
                slot_idx: idx,
                evicted,
            });
        }
        None
    }
}
