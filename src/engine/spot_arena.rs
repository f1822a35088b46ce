// ==========================================
// 模型铁路调车场交换系统 - 车位占用竞技场
// ==========================================
// 职责: 放置规划期间的内存占用表（按索引寻址，原地更新）
// 约束: 规划期间不回查数据库，同批后续车辆看到更新后的占用
// ==========================================

use crate::domain::car::Car;
use crate::domain::spot::{AllowedCarTypes, SpotCapacity, SpotOccupancy};
use std::collections::HashMap;

// ==========================================
// SpotSlot - 单个候选车位
// ==========================================
#[derive(Debug, Clone)]
pub struct SpotSlot {
    pub occupancy: SpotOccupancy,
    pub allowed: AllowedCarTypes,
    /// 当前停在此处的车辆（含本批刚放入的，均可被置换）
    pub residents: Vec<Car>,
}

impl SpotSlot {
    pub fn accepts(&self, car: &Car) -> bool {
        self.allowed.accepts(car.car_type_id)
    }

    pub fn spot_id(&self) -> i64 {
        self.occupancy.spot.spot_id
    }
}

// ==========================================
// SpotArena - 候选车位集合（目录顺序）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SpotArena {
    slots: Vec<SpotSlot>,
    index: HashMap<i64, usize>,
}

impl SpotArena {
    /// 构造竞技场
    ///
    /// # 参数
    /// - `candidates`: 候选车位快照（已按目录顺序排列）
    /// - `allowed`: 车位ID → 允许车型（缺省 = 接受任意）
    /// - `residents`: 当前停在这些车位上的车辆
    pub fn new(
        candidates: Vec<SpotOccupancy>,
        allowed: &HashMap<i64, AllowedCarTypes>,
        residents: Vec<Car>,
    ) -> Self {
        let mut by_spot: HashMap<i64, Vec<Car>> = HashMap::new();
        for car in residents {
            by_spot.entry(car.spot_id).or_default().push(car);
        }

        let mut slots = Vec::with_capacity(candidates.len());
        let mut index = HashMap::with_capacity(candidates.len());
        for occupancy in candidates {
            let spot_id = occupancy.spot.spot_id;
            index.insert(spot_id, slots.len());
            slots.push(SpotSlot {
                allowed: allowed.get(&spot_id).cloned().unwrap_or_default(),
                residents: by_spot.remove(&spot_id).unwrap_or_default(),
                occupancy,
            });
        }

        Self { slots, index }
    }

    pub fn slots(&self) -> &[SpotSlot] {
        &self.slots
    }

    pub fn slot(&self, idx: usize) -> &SpotSlot {
        &self.slots[idx]
    }

    pub fn slot_by_spot_id(&self, spot_id: i64) -> Option<&SpotSlot> {
        self.index.get(&spot_id).map(|&idx| &self.slots[idx])
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 接受该车型的车位索引（目录顺序）
    pub fn eligible_for(&self, car: &Car) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.accepts(car))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// 首个有空位的合格车位
    pub fn first_with_room(&self, eligible: &[usize]) -> Option<usize> {
        eligible
            .iter()
            .copied()
            .find(|&idx| self.slots[idx].occupancy.has_room())
    }

    /// 车辆进入车位: 占用 +1，并加入驻留列表
    pub fn occupy(&mut self, idx: usize, car: Car) {
        let slot = &mut self.slots[idx];
        slot.occupancy.occupancy += 1;
        slot.residents.push(car);
    }

    /// 驻留车辆离开车位: 占用 -1，并从驻留列表移除
    pub fn evict(&mut self, idx: usize, car_number: &str) -> Option<Car> {
        let slot = &mut self.slots[idx];
        let pos = slot.residents.iter().position(|c| c.car_number == car_number)?;
        let car = slot.residents.remove(pos);
        slot.occupancy.occupancy = slot.occupancy.occupancy.saturating_sub(1);
        Some(car)
    }
}

// ==========================================
// YardLedger - 调车场占用账本
// ==========================================
// 规则:
// - 外发车辆在扫描车位前先记离场（depart），其空位可接收被逐出车辆
// - 每次置换，被逐出的车辆进入调车场（receive）
// - 无法放置的车辆退回（receive）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YardLedger {
    pub capacity: u32,
    pub occupancy: u32,
}

impl YardLedger {
    pub fn new(capacity: u32, occupancy: u32) -> Self {
        Self { capacity, occupancy }
    }

    pub fn free_slots(&self) -> u32 {
        self.capacity.saturating_sub(self.occupancy)
    }

    pub fn depart(&mut self) {
        self.occupancy = self.occupancy.saturating_sub(1);
    }

    pub fn receive(&mut self) {
        self.occupancy += 1;
    }
}
