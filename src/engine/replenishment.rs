// ==========================================
// 模型铁路调车场交换系统 - 补车抽样器
// ==========================================
// 职责: 外发完成后，从工业车位随机抽取车辆补入调车场
// 规则:
// - 期望数量从 [max(0, moved-spread), moved+spread] 均匀抽取
// - 截断到调车场当前空位，不得超出
// - 排除本次刚放置的车辆、本次刚填入的车位（按身份排除）
// - 候选不足时部分满足，不是错误
// ==========================================

use crate::config::exchange_config::DEFAULT_REPLENISH_SPREAD;
use crate::domain::car::Car;
use crate::domain::exchange::ReplenishmentDraw;
use crate::domain::spot::AllowedCarTypes;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// 补车排除条件（按身份）
#[derive(Debug, Clone, Default)]
pub struct ReplenishmentExclusions {
    pub car_numbers: HashSet<String>,
    pub spot_ids: HashSet<i64>,
}

impl ReplenishmentExclusions {
    pub fn excludes(&self, car: &Car) -> bool {
        self.car_numbers.contains(&car.car_number) || self.spot_ids.contains(&car.spot_id)
    }
}

// ==========================================
// ReplenishmentSampler - 补车抽样器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ReplenishmentSampler {
    spread: usize,
}

impl Default for ReplenishmentSampler {
    fn default() -> Self {
        Self::new(DEFAULT_REPLENISH_SPREAD)
    }
}

impl ReplenishmentSampler {
    pub fn new(spread: usize) -> Self {
        Self { spread }
    }

    /// 期望补车数的抽取区间（闭区间）
    pub fn draw_range(&self, moved_count: usize) -> (usize, usize) {
        (
            moved_count.saturating_sub(self.spread),
            moved_count + self.spread,
        )
    }

    /// 抽取补车车辆
    ///
    /// # 参数
    /// - `rng`: 唯一随机源（数量抽取 + 车辆抽样共用）
    /// - `pool`: 工业车位上的全部车辆（按车号排序，保证同种子可复现）
    /// - `exclusions`: 本次外发触及的车辆与车位
    /// - `yard_allowed`: 调车场允许车型（通常为任意）
    /// - `moved_count`: 本次成功外发的车辆数
    /// - `yard_free_slots`: 外发完成后调车场空位
    ///
    /// # 返回
    /// (抽样记录, 选中的车辆)
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        pool: &[Car],
        exclusions: &ReplenishmentExclusions,
        yard_allowed: &AllowedCarTypes,
        moved_count: usize,
        yard_free_slots: usize,
    ) -> (ReplenishmentDraw, Vec<Car>) {
        let (low, high) = self.draw_range(moved_count);
        let desired = rng.gen_range(low..=high);
        let target = desired.min(yard_free_slots);

        let candidates: Vec<Car> = pool
            .iter()
            .filter(|car| !exclusions.excludes(car))
            .filter(|car| yard_allowed.accepts(car.car_type_id))
            .cloned()
            .collect();

        let selected = Self::select(rng, &candidates, target);

        debug!(
            low,
            high,
            desired,
            yard_free_slots,
            target,
            candidates = candidates.len(),
            taken = selected.len(),
            "补车抽样"
        );
        if selected.len() < target {
            warn!(
                target,
                taken = selected.len(),
                "补车候选不足，部分满足"
            );
        }

        let draw = ReplenishmentDraw {
            low,
            high,
            desired,
            yard_free_slots,
            target,
            taken: selected.len(),
        };
        (draw, selected)
    }

    /// 从候选中均匀抽取至多 count 辆（结果按车号排序）
    pub fn select<R: Rng + ?Sized>(rng: &mut R, candidates: &[Car], count: usize) -> Vec<Car> {
        let mut selected: Vec<Car> = candidates.choose_multiple(rng, count).cloned().collect();
        selected.sort_by(|a, b| a.car_number.cmp(&b.car_number));
        selected
    }
}
