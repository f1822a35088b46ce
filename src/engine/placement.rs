// ==========================================
// 模型铁路调车场交换系统 - 放置规划器
// ==========================================
// 职责: 为每辆外发车辆决定目标车位（首次适配 + 置换）
// 输入: 有序车辆列表 + 候选车位竞技场 + 调车场账本
// 输出: 每辆车 Placed / Displaced / Unplaced
// 红线:
// - 规划阶段无随机性，相同输入 → 相同结果
// - 贪心、顺序相关，不追求全局最优匹配
// ==========================================

use crate::domain::car::Car;
use crate::engine::displacement::{DisplacementResolver, FirstOccupant, OccupantSelector};
use crate::engine::spot_arena::{SpotArena, YardLedger};
use tracing::{debug, instrument, warn};

/// 单车放置结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// 首次适配: 放入有空位的车位
    Placed { spot_id: i64 },
    /// 置换: 驻留车辆被逐出到调车场，来车占用该车位
    Displaced { spot_id: i64, evicted: Car },
    /// 无合格车位，留在调车场（不是错误）
    Unplaced,
}

/// 单车放置决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDecision {
    pub car: Car,
    pub outcome: PlacementOutcome,
}

impl PlacementDecision {
    pub fn is_placed(&self) -> bool {
        !matches!(self.outcome, PlacementOutcome::Unplaced)
    }

    /// 车辆最终所在车位（未放置时为 None）
    pub fn target_spot_id(&self) -> Option<i64> {
        match &self.outcome {
            PlacementOutcome::Placed { spot_id } | PlacementOutcome::Displaced { spot_id, .. } => {
                Some(*spot_id)
            }
            PlacementOutcome::Unplaced => None,
        }
    }
}

// ==========================================
// PlacementPlanner - 放置规划器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PlacementPlanner<S: OccupantSelector = FirstOccupant> {
    resolver: DisplacementResolver<S>,
}

impl PlacementPlanner<FirstOccupant> {
    pub fn new() -> Self {
        Self {
            resolver: DisplacementResolver::new(),
        }
    }
}

impl<S: OccupantSelector> PlacementPlanner<S> {
    pub fn with_resolver(resolver: DisplacementResolver<S>) -> Self {
        Self { resolver }
    }

    /// 按给定顺序为每辆车规划目标车位
    ///
    /// 规则:
    /// 0) 来车先记离场，腾出的调车场空位可接收被逐出车辆
    /// 1) 按目录顺序扫描接受该车型的车位
    /// 2) 首个 occupancy < capacity 的车位接收该车，内存占用立即 +1
    /// 3) 否则尝试置换（单车位 + 调车场有空位）
    /// 4) 仍失败 → Unplaced，车辆留在调车场（撤销离场记账）
    ///
    /// # 参数
    /// - `cars`: 外发车辆（调用方决定顺序）
    /// - `arena`: 候选车位（会被修改）
    /// - `yard`: 来源调车场账本（会被修改）
    #[instrument(skip_all, fields(cars_count = cars.len(), spots_count = arena.len()))]
    pub fn place(
        &self,
        cars: &[Car],
        arena: &mut SpotArena,
        yard: &mut YardLedger,
    ) -> Vec<PlacementDecision> {
        let mut decisions = Vec::with_capacity(cars.len());

        for car in cars {
            let eligible = arena.eligible_for(car);
            yard.depart();

            // 1. 首次适配
            if let Some(idx) = arena.first_with_room(&eligible) {
                arena.occupy(idx, car.clone());
                let spot_id = arena.slot(idx).spot_id();
                debug!(
                    car_number = %car.car_number,
                    spot = %arena.slot(idx).occupancy.spot.label(),
                    "首次适配"
                );
                decisions.push(PlacementDecision {
                    car: car.clone(),
                    outcome: PlacementOutcome::Placed { spot_id },
                });
                continue;
            }

            // 2. 置换
            if let Some(displacement) = self.resolver.try_displace(car, &eligible, arena, yard) {
                arena.occupy(displacement.slot_idx, car.clone());
                let spot_id = arena.slot(displacement.slot_idx).spot_id();
                debug!(
                    car_number = %car.car_number,
                    evicted = %displacement.evicted.car_number,
                    spot = %arena.slot(displacement.slot_idx).occupancy.spot.label(),
                    "置换"
                );
                decisions.push(PlacementDecision {
                    car: car.clone(),
                    outcome: PlacementOutcome::Displaced {
                        spot_id,
                        evicted: displacement.evicted,
                    },
                });
                continue;
            }

            // 3. 无法放置
            yard.receive();
            warn!(
                car_number = %car.car_number,
                car_type = %car.car_type_name,
                eligible_spots = eligible.len(),
                "无可用车位，车辆留在调车场"
            );
            decisions.push(PlacementDecision {
                car: car.clone(),
                outcome: PlacementOutcome::Unplaced,
            });
        }

        decisions
    }
}
