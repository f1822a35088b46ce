// ==========================================
// 模型铁路调车场交换系统 - 交换编排器
// ==========================================
// 流程: 解析调车场 → 列出调车场车辆 → 放置 → 补车 → 提交
// 提前返回（无任何修改）: 调车场无车 / 请求数量归一化为 0
// 结构性错误（NotFound / InvalidRequest）: 事务回滚，无部分写入
// ==========================================

use crate::config::ExchangeConfig;
use crate::db::TransactionGuard;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::car::Car;
use crate::domain::exchange::{CarMove, ExchangeReport, ExchangeStatus, UnplacedCar};
use crate::domain::spot::Spot;
use crate::domain::types::{IndustryType, MoveCount};
use crate::engine::error::{ExchangeError, ExchangeResult};
use crate::engine::placement::{PlacementOutcome, PlacementPlanner};
use crate::engine::replenishment::{ReplenishmentExclusions, ReplenishmentSampler};
use crate::engine::repositories::ExchangeRepositories;
use crate::engine::rng::ExchangeRng;
use crate::engine::spot_arena::{SpotArena, YardLedger};
use tracing::{info, instrument, warn};

/// 解析命令行/接口传入的数量（整数或 "all"）
pub fn parse_move_count(raw: &str) -> ExchangeResult<MoveCount> {
    raw.parse::<MoveCount>().map_err(ExchangeError::InvalidRequest)
}

/// 校验并规整调车场名称
pub(crate) fn normalize_yard_name(yard_name: &str) -> ExchangeResult<&str> {
    let trimmed = yard_name.trim();
    if trimmed.is_empty() {
        return Err(ExchangeError::InvalidRequest("调车场名称不能为空".to_string()));
    }
    Ok(trimmed)
}

/// 解析调车场车位（不区分大小写，必须为 Yard 类型）
pub(crate) fn resolve_yard(repos: &ExchangeRepositories, yard_name: &str) -> ExchangeResult<Spot> {
    repos
        .spot_repo
        .find_yard_by_name(yard_name)?
        .ok_or_else(|| ExchangeError::NotFound {
            entity: "调车场".to_string(),
            name: yard_name.to_string(),
        })
}

/// 写入审计日志（序列化失败时仅记录告警，不影响交换本身）
pub(crate) fn write_audit<T: serde::Serialize>(
    repos: &ExchangeRepositories,
    config: &ExchangeConfig,
    action_type: ActionType,
    report: &T,
    detail: String,
) -> ExchangeResult<()> {
    if !config.audit_enabled {
        return Ok(());
    }
    let payload = match serde_json::to_value(report) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "交换报告序列化失败，审计日志不含报告");
            None
        }
    };
    let log = ActionLog::new(action_type, &config.actor, payload, Some(detail));
    repos.action_log_repo.insert(&log)?;
    Ok(())
}

// ==========================================
// ExchangeOrchestrator - 调车场 ↔ 工业 交换编排器
// ==========================================
pub struct ExchangeOrchestrator {
    config: ExchangeConfig,
    planner: PlacementPlanner,
    sampler: ReplenishmentSampler,
}

impl ExchangeOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - config: 交换配置（数据库路径、补车区间、审计开关）
    pub fn new(config: ExchangeConfig) -> Self {
        Self {
            sampler: ReplenishmentSampler::new(config.replenish_spread),
            planner: PlacementPlanner::new(),
            config,
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// 执行一次交换
    ///
    /// 连接在本次调用内打开，任何退出路径都会释放；
    /// 未提交的事务在守卫析构时回滚。
    ///
    /// # 参数
    /// - yard_name: 调车场车位名称（不区分大小写）
    /// - count: 要外发的车辆数（或 All）
    /// - rng: 补车随机源
    #[instrument(skip(self, rng), fields(seed = rng.seed()))]
    pub fn run_exchange(
        &self,
        yard_name: &str,
        count: MoveCount,
        rng: &mut ExchangeRng,
    ) -> ExchangeResult<ExchangeReport> {
        let yard_name = normalize_yard_name(yard_name)?;
        let repos = ExchangeRepositories::open(&self.config.db_path)?;
        self.run_exchange_on(&repos, yard_name, count, rng)
    }

    /// 在给定仓储（共享连接）上执行交换
    pub fn run_exchange_on(
        &self,
        repos: &ExchangeRepositories,
        yard_name: &str,
        count: MoveCount,
        rng: &mut ExchangeRng,
    ) -> ExchangeResult<ExchangeReport> {
        let yard_name = normalize_yard_name(yard_name)?;
        let tx = TransactionGuard::begin(repos.conn.clone()).map_err(ExchangeError::Transaction)?;

        // ==========================================
        // ResolvingYard
        // ==========================================
        let yard = resolve_yard(repos, yard_name)?;

        // ==========================================
        // ListingYardCars
        // ==========================================
        let yard_cars = repos.car_repo.list_at_spot(yard.spot_id)?;
        if yard_cars.is_empty() {
            info!(yard = %yard.spot_name, "调车场无车辆，未做任何修改");
            return Ok(ExchangeReport::early_return(&yard.spot_name, ExchangeStatus::YardEmpty));
        }

        let requested = count.resolve(yard_cars.len());
        if requested == 0 {
            info!(yard = %yard.spot_name, "请求数量为 0，未做任何修改");
            return Ok(ExchangeReport::early_return(
                &yard.spot_name,
                ExchangeStatus::NothingRequested,
            ));
        }
        let outbound: Vec<Car> = yard_cars.iter().take(requested).cloned().collect();

        info!(
            yard = %yard.spot_name,
            yard_cars = yard_cars.len(),
            requested,
            "开始交换"
        );

        // ==========================================
        // Placing
        // ==========================================
        let allowed_map = repos.spot_repo.allowed_types_map()?;
        let candidates = repos.spot_repo.list_with_occupancy(IndustryType::Industry)?;
        let residents = repos.car_repo.list_by_industry_type(IndustryType::Industry)?;
        let mut arena = SpotArena::new(candidates, &allowed_map, residents);
        let mut ledger = YardLedger::new(yard.capacity, yard_cars.len() as u32);

        let decisions = self.planner.place(&outbound, &mut arena, &mut ledger);

        let spot_label = |spot_id: i64| -> String {
            arena
                .slot_by_spot_id(spot_id)
                .map(|slot| slot.occupancy.spot.label())
                .unwrap_or_else(|| spot_id.to_string())
        };

        let mut moved_to_industries = Vec::new();
        let mut displaced_to_yard = Vec::new();
        let mut unplaced = Vec::new();
        let mut exclusions = ReplenishmentExclusions::default();

        // 写入顺序与规划顺序一致；置换为两车互换，调车场占用不变
        for decision in &decisions {
            let car = &decision.car;
            match &decision.outcome {
                PlacementOutcome::Placed { spot_id } => {
                    repos.car_repo.set_car_spot(&car.car_number, *spot_id)?;
                    let m = CarMove::new(car, &yard.spot_name, spot_label(*spot_id));
                    info!(car_move = %m, "调车场 → 工业");
                    moved_to_industries.push(m);
                }
                PlacementOutcome::Displaced { spot_id, evicted } => {
                    repos
                        .car_repo
                        .swap_car_spots(&car.car_number, &evicted.car_number)?;
                    let out = CarMove::new(evicted, spot_label(*spot_id), &yard.spot_name);
                    info!(car_move = %out, "置换: 工业 → 调车场");
                    displaced_to_yard.push(out);

                    let m = CarMove::new(car, &yard.spot_name, spot_label(*spot_id));
                    info!(car_move = %m, "调车场 → 工业");
                    moved_to_industries.push(m);
                }
                PlacementOutcome::Unplaced => {
                    unplaced.push(UnplacedCar::from(car));
                    continue;
                }
            }
            exclusions.car_numbers.insert(car.car_number.clone());
            if let Some(spot_id) = decision.target_spot_id() {
                exclusions.spot_ids.insert(spot_id);
            }
        }

        // ==========================================
        // Replenishing
        // ==========================================
        let moved_count = moved_to_industries.len();
        let mut replenished_to_yard = Vec::new();
        let mut replenishment = None;

        if moved_count > 0 {
            let yard_occupancy = repos.spot_repo.count_cars_at(yard.spot_id)?;
            let yard_free_slots = yard.capacity.saturating_sub(yard_occupancy) as usize;
            let pool = repos.car_repo.list_by_industry_type(IndustryType::Industry)?;
            let yard_allowed = repos.spot_repo.allowed_types_for(yard.spot_id)?;

            let (draw, selected) = self.sampler.sample(
                rng,
                &pool,
                &exclusions,
                &yard_allowed,
                moved_count,
                yard_free_slots,
            );

            for car in &selected {
                repos.car_repo.set_car_spot(&car.car_number, yard.spot_id)?;
                let m = CarMove::new(car, spot_label(car.spot_id), &yard.spot_name);
                info!(car_move = %m, "补车: 工业 → 调车场");
                replenished_to_yard.push(m);
            }
            replenishment = Some(draw);
        }

        let report = ExchangeReport {
            yard_name: yard.spot_name.clone(),
            status: ExchangeStatus::Committed,
            requested,
            seed: Some(rng.seed()),
            moved_to_industries,
            displaced_to_yard,
            replenished_to_yard,
            unplaced,
            replenishment,
        };

        // ==========================================
        // Committed
        // ==========================================
        write_audit(
            repos,
            &self.config,
            ActionType::YardExchange,
            &report,
            format!(
                "yard={} requested={} moved={} displaced={} replenished={} unplaced={}",
                report.yard_name,
                report.requested,
                report.moved_to_industries.len(),
                report.displaced_to_yard.len(),
                report.replenished_to_yard.len(),
                report.unplaced.len()
            ),
        )?;
        tx.commit().map_err(ExchangeError::Transaction)?;

        info!(
            yard = %report.yard_name,
            moved = report.moved_to_industries.len(),
            displaced = report.displaced_to_yard.len(),
            replenished = report.replenished_to_yard.len(),
            unplaced = report.unplaced.len(),
            "交换已提交"
        );
        Ok(report)
    }
}
