// ==========================================
// 模型铁路调车场交换系统 - 场外交换
// ==========================================
// 第二条交换通路: 调车场 ↔ 场外暂存区
// 1) 调车场上的全部车辆送往场外（场外容量不限）
// 2) 从场外随机拉回 min(请求数, 调车场容量) 辆
// ==========================================

use crate::config::ExchangeConfig;
use crate::db::TransactionGuard;
use crate::domain::action_log::ActionType;
use crate::domain::car::Car;
use crate::domain::exchange::{CarMove, OffLayoutReport};
use crate::domain::spot::Spot;
use crate::domain::types::{IndustryType, MoveCount};
use crate::engine::error::{ExchangeError, ExchangeResult};
use crate::engine::exchange::{normalize_yard_name, resolve_yard, write_audit};
use crate::engine::replenishment::ReplenishmentSampler;
use crate::engine::repositories::ExchangeRepositories;
use crate::engine::rng::ExchangeRng;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

pub struct OffLayoutExchange {
    config: ExchangeConfig,
}

impl OffLayoutExchange {
    pub fn new(config: ExchangeConfig) -> Self {
        Self { config }
    }

    /// 执行一次调车场 ↔ 场外交换（每次调用打开独立连接）
    #[instrument(skip(self, rng), fields(seed = rng.seed()))]
    pub fn run(
        &self,
        yard_name: &str,
        count: MoveCount,
        rng: &mut ExchangeRng,
    ) -> ExchangeResult<OffLayoutReport> {
        let yard_name = normalize_yard_name(yard_name)?;
        let repos = ExchangeRepositories::open(&self.config.db_path)?;
        self.run_on(&repos, yard_name, count, rng)
    }

    /// 在给定仓储上执行
    pub fn run_on(
        &self,
        repos: &ExchangeRepositories,
        yard_name: &str,
        count: MoveCount,
        rng: &mut ExchangeRng,
    ) -> ExchangeResult<OffLayoutReport> {
        let yard_name = normalize_yard_name(yard_name)?;
        let tx = TransactionGuard::begin(repos.conn.clone()).map_err(ExchangeError::Transaction)?;

        let off_layout = self.resolve_off_layout(repos)?;
        let yard = resolve_yard(repos, yard_name)?;

        // 1. 调车场 → 场外
        let yard_cars = repos.car_repo.list_at_spot(yard.spot_id)?;
        let mut sent_off_layout = Vec::with_capacity(yard_cars.len());
        let mut sent_numbers = HashSet::with_capacity(yard_cars.len());
        for car in &yard_cars {
            repos.car_repo.set_car_spot(&car.car_number, off_layout.spot_id)?;
            let m = CarMove::new(car, &yard.spot_name, &off_layout.spot_name);
            info!(car_move = %m, "调车场 → 场外");
            sent_off_layout.push(m);
            sent_numbers.insert(car.car_number.clone());
        }

        // 2. 场外 → 调车场
        let requested = count.resolve(yard.capacity as usize);
        let yard_allowed = repos.spot_repo.allowed_types_for(yard.spot_id)?;
        let candidates: Vec<Car> = repos
            .car_repo
            .list_at_spot(off_layout.spot_id)?
            .into_iter()
            .filter(|car| !sent_numbers.contains(&car.car_number))
            .filter(|car| yard_allowed.accepts(car.car_type_id))
            .collect();
        let selected = ReplenishmentSampler::select(rng, &candidates, requested);

        let mut pulled_to_yard = Vec::with_capacity(selected.len());
        for car in &selected {
            repos.car_repo.set_car_spot(&car.car_number, yard.spot_id)?;
            let m = CarMove::new(car, &off_layout.spot_name, &yard.spot_name);
            info!(car_move = %m, "场外 → 调车场");
            pulled_to_yard.push(m);
        }
        if pulled_to_yard.len() < requested {
            warn!(
                requested,
                pulled = pulled_to_yard.len(),
                "场外候选不足，部分满足"
            );
        }

        let report = OffLayoutReport {
            yard_name: yard.spot_name.clone(),
            requested,
            seed: Some(rng.seed()),
            sent_off_layout,
            pulled_to_yard,
        };

        write_audit(
            repos,
            &self.config,
            ActionType::OffLayoutExchange,
            &report,
            format!(
                "yard={} sent={} pulled={} requested={}",
                report.yard_name,
                report.sent_off_layout.len(),
                report.pulled_to_yard.len(),
                report.requested
            ),
        )?;
        tx.commit().map_err(ExchangeError::Transaction)?;

        info!(
            yard = %report.yard_name,
            sent = report.sent_off_layout.len(),
            pulled = report.pulled_to_yard.len(),
            "场外交换已提交"
        );
        Ok(report)
    }

    /// 按配置名称解析场外暂存车位（必须属于 Off-Layout 产业）
    fn resolve_off_layout(&self, repos: &ExchangeRepositories) -> ExchangeResult<Spot> {
        repos
            .spot_repo
            .find_by_name(&self.config.off_layout_spot_name)?
            .filter(|spot| spot.industry_type == IndustryType::OffLayout)
            .ok_or_else(|| ExchangeError::NotFound {
                entity: "场外暂存车位".to_string(),
                name: self.config.off_layout_spot_name.clone(),
            })
    }
}
