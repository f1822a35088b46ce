// ==========================================
// 模型铁路调车场交换系统 - 交换API
// ==========================================
// 职责: 命令行 / 外部调用的统一入口
// - exchange: 调车场 ↔ 工业
// - off_layout: 调车场 ↔ 场外
// - import_spots / import_cars: CSV 导入
// - summarize: 车辆位置汇总
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ExchangeConfig};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::action_log::ActionLog;
use crate::domain::exchange::{ExchangeReport, OffLayoutReport};
use crate::engine::{parse_move_count, ExchangeOrchestrator, ExchangeRng, OffLayoutExchange};
use crate::importer::{CarImporter, ImportSummary, SpotImporter};
use crate::report::{LocationSummary, SummaryFilter};
use crate::repository::{ActionLogRepository, CarRepository};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 交换API
pub struct ExchangeApi {
    config: ExchangeConfig,
}

impl ExchangeApi {
    /// 以给定配置创建（不触碰数据库）
    pub fn new(config: ExchangeConfig) -> Self {
        Self { config }
    }

    /// 打开数据库: 建表（幂等）并应用 config_kv 覆写
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = Self::open_connection(db_path)?;
        let manager = ConfigManager::from_connection(conn)?;
        let config = manager.apply_overrides(ExchangeConfig::new(db_path))?;
        info!(db_path, "数据库已就绪");
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    fn open_connection(db_path: &str) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    fn make_rng(seed: Option<u64>) -> ExchangeRng {
        match seed {
            Some(seed) => ExchangeRng::from_seed_u64(seed),
            None => ExchangeRng::from_entropy(),
        }
    }

    /// 调车场 ↔ 工业 交换
    ///
    /// # 参数
    /// - yard_name: 调车场车位名称
    /// - count: 数量（整数或 "all"）
    /// - seed: 随机种子（None = 系统熵）
    pub fn exchange(&self, yard_name: &str, count: &str, seed: Option<u64>) -> ApiResult<ExchangeReport> {
        let count = parse_move_count(count)?;
        let mut rng = Self::make_rng(seed);
        let report =
            ExchangeOrchestrator::new(self.config.clone()).run_exchange(yard_name, count, &mut rng)?;
        Ok(report)
    }

    /// 调车场 ↔ 场外 交换
    pub fn off_layout(
        &self,
        yard_name: &str,
        count: &str,
        seed: Option<u64>,
    ) -> ApiResult<OffLayoutReport> {
        let count = parse_move_count(count)?;
        let mut rng = Self::make_rng(seed);
        let report = OffLayoutExchange::new(self.config.clone()).run(yard_name, count, &mut rng)?;
        Ok(report)
    }

    /// 导入车位 CSV
    pub fn import_spots(&self, path: &Path) -> ApiResult<ImportSummary> {
        let conn = Self::open_connection(&self.config.db_path)?;
        Ok(SpotImporter::from_connection(conn).import_file(path)?)
    }

    /// 导入车辆 CSV
    pub fn import_cars(&self, path: &Path) -> ApiResult<ImportSummary> {
        let conn = Self::open_connection(&self.config.db_path)?;
        let importer = CarImporter::from_connection(conn)
            .with_off_layout_spot_name(self.config.off_layout_spot_name.clone());
        Ok(importer.import_file(path)?)
    }

    /// 车辆位置汇总
    pub fn summarize(&self, filter: SummaryFilter) -> ApiResult<LocationSummary> {
        let repo = CarRepository::new(&self.config.db_path)?;
        Ok(LocationSummary::load(&repo, filter)?)
    }

    /// 最近的交换审计记录
    pub fn recent_actions(&self, limit: usize) -> ApiResult<Vec<ActionLog>> {
        let repo = ActionLogRepository::new(&self.config.db_path)?;
        Ok(repo.list_recent(limit)?)
    }
}
