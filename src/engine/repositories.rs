// ==========================================
// 模型铁路调车场交换系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合一次交换所需的全部 Repository
// 约束: 三个仓储共享同一连接，才能被同一个事务覆盖
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::open_sqlite_connection;
use crate::repository::{ActionLogRepository, CarRepository, SpotRepository};

/// 交换引擎仓储集合
///
/// # 包含的仓储
/// - `spot_repo`: 车位 / 产业 / 允许车型
/// - `car_repo`: 车辆查询与改位
/// - `action_log_repo`: 审计日志
#[derive(Clone)]
pub struct ExchangeRepositories {
    /// 共享连接（事务守卫也持有它）
    pub conn: Arc<Mutex<Connection>>,
    pub spot_repo: Arc<SpotRepository>,
    pub car_repo: Arc<CarRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl ExchangeRepositories {
    /// 在同一连接上构造全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            spot_repo: Arc::new(SpotRepository::from_connection(conn.clone())),
            car_repo: Arc::new(CarRepository::from_connection(conn.clone())),
            action_log_repo: Arc::new(ActionLogRepository::from_connection(conn.clone())),
            conn,
        }
    }

    /// 打开数据库并构造全部仓储
    pub fn open(db_path: &str) -> rusqlite::Result<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }
}
