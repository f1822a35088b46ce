// ==========================================
// 模型铁路调车场交换系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、容量约束接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod car;
pub mod exchange;
pub mod spot;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use car::{Car, CarLocation};
pub use exchange::{
    CarMove, ExchangeReport, ExchangeStatus, OffLayoutReport, ReplenishmentDraw, UnplacedCar,
};
pub use spot::{AllowedCarTypes, CarType, Industry, Spot, SpotCapacity, SpotOccupancy};
pub use types::{IndustryType, MoveCount, OFF_LAYOUT_SPOT_NAME};
