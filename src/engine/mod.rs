// ==========================================
// 模型铁路调车场交换系统 - 引擎层
// ==========================================
// 职责: 放置 / 置换 / 补车 / 编排
// 红线: Engine 不拼 SQL，数据访问全部经由 Repository
// ==========================================

pub mod displacement;
pub mod error;
pub mod exchange;
pub mod off_layout;
pub mod placement;
pub mod replenishment;
pub mod repositories;
pub mod rng;
pub mod spot_arena;

// 重导出核心引擎
pub use displacement::{Displacement, DisplacementResolver, FirstOccupant, OccupantSelector};
pub use error::{ExchangeError, ExchangeResult};
pub use exchange::{parse_move_count, ExchangeOrchestrator};
pub use off_layout::OffLayoutExchange;
pub use placement::{PlacementDecision, PlacementOutcome, PlacementPlanner};
pub use replenishment::{ReplenishmentExclusions, ReplenishmentSampler};
pub use repositories::ExchangeRepositories;
pub use rng::ExchangeRng;
pub use spot_arena::{SpotArena, SpotSlot, YardLedger};
