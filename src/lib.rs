// ==========================================
// 模型铁路调车场交换系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 车位分配 / 置换 / 补车引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 放置 / 置换 / 补车
pub mod engine;

// 导入层 - CSV
pub mod importer;

// 报表层 - 位置汇总
pub mod report;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/事务守卫）
pub mod db;

// 日志系统
pub mod logging;

// API 层
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::types::{IndustryType, MoveCount, OFF_LAYOUT_SPOT_NAME};

pub use domain::{
    ActionLog, ActionType, AllowedCarTypes, Car, CarMove, ExchangeReport, ExchangeStatus,
    OffLayoutReport, Spot, SpotOccupancy,
};

pub use engine::{
    DisplacementResolver, ExchangeError, ExchangeOrchestrator, ExchangeRng, OffLayoutExchange,
    PlacementPlanner, ReplenishmentSampler,
};

pub use api::{ApiError, ExchangeApi};

pub use config::ExchangeConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "模型铁路调车场交换系统";
