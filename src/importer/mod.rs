// ==========================================
// 模型铁路调车场交换系统 - 导入层
// ==========================================
// 职责: 从 CSV 导入车位与车辆（外部协作者，不触及引擎内部）
// ==========================================

pub mod car_importer;
pub mod csv_source;
pub mod error;
pub mod import_summary;
pub mod spot_importer;

// 重导出核心类型
pub use car_importer::CarImporter;
pub use error::{ImportError, ImportResult};
pub use import_summary::ImportSummary;
pub use spot_importer::SpotImporter;
