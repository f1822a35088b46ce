// ==========================================
// 模型铁路调车场交换系统 - 报表层
// ==========================================

pub mod location_summary;

pub use location_summary::{
    IndustrySection, LocationSummary, SpotSection, SummaryFilter, TypeSection,
};
