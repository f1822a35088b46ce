// ==========================================
// 模型铁路调车场交换系统 - 车辆位置汇总
// ==========================================
// 按 产业类型 → 产业 → 车位 分组列出车辆
// 场外暂存区始终不列出
// ==========================================

use crate::domain::car::CarLocation;
use crate::domain::types::IndustryType;
use crate::repository::{CarRepository, RepositoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 汇总范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SummaryFilter {
    #[default]
    All,
    YardsOnly,
    IndustriesOnly,
}

impl SummaryFilter {
    pub fn industry_types(&self) -> Vec<IndustryType> {
        match self {
            SummaryFilter::All => vec![IndustryType::Yard, IndustryType::Industry],
            SummaryFilter::YardsOnly => vec![IndustryType::Yard],
            SummaryFilter::IndustriesOnly => vec![IndustryType::Industry],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotSection {
    pub spot_name: String,
    pub cars: Vec<String>, // "路局标记 车号"
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustrySection {
    pub industry_name: String,
    pub spots: Vec<SpotSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSection {
    pub industry_type: IndustryType,
    pub industries: Vec<IndustrySection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub filter: SummaryFilter,
    pub sections: Vec<TypeSection>,
}

impl LocationSummary {
    /// 从仓储读取并分组
    pub fn load(car_repo: &CarRepository, filter: SummaryFilter) -> RepositoryResult<Self> {
        let rows = car_repo.list_locations(&filter.industry_types())?;
        Ok(Self::build(filter, rows))
    }

    /// 将已排序的位置行分组（连续相同键归为一组）
    pub fn build(filter: SummaryFilter, rows: Vec<CarLocation>) -> Self {
        let mut sections: Vec<TypeSection> = Vec::new();

        for row in rows {
            if row.industry_type == IndustryType::OffLayout {
                continue;
            }

            if sections.last().map(|s| s.industry_type) != Some(row.industry_type) {
                sections.push(TypeSection {
                    industry_type: row.industry_type,
                    industries: Vec::new(),
                });
            }
            let Some(section) = sections.last_mut() else {
                continue;
            };

            if section.industries.last().map(|i| i.industry_name.as_str())
                != Some(row.industry_name.as_str())
            {
                section.industries.push(IndustrySection {
                    industry_name: row.industry_name.clone(),
                    spots: Vec::new(),
                });
            }
            let Some(industry) = section.industries.last_mut() else {
                continue;
            };

            if industry.spots.last().map(|s| s.spot_name.as_str()) != Some(row.spot_name.as_str()) {
                industry.spots.push(SpotSection {
                    spot_name: row.spot_name.clone(),
                    cars: Vec::new(),
                });
            }
            if let Some(spot) = industry.spots.last_mut() {
                spot.cars.push(format!("{} {}", row.road_name, row.car_number));
            }
        }

        Self { filter, sections }
    }

    pub fn total_cars(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.industries.iter())
            .flat_map(|i| i.spots.iter())
            .map(|s| s.cars.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_cars() == 0
    }
}

impl fmt::Display for LocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "所选范围内没有车辆。");
        }

        writeln!(f, "=== 车辆位置汇总 ===")?;
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "--- {} ---", section.industry_type.to_db_str().to_uppercase())?;
            for industry in &section.industries {
                writeln!(f)?;
                writeln!(f, "{}:", industry.industry_name)?;
                for spot in &industry.spots {
                    writeln!(f, "  车位 {}:", spot.spot_name)?;
                    for car in &spot.cars {
                        writeln!(f, "    {}", car)?;
                    }
                }
            }
        }
        writeln!(f)?;
        writeln!(f, "====================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(t: IndustryType, industry: &str, spot: &str, road: &str, number: &str) -> CarLocation {
        CarLocation {
            industry_type: t,
            industry_name: industry.to_string(),
            spot_name: spot.to_string(),
            road_name: road.to_string(),
            car_number: number.to_string(),
        }
    }

    #[test]
    fn test_build_groups_consecutive_rows() {
        let rows = vec![
            loc(IndustryType::Industry, "Acme Feed", "1", "ATSF", "100"),
            loc(IndustryType::Industry, "Acme Feed", "1", "UP", "7"),
            loc(IndustryType::Industry, "Acme Feed", "2", "SP", "55"),
            loc(IndustryType::Industry, "Zenith Oil", "A", "GATX", "9"),
            loc(IndustryType::Yard, "Main Yard", "Track 1", "BN", "1"),
        ];
        let summary = LocationSummary::build(SummaryFilter::All, rows);

        assert_eq!(summary.sections.len(), 2);
        assert_eq!(summary.sections[0].industries.len(), 2);
        assert_eq!(summary.sections[0].industries[0].spots.len(), 2);
        assert_eq!(
            summary.sections[0].industries[0].spots[0].cars,
            vec!["ATSF 100", "UP 7"]
        );
        assert_eq!(summary.total_cars(), 5);

        let text = summary.to_string();
        assert!(text.contains("--- INDUSTRY ---"));
        assert!(text.contains("--- YARD ---"));
        assert!(text.contains("  车位 Track 1:"));
        assert!(text.contains("    BN 1"));
    }

    #[test]
    fn test_off_layout_rows_are_dropped() {
        let rows = vec![loc(IndustryType::OffLayout, "Staging", "OFF_LAYOUT", "UP", "1")];
        let summary = LocationSummary::build(SummaryFilter::All, rows);
        assert!(summary.is_empty());
        assert_eq!(summary.to_string(), "所选范围内没有车辆。\n");
    }

    #[test]
    fn test_filter_types() {
        assert_eq!(SummaryFilter::YardsOnly.industry_types(), vec![IndustryType::Yard]);
        assert_eq!(
            SummaryFilter::IndustriesOnly.industry_types(),
            vec![IndustryType::Industry]
        );
        assert_eq!(SummaryFilter::default(), SummaryFilter::All);
    }
}
