// ==========================================
// 车辆位置汇总集成测试
// ==========================================


use railyard_exchange::logging;
use railyard_exchange::report::{LocationSummary, SummaryFilter};
use railyard_exchange::IndustryType;
use test_helpers::*;

fn seed_layout(db_path: &str) -> LayoutBuilder {
    let layout = LayoutBuilder::new(db_path);
    let yard = layout.yard("Yard A", 4);
    let dock = layout.industry("Acme Feed", "Dock", 2, &[]);
    let rack = layout.industry("Bayview Oil", "Rack", 2, &[]);
    layout.car("200", "boxcar", "UP", yard);
    layout.car("100", "boxcar", "ATSF", yard);
    layout.car("300", "boxcar", "SP", dock);
    layout.car("400", "tank car", "GATX", rack);
    layout.car("900", "gondola", "PRR", layout.off_layout_id);
    layout
}

#[test]
fn test_summary_groups_by_type_industry_spot() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = seed_layout(&db_path);

    let summary = LocationSummary::load(&layout.cars, SummaryFilter::All).unwrap();

    // 场外暂存区不列出
    assert_eq!(summary.total_cars(), 4);
    assert_eq!(summary.sections.len(), 2);
    assert_eq!(summary.sections[0].industry_type, IndustryType::Industry);
    assert_eq!(summary.sections[1].industry_type, IndustryType::Yard);

    let industries = &summary.sections[0].industries;
    assert_eq!(industries.len(), 2);
    assert_eq!(industries[0].industry_name, "Acme Feed");
    assert_eq!(industries[1].spots[0].cars, vec!["GATX 400"]);

    // 车位内按路局标记排序
    let yard_cars = &summary.sections[1].industries[0].spots[0].cars;
    assert_eq!(yard_cars, &vec!["ATSF 100".to_string(), "UP 200".to_string()]);

    let text = summary.to_string();
    assert!(text.starts_with("=== 车辆位置汇总 ==="));
    assert!(!text.contains("PRR 900"));
}

#[test]
fn test_summary_filters() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = seed_layout(&db_path);

    let yards = LocationSummary::load(&layout.cars, SummaryFilter::YardsOnly).unwrap();
    assert_eq!(yards.total_cars(), 2);
    assert!(yards
        .sections
        .iter()
        .all(|s| s.industry_type == IndustryType::Yard));

    let industries = LocationSummary::load(&layout.cars, SummaryFilter::IndustriesOnly).unwrap();
    assert_eq!(industries.total_cars(), 2);
    assert!(!industries.to_string().contains("--- YARD ---"));
}

#[test]
fn test_empty_summary_message() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    layout.yard("Yard A", 4);
    layout.car("1", "boxcar", "UP", layout.off_layout_id);

    let summary = LocationSummary::load(&layout.cars, SummaryFilter::All).unwrap();
    assert!(summary.is_empty());
    assert_eq!(summary.to_string(), "所选范围内没有车辆。\n");
}
