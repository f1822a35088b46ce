// ==========================================
// 调车场 ↔ 工业 交换集成测试
// ==========================================
// 覆盖: 首个可用放置 / 置换 / 无法放置 / 补车 / 提前返回 / 结构性错误 / 审计
// ==========================================


use railyard_exchange::engine::exchange::parse_move_count;
use railyard_exchange::logging;
use railyard_exchange::{
    ExchangeConfig, ExchangeError, ExchangeOrchestrator, ExchangeRng, ExchangeStatus, MoveCount,
};
use test_helpers::*;

fn orchestrator(db_path: &str) -> ExchangeOrchestrator {
    ExchangeOrchestrator::new(ExchangeConfig::new(db_path))
}

#[test]
fn test_simple_fit_fills_first_spot() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 5);
    let dock = layout.industry("Acme", "Dock", 2, &["boxcar"]);
    layout.car("B1", "boxcar", "ATSF", yard);
    layout.car("B2", "boxcar", "ATSF", yard);
    layout.car("B3", "boxcar", "ATSF", yard);

    let report = orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::Count(1), &mut ExchangeRng::from_seed_u64(7))
        .unwrap();

    assert_eq!(report.status, ExchangeStatus::Committed);
    assert_eq!(report.requested, 1);
    assert_eq!(report.moved_to_industries.len(), 1);
    assert_eq!(report.moved_to_industries[0].car_number, "B1");
    assert!(report.displaced_to_yard.is_empty());
    assert!(report.unplaced.is_empty());

    // 唯一的工业车位刚被填入，补车候选为空
    let draw = report.replenishment.unwrap();
    assert_eq!(draw.taken, 0);
    assert!(report.replenished_to_yard.is_empty());

    assert_eq!(spot_of(&db_path, "B1"), dock);
    assert_eq!(count_at(&db_path, dock), 1);
    assert_eq!(count_at(&db_path, yard), 2);
    assert_invariants(&db_path);
}

#[test]
fn test_first_fit_respects_catalog_order_and_fills_in_batch() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 5);
    let first = layout.industry("Acme", "Dock 1", 1, &[]);
    let second = layout.industry("Acme", "Dock 2", 2, &[]);
    layout.cars("B", 3, "boxcar", "ATSF", yard);

    let report = orchestrator(&db_path)
        .run_exchange("yard a", MoveCount::All, &mut ExchangeRng::from_seed_u64(1))
        .unwrap();

    assert_eq!(report.yard_name, "Yard A");
    assert_eq!(report.moved_to_industries.len(), 3);
    assert_eq!(spot_of(&db_path, "B00"), first);
    assert_eq!(spot_of(&db_path, "B01"), second);
    assert_eq!(spot_of(&db_path, "B02"), second);
    assert_invariants(&db_path);
}

#[test]
fn test_displacement_evicts_resident_to_yard() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 2);
    let dock = layout.industry("Acme", "Dock", 1, &["boxcar"]);
    layout.car("X", "boxcar", "ATSF", yard);
    layout.car("A", "boxcar", "MILW", dock);

    let report = orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::Count(1), &mut ExchangeRng::from_seed_u64(3))
        .unwrap();

    assert_eq!(report.moved_to_industries.len(), 1);
    assert_eq!(report.moved_to_industries[0].car_number, "X");
    assert_eq!(report.displaced_to_yard.len(), 1);
    assert_eq!(report.displaced_to_yard[0].car_number, "A");

    assert_eq!(spot_of(&db_path, "X"), dock);
    assert_eq!(spot_of(&db_path, "A"), yard);
    // 置换: 调车场净变化 = +1 逐出 -1 外发
    assert_eq!(count_at(&db_path, yard), 1);
    assert_invariants(&db_path);
}

#[test]
fn test_full_yard_still_swaps_with_single_spot() {
    logging::init_test();
    println!("\n=== 测试：满场调车场与单车位互换 ===");

    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 2);
    let dock = layout.industry("Acme", "Dock", 1, &["boxcar"]);
    layout.car("X", "boxcar", "ATSF", yard);
    layout.car("Y", "boxcar", "ATSF", yard);
    layout.car("A", "boxcar", "MILW", dock);
    println!("✓ 步骤 1: 调车场 2/2，单车位已占用");

    let report = orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::Count(1), &mut ExchangeRng::from_seed_u64(3))
        .unwrap();

    // 外发车辆离场腾出的空位接收被逐出车辆
    assert_eq!(report.status, ExchangeStatus::Committed);
    assert_eq!(report.moved_to_industries.len(), 1);
    assert_eq!(report.moved_to_industries[0].car_number, "X");
    assert_eq!(report.displaced_to_yard.len(), 1);
    assert_eq!(report.displaced_to_yard[0].car_number, "A");
    assert!(report.unplaced.is_empty());
    println!("✓ 步骤 2: X ↔ A 互换");

    assert_eq!(spot_of(&db_path, "X"), dock);
    assert_eq!(spot_of(&db_path, "A"), yard);
    assert_eq!(count_at(&db_path, yard), 2);
    assert!(report.replenished_to_yard.is_empty());
    assert_invariants(&db_path);
}

#[test]
fn test_car_placed_earlier_in_run_can_be_displaced() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 4);
    let dock = layout.industry("Acme", "Dock", 1, &[]);
    layout.car("B1", "boxcar", "ATSF", yard);
    layout.car("B2", "boxcar", "ATSF", yard);

    let report = orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::All, &mut ExchangeRng::from_seed_u64(11))
        .unwrap();

    // B1 首次适配进入 Dock，B2 随后把 B1 逐回调车场
    assert_eq!(report.moved_to_industries.len(), 2);
    assert_eq!(report.displaced_to_yard.len(), 1);
    assert_eq!(report.displaced_to_yard[0].car_number, "B1");
    assert!(report.unplaced.is_empty());
    assert_eq!(spot_of(&db_path, "B1"), yard);
    assert_eq!(spot_of(&db_path, "B2"), dock);
    assert_invariants(&db_path);
}

#[test]
fn test_unplaceable_car_stays_in_yard() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 3);
    layout.industry("Acme", "Dock", 4, &["boxcar"]);
    layout.industry("Bayview", "Rack", 4, &["tank car"]);
    layout.car("G1", "gondola", "PRR", yard);
    let before = snapshot(&db_path);

    let report = orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::Count(1), &mut ExchangeRng::from_seed_u64(5))
        .unwrap();

    assert_eq!(report.status, ExchangeStatus::Committed);
    assert_eq!(report.unplaced.len(), 1);
    assert_eq!(report.unplaced[0].car_type_name, "gondola");
    assert!(report.replenishment.is_none());
    assert_eq!(report.total_writes(), 0);
    assert_eq!(snapshot(&db_path), before);
}

#[test]
fn test_replenishment_shortfall_is_not_an_error() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 10);
    let dock = layout.industry("Mill", "Dock", 3, &["boxcar"]);
    let rack = layout.industry("Zeta", "Rack", 1, &["tank car"]);
    layout.cars("B", 3, "boxcar", "ATSF", yard);
    layout.car("R1", "tank car", "GATX", rack);

    let report = orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::Count(3), &mut ExchangeRng::from_seed_u64(99))
        .unwrap();

    assert_eq!(report.moved_to_industries.len(), 3);
    assert_eq!(count_at(&db_path, dock), 3);

    // 区间 [1, 5] → 至少抽中 1，唯一候选是 R1
    let draw = report.replenishment.unwrap();
    assert_eq!((draw.low, draw.high), (1, 5));
    assert!(draw.desired >= 1);
    assert_eq!(draw.taken, 1);
    assert_eq!(draw.shortfall(), draw.target - 1);
    assert_eq!(report.replenished_to_yard.len(), 1);
    assert_eq!(report.replenished_to_yard[0].car_number, "R1");
    assert_eq!(spot_of(&db_path, "R1"), yard);
    assert_invariants(&db_path);
}

#[test]
fn test_replenishment_bounded_by_yard_free_slots() {
    logging::init_test();
    for seed in 0..12 {
        let (_tmp, db_path) = create_test_db().unwrap();
        let layout = LayoutBuilder::new(&db_path);
        let yard = layout.yard("Yard A", 3);
        layout.industry("Acme", "Dock", 1, &["boxcar"]);
        let team = layout.industry("Delta", "Team Track", 10, &[]);
        layout.cars("B", 3, "boxcar", "ATSF", yard);
        layout.cars("T", 10, "flatcar", "UP", team);

        let report = orchestrator(&db_path)
            .run_exchange("Yard A", MoveCount::Count(1), &mut ExchangeRng::from_seed_u64(seed))
            .unwrap();

        let draw = report.replenishment.unwrap();
        assert_eq!(report.moved_to_industries.len(), 1);
        assert_eq!(draw.yard_free_slots, 1);
        assert!(draw.target <= 1);
        assert_eq!(draw.taken, draw.target);
        assert!(count_at(&db_path, yard) <= 3);
        assert_invariants(&db_path);
    }
}

#[test]
fn test_replenishment_excludes_cars_and_spots_from_this_run() {
    logging::init_test();
    for seed in 0..8 {
        let (_tmp, db_path) = create_test_db().unwrap();
        let layout = LayoutBuilder::new(&db_path);
        let yard = layout.yard("Yard A", 10);
        let dock = layout.industry("Acme", "Dock", 3, &["boxcar"]);
        layout.car("B1", "boxcar", "ATSF", yard);
        layout.car("D1", "boxcar", "MILW", dock);

        let report = orchestrator(&db_path)
            .run_exchange("Yard A", MoveCount::Count(1), &mut ExchangeRng::from_seed_u64(seed))
            .unwrap();

        // 刚填入的车位上的原驻留车 D1 本次不可被补回
        assert_eq!(report.moved_to_industries.len(), 1);
        assert!(report.replenished_to_yard.is_empty());
        assert_eq!(spot_of(&db_path, "B1"), dock);
        assert_eq!(spot_of(&db_path, "D1"), dock);
    }
}

#[test]
fn test_same_seed_same_result() {
    logging::init_test();
    let build = || {
        let (tmp, db_path) = create_test_db().unwrap();
        let layout = LayoutBuilder::new(&db_path);
        let yard = layout.yard("Yard A", 8);
        layout.industry("Acme", "Dock", 2, &["boxcar"]);
        layout.industry("Acme", "Door", 1, &["boxcar"]);
        let rack = layout.industry("Bayview", "Rack", 3, &["tank car"]);
        let team = layout.industry("Delta", "Team Track", 6, &[]);
        layout.cars("B", 4, "boxcar", "ATSF", yard);
        layout.cars("R", 3, "tank car", "GATX", rack);
        layout.cars("T", 5, "flatcar", "UP", team);
        (tmp, db_path)
    };

    let (_a_tmp, a) = build();
    let (_b_tmp, b) = build();
    let report_a = orchestrator(&a)
        .run_exchange("Yard A", MoveCount::All, &mut ExchangeRng::from_seed_u64(2024))
        .unwrap();
    let report_b = orchestrator(&b)
        .run_exchange("Yard A", MoveCount::All, &mut ExchangeRng::from_seed_u64(2024))
        .unwrap();

    assert_eq!(report_a, report_b);
    assert_eq!(snapshot(&a), snapshot(&b));
    assert_invariants(&a);
}

#[test]
fn test_early_returns_do_not_write() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard_a = layout.yard("Yard A", 3);
    layout.yard("Yard B", 3);
    layout.industry("Acme", "Dock", 2, &[]);
    layout.car("B1", "boxcar", "ATSF", yard_a);
    let before = snapshot(&db_path);

    let empty = orchestrator(&db_path)
        .run_exchange("Yard B", MoveCount::All, &mut ExchangeRng::from_seed_u64(1))
        .unwrap();
    assert_eq!(empty.status, ExchangeStatus::YardEmpty);

    let nothing = orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::Count(0), &mut ExchangeRng::from_seed_u64(1))
        .unwrap();
    assert_eq!(nothing.status, ExchangeStatus::NothingRequested);

    assert_eq!(snapshot(&db_path), before);
    assert_eq!(action_log_count(&db_path, "YARD_EXCHANGE"), 0);
}

#[test]
fn test_structural_errors_leave_store_untouched() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 3);
    layout.industry("Acme", "Dock", 2, &[]);
    layout.car("B1", "boxcar", "ATSF", yard);
    let before = snapshot(&db_path);
    let engine = orchestrator(&db_path);

    let unknown = engine.run_exchange("Nowhere", MoveCount::All, &mut ExchangeRng::from_seed_u64(1));
    assert!(matches!(unknown, Err(ExchangeError::NotFound { .. })));

    // 工业车位不是调车场
    let not_yard = engine.run_exchange("Dock", MoveCount::All, &mut ExchangeRng::from_seed_u64(1));
    assert!(matches!(not_yard, Err(ExchangeError::NotFound { .. })));

    let blank = engine.run_exchange("  ", MoveCount::All, &mut ExchangeRng::from_seed_u64(1));
    assert!(matches!(blank, Err(ExchangeError::InvalidRequest(_))));

    assert!(matches!(
        parse_move_count("-3"),
        Err(ExchangeError::InvalidRequest(_))
    ));

    assert_eq!(snapshot(&db_path), before);
    assert_eq!(action_log_count(&db_path, "YARD_EXCHANGE"), 0);
}

#[test]
fn test_audit_entry_written_on_commit() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 3);
    layout.industry("Acme", "Dock", 2, &[]);
    layout.car("B1", "boxcar", "ATSF", yard);

    orchestrator(&db_path)
        .run_exchange("Yard A", MoveCount::All, &mut ExchangeRng::from_seed_u64(1))
        .unwrap();
    assert_eq!(action_log_count(&db_path, "YARD_EXCHANGE"), 1);

    let conn = railyard_exchange::db::open_sqlite_connection(&db_path).unwrap();
    let payload: String = conn
        .query_row(
            "SELECT payload_json FROM action_log WHERE action_type = 'YARD_EXCHANGE'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value["yard_name"], "Yard A");
    assert_eq!(value["seed"], 1);
}

#[test]
fn test_audit_can_be_disabled() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 3);
    layout.industry("Acme", "Dock", 2, &[]);
    layout.car("B1", "boxcar", "ATSF", yard);

    let mut config = ExchangeConfig::new(db_path.as_str());
    config.audit_enabled = false;
    let report = ExchangeOrchestrator::new(config)
        .run_exchange("Yard A", MoveCount::All, &mut ExchangeRng::from_seed_u64(1))
        .unwrap();

    assert_eq!(report.moved_to_industries.len(), 1);
    assert_eq!(action_log_count(&db_path, "YARD_EXCHANGE"), 0);
}

#[test]
fn test_invariants_hold_across_repeated_exchanges() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let layout = LayoutBuilder::new(&db_path);
    let yard = layout.yard("Yard A", 6);
    layout.industry("Acme", "Dock", 2, &["boxcar", "covered hopper"]);
    layout.industry("Acme", "Door", 1, &["boxcar"]);
    let rack = layout.industry("Bayview", "Rack", 3, &["tank car"]);
    let spur = layout.industry("Cedar", "Spur", 2, &["flatcar", "boxcar"]);
    layout.industry("Delta", "Team Track", 2, &[]);
    layout.cars("B", 3, "boxcar", "ATSF", yard);
    layout.car("H1", "covered hopper", "BN", yard);
    layout.car("R1", "tank car", "UTLX", rack);
    layout.car("F1", "flatcar", "CNW", spur);

    let engine = orchestrator(&db_path);
    for seed in 0..20 {
        engine
            .run_exchange("Yard A", MoveCount::All, &mut ExchangeRng::from_seed_u64(seed))
            .unwrap();
        assert_invariants(&db_path);
        // 车辆总数守恒
        assert_eq!(snapshot(&db_path).len(), 6);
    }
}
