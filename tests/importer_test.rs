// ==========================================
// CSV 导入集成测试
// ==========================================


use railyard_exchange::importer::{CarImporter, ImportError, SpotImporter};
use railyard_exchange::logging;
use railyard_exchange::repository::RepositoryError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use test_helpers::*;

const SPOTS_CSV: &str = "\
industry_type,industry_name,spot_name,capacity,service_frequency,allowed_car_types
Off-Layout,Staging,OFF_LAYOUT,1,,
Yard,Clearwater Yard,Yard A,4,,
Industry,Acme Feed,Feed Dock,2,1.0,boxcar|covered hopper
Industry,Bayview Oil,Tank Rack,1,0.5,tank car
Industry,Delta Team Track,Team Track,2,,
";

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn import_spots(db_path: &str, dir: &TempDir) {
    let path = write_csv(dir, "spots.csv", SPOTS_CSV);
    SpotImporter::from_connection(open_conn(db_path))
        .import_file(&path)
        .unwrap();
}

fn count_rows(db_path: &str, table: &str) -> i64 {
    let conn = railyard_exchange::db::open_sqlite_connection(db_path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_import_spots_creates_types_and_whitelists() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "spots.csv", SPOTS_CSV);

    let summary = SpotImporter::from_connection(open_conn(&db_path))
        .import_file(&path)
        .unwrap();

    assert_eq!(summary.rows_read, 5);
    assert_eq!(summary.inserted, 5);
    assert_eq!(
        summary.car_types_created,
        vec!["boxcar", "covered hopper", "tank car"]
    );
    assert_eq!(count_rows(&db_path, "car_spots"), 5);
    assert_eq!(count_rows(&db_path, "spot_allowed_car_types"), 3);
    assert_eq!(count_rows(&db_path, "industry_types"), 3);
}

#[test]
fn test_import_cars_with_off_layout_redirects() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    import_spots(&db_path, &dir);

    let cars = write_csv(
        &dir,
        "cars.csv",
        "\
car_number,car_type,build_year,road_name,status,spot_id
10021,boxcar,1968,ATSF,loaded,Yard A
10388,boxcar,,SP,empty,feed dock
20117,tank car,1975,GATX,loaded,Tank Rack
80150,boxcar,1969,RI,empty,STAGING
80177,tank car,1971,GATX,loaded,
80199,gondola,1963,PRR,empty,Nowhere Spur
",
    );

    let summary = CarImporter::from_connection(open_conn(&db_path))
        .import_file(&cars)
        .unwrap();

    assert_eq!(summary.rows_read, 6);
    assert_eq!(summary.inserted, 6);
    assert_eq!(summary.redirected_to_off_layout, 3);
    assert_eq!(summary.car_types_created, vec!["gondola"]);

    let conn = railyard_exchange::db::open_sqlite_connection(&db_path).unwrap();
    let off_layout_id: i64 = conn
        .query_row(
            "SELECT spot_id FROM car_spots WHERE spot_name = 'OFF_LAYOUT'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(spot_of(&db_path, "80150"), off_layout_id);
    assert_eq!(spot_of(&db_path, "80177"), off_layout_id);
    assert_eq!(spot_of(&db_path, "80199"), off_layout_id);
    assert_ne!(spot_of(&db_path, "10388"), off_layout_id);
    assert_invariants(&db_path);
}

#[test]
fn test_invalid_capacity_rolls_back_whole_file() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "spots.csv",
        "\
industry_type,industry_name,spot_name,capacity,service_frequency,allowed_car_types
Yard,Clearwater Yard,Yard A,4,,
Industry,Acme Feed,Feed Dock,0,,boxcar
",
    );

    let result = SpotImporter::from_connection(open_conn(&db_path)).import_file(&path);

    match result {
        Err(ImportError::InvalidValue { row, field, .. }) => {
            assert_eq!(row, 2);
            assert_eq!(field, "capacity");
        }
        other => panic!("expected InvalidValue, got {:?}", other),
    }
    assert_eq!(count_rows(&db_path, "car_spots"), 0);
}

#[test]
fn test_missing_and_malformed_fields() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();

    let missing = write_csv(
        &dir,
        "missing.csv",
        "\
industry_type,industry_name,spot_name,capacity,service_frequency,allowed_car_types
Industry,,Feed Dock,2,,
",
    );
    let result = SpotImporter::from_connection(open_conn(&db_path)).import_file(&missing);
    assert!(matches!(result, Err(ImportError::MissingField { row: 1, .. })));

    let bad_type = write_csv(
        &dir,
        "bad_type.csv",
        "\
industry_type,industry_name,spot_name,capacity,service_frequency,allowed_car_types
Depot,Somewhere,Door,2,,
",
    );
    let result = SpotImporter::from_connection(open_conn(&db_path)).import_file(&bad_type);
    assert!(matches!(result, Err(ImportError::InvalidValue { .. })));

    let result = SpotImporter::from_connection(open_conn(&db_path))
        .import_file(&dir.path().join("absent.csv"));
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}

#[test]
fn test_cars_require_off_layout_spot() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let spots = write_csv(
        &dir,
        "spots.csv",
        "\
industry_type,industry_name,spot_name,capacity,service_frequency,allowed_car_types
Yard,Clearwater Yard,Yard A,4,,
",
    );
    SpotImporter::from_connection(open_conn(&db_path))
        .import_file(&spots)
        .unwrap();

    let cars = write_csv(
        &dir,
        "cars.csv",
        "car_number,car_type,build_year,road_name,status,spot_id\n1,boxcar,,ATSF,,Yard A\n",
    );
    let result = CarImporter::from_connection(open_conn(&db_path)).import_file(&cars);

    assert!(matches!(result, Err(ImportError::OffLayoutSpotMissing(_))));
    assert_eq!(count_rows(&db_path, "cars"), 0);
}

#[test]
fn test_capacity_violation_rejects_file() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    import_spots(&db_path, &dir);

    let cars = write_csv(
        &dir,
        "cars.csv",
        "\
car_number,car_type,build_year,road_name,status,spot_id
1,tank car,,GATX,,Tank Rack
2,tank car,,GATX,,Tank Rack
",
    );
    let result = CarImporter::from_connection(open_conn(&db_path)).import_file(&cars);

    match result {
        Err(ImportError::RowRejected { row, source }) => {
            assert_eq!(row, 2);
            assert!(matches!(source, RepositoryError::CapacityExceeded { .. }));
        }
        other => panic!("expected RowRejected, got {:?}", other),
    }
    assert_eq!(count_rows(&db_path, "cars"), 0);
}

#[test]
fn test_type_whitelist_and_duplicate_rejected() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    import_spots(&db_path, &dir);

    let wrong_type = write_csv(
        &dir,
        "wrong.csv",
        "car_number,car_type,build_year,road_name,status,spot_id\n1,flatcar,,UP,,Feed Dock\n",
    );
    let result = CarImporter::from_connection(open_conn(&db_path)).import_file(&wrong_type);
    assert!(matches!(
        result,
        Err(ImportError::RowRejected {
            source: RepositoryError::CarTypeNotAllowed { .. },
            ..
        })
    ));

    let duplicate = write_csv(
        &dir,
        "dup.csv",
        "\
car_number,car_type,build_year,road_name,status,spot_id
7,boxcar,,ATSF,,Yard A
7,boxcar,,ATSF,,Yard A
",
    );
    let result = CarImporter::from_connection(open_conn(&db_path)).import_file(&duplicate);
    assert!(matches!(
        result,
        Err(ImportError::RowRejected {
            source: RepositoryError::UniqueConstraintViolation(_),
            ..
        })
    ));
    assert_eq!(count_rows(&db_path, "cars"), 0);
}
