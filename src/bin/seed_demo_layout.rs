// ==========================================
// 模型铁路调车场交换系统 - 演示布局生成
// ==========================================
// 用法: seed_demo_layout [DB_PATH] [--reset]
// 生成两个调车场、若干工业车位、场外暂存区与一批车辆
// ==========================================

use anyhow::{bail, Context, Result};
use railyard_exchange::config::default_db_path;
use railyard_exchange::db::{ensure_schema, open_sqlite_connection};
use railyard_exchange::importer::csv_source::csv_reader;
use railyard_exchange::importer::{CarImporter, SpotImporter};
use railyard_exchange::logging;
use railyard_exchange::report::{LocationSummary, SummaryFilter};
use railyard_exchange::repository::CarRepository;
use std::path::Path;
use std::sync::{Arc, Mutex};

const DEMO_SPOTS: &str = "\
industry_type,industry_name,spot_name,capacity,service_frequency,allowed_car_types
Off-Layout,Staging,OFF_LAYOUT,1,,
Yard,Clearwater Yard,Yard A,8,,
Yard,Clearwater Yard,Yard B,6,,
Industry,Acme Feed & Seed,Feed Dock,2,1.0,boxcar|covered hopper
Industry,Acme Feed & Seed,Seed Door,1,0.5,boxcar
Industry,Bayview Oil,Tank Rack,3,1.0,tank car
Industry,Cedar Lumber,Lumber Spur,2,0.5,flatcar|boxcar
Industry,Delta Team Track,Team Track,2,0.25,
";

const DEMO_CARS: &str = "\
car_number,car_type,build_year,road_name,status,spot_id
10021,boxcar,1968,ATSF,loaded,Yard A
10388,boxcar,1972,SP,empty,Yard A
20117,tank car,1975,GATX,loaded,Yard A
30455,flatcar,1981,UP,empty,Yard A
40610,covered hopper,1979,BN,loaded,Yard A
50033,boxcar,1966,MILW,empty,Seed Door
50081,tank car,1970,UTLX,empty,Tank Rack
60102,flatcar,1984,CNW,loaded,Lumber Spur
70204,reefer,1977,PFE,loaded,Team Track
80150,boxcar,1969,RI,empty,STAGING
80177,tank car,1971,GATX,loaded,
80199,gondola,1963,PRR,empty,OFF_LAYOUT
80233,boxcar,1974,WP,loaded,Yard B
";

fn main() -> Result<()> {
    logging::init();

    let mut db_path = None;
    let mut reset = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--reset" => reset = true,
            _ => db_path = Some(arg),
        }
    }
    let db_path = db_path.unwrap_or_else(default_db_path);

    if Path::new(&db_path).exists() {
        if !reset {
            bail!("数据库已存在: {}（使用 --reset 覆盖）", db_path);
        }
        std::fs::remove_file(&db_path).with_context(|| format!("无法删除旧数据库: {}", db_path))?;
    }

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let spots = SpotImporter::from_connection(conn.clone())
        .import(&mut csv_reader(DEMO_SPOTS.as_bytes()))?;
    println!("车位: {}", spots);

    let cars = CarImporter::from_connection(conn.clone())
        .import(&mut csv_reader(DEMO_CARS.as_bytes()))?;
    println!("车辆: {}", cars);

    let summary = LocationSummary::load(&CarRepository::from_connection(conn), SummaryFilter::All)?;
    print!("{}", summary);
    println!("演示布局已写入 {}", db_path);
    Ok(())
}
