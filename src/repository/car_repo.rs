// ==========================================
// 模型铁路调车场交换系统 - 车辆数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 例外: set_car_spot 在写入前复核车位不变式（容量 / 车型），
//       作为引擎之外的最后一道防线
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::car::{Car, CarLocation};
use crate::domain::spot::AllowedCarTypes;
use crate::domain::types::IndustryType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::spot_repo::parse_industry_type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const CAR_SELECT: &str = r#"
    SELECT c.car_number, c.car_type_id, ct.car_type_name, c.road_name, c.spot_id
    FROM cars c
    JOIN car_types ct ON c.car_type_id = ct.car_type_id
"#;

fn map_car_row(row: &Row<'_>) -> SqliteResult<Car> {
    Ok(Car {
        car_number: row.get(0)?,
        car_type_id: row.get(1)?,
        car_type_name: row.get(2)?,
        road_name: row.get(3)?,
        spot_id: row.get(4)?,
    })
}

/// 新车辆（导入用）
#[derive(Debug, Clone)]
pub struct NewCar {
    pub car_number: String,
    pub car_type_id: i64,
    pub build_year: Option<i32>,
    pub road_name: String,
    pub status: Option<String>,
    pub spot_id: i64,
}

// ==========================================
// CarRepository - 车辆仓储
// ==========================================
pub struct CarRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CarRepository {
    /// 创建新的车辆仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 车位上的车辆，按路局标记、车号排序
    pub fn list_at_spot(&self, spot_id: i64) -> RepositoryResult<Vec<Car>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE c.spot_id = ?1 ORDER BY c.road_name, c.car_number",
            CAR_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let cars = stmt
            .query_map(params![spot_id], map_car_row)?
            .collect::<SqliteResult<Vec<Car>>>()?;
        Ok(cars)
    }

    /// 某类产业车位上的全部车辆，按车号排序
    ///
    /// 用途: 置换时的占用者快照、补车候选池
    pub fn list_by_industry_type(&self, industry_type: IndustryType) -> RepositoryResult<Vec<Car>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            {}
            JOIN car_spots cs ON c.spot_id = cs.spot_id
            JOIN industries i ON cs.industry_id = i.industry_id
            JOIN industry_types it ON i.industry_type_id = it.industry_type_id
            WHERE it.industry_type_name = ?1
            ORDER BY c.car_number
            "#,
            CAR_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let cars = stmt
            .query_map(params![industry_type.to_db_str()], map_car_row)?
            .collect::<SqliteResult<Vec<Car>>>()?;
        Ok(cars)
    }

    /// 指定产业类型下全部车辆的位置
    ///
    /// 排序: 产业类型, 产业名, 车位名, 路局标记, 车号
    pub fn list_locations(
        &self,
        industry_types: &[IndustryType],
    ) -> RepositoryResult<Vec<CarLocation>> {
        if industry_types.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = (1..=industry_types.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT it.industry_type_name, i.industry_name, cs.spot_name, c.road_name, c.car_number
            FROM cars c
            JOIN car_spots cs ON c.spot_id = cs.spot_id
            JOIN industries i ON cs.industry_id = i.industry_id
            JOIN industry_types it ON i.industry_type_id = it.industry_type_id
            WHERE it.industry_type_name IN ({})
            ORDER BY it.industry_type_name, i.industry_name, cs.spot_name, c.road_name, c.car_number
            "#,
            placeholders
        );
        let names: Vec<&str> = industry_types.iter().map(|t| t.to_db_str()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(names.iter()), |row| {
                Ok(CarLocation {
                    industry_type: parse_industry_type(row, 0)?,
                    industry_name: row.get(1)?,
                    spot_name: row.get(2)?,
                    road_name: row.get(3)?,
                    car_number: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<CarLocation>>>()?;
        Ok(rows)
    }

    /// 按车号查找
    pub fn find_by_number(&self, car_number: &str) -> RepositoryResult<Option<Car>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE c.car_number = ?1", CAR_SELECT);
        let car = conn.query_row(&sql, params![car_number], map_car_row).optional()?;
        Ok(car)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 单车改位: UPDATE cars SET spot_id
    ///
    /// 写入前复核:
    /// - 车辆与目标车位存在
    /// - 目标车位有空位（场外暂存区不限）
    /// - 车型在目标车位白名单内（空白名单 = 任意）
    pub fn set_car_spot(&self, car_number: &str, spot_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let (car_type_id, car_type_name, current_spot_id): (i64, String, i64) = conn
            .query_row(
                r#"
                SELECT c.car_type_id, ct.car_type_name, c.spot_id
                FROM cars c
                JOIN car_types ct ON c.car_type_id = ct.car_type_id
                WHERE c.car_number = ?1
                "#,
                params![car_number],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Car".to_string(),
                id: car_number.to_string(),
            })?;

        if current_spot_id == spot_id {
            return Ok(());
        }

        let (spot_name, capacity, industry_type): (String, u32, IndustryType) = conn
            .query_row(
                r#"
                SELECT cs.spot_name, cs.capacity, it.industry_type_name
                FROM car_spots cs
                JOIN industries i ON cs.industry_id = i.industry_id
                JOIN industry_types it ON i.industry_type_id = it.industry_type_id
                WHERE cs.spot_id = ?1
                "#,
                params![spot_id],
                |row| Ok((row.get(0)?, row.get(1)?, parse_industry_type(row, 2)?)),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Spot".to_string(),
                id: spot_id.to_string(),
            })?;

        if !industry_type.is_unbounded() {
            let occupancy: u32 = conn.query_row(
                "SELECT COUNT(*) FROM cars WHERE spot_id = ?1",
                params![spot_id],
                |row| row.get(0),
            )?;
            if occupancy >= capacity {
                return Err(RepositoryError::CapacityExceeded {
                    spot_name,
                    capacity,
                    occupancy,
                });
            }
        }

        let allowed = {
            let mut stmt =
                conn.prepare("SELECT car_type_id FROM spot_allowed_car_types WHERE spot_id = ?1")?;
            let ids = stmt
                .query_map(params![spot_id], |row| row.get::<_, i64>(0))?
                .collect::<SqliteResult<Vec<i64>>>()?;
            AllowedCarTypes::from_ids(ids)
        };
        if !allowed.accepts(car_type_id) {
            return Err(RepositoryError::CarTypeNotAllowed {
                car_number: car_number.to_string(),
                car_type_name,
                spot_name,
            });
        }

        conn.execute(
            "UPDATE cars SET spot_id = ?1 WHERE car_number = ?2",
            params![spot_id, car_number],
        )?;
        Ok(())
    }

    /// 两车互换位置（置换专用）
    ///
    /// 两个车位的占用数不变，只复核车型白名单；
    /// 满场调车场与单车位互换时，逐一 set_car_spot 会被容量复核拒绝。
    ///
    /// # 参数
    /// - `incoming`: 来车（进入对方车位）
    /// - `evicted`: 被逐出车辆（进入来车原车位）
    pub fn swap_car_spots(&self, incoming: &str, evicted: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let locate = |car_number: &str| -> RepositoryResult<(i64, String, i64, String)> {
            conn.query_row(
                r#"
                SELECT c.car_type_id, ct.car_type_name, c.spot_id, cs.spot_name
                FROM cars c
                JOIN car_types ct ON c.car_type_id = ct.car_type_id
                JOIN car_spots cs ON c.spot_id = cs.spot_id
                WHERE c.car_number = ?1
                "#,
                params![car_number],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Car".to_string(),
                id: car_number.to_string(),
            })
        };
        let (in_type_id, in_type_name, in_spot_id, in_spot_name) = locate(incoming)?;
        let (ev_type_id, ev_type_name, ev_spot_id, ev_spot_name) = locate(evicted)?;

        let allowed_at = |spot_id: i64| -> RepositoryResult<AllowedCarTypes> {
            let mut stmt =
                conn.prepare("SELECT car_type_id FROM spot_allowed_car_types WHERE spot_id = ?1")?;
            let ids = stmt
                .query_map(params![spot_id], |row| row.get::<_, i64>(0))?
                .collect::<SqliteResult<Vec<i64>>>()?;
            Ok(AllowedCarTypes::from_ids(ids))
        };
        if !allowed_at(ev_spot_id)?.accepts(in_type_id) {
            return Err(RepositoryError::CarTypeNotAllowed {
                car_number: incoming.to_string(),
                car_type_name: in_type_name,
                spot_name: ev_spot_name,
            });
        }
        if !allowed_at(in_spot_id)?.accepts(ev_type_id) {
            return Err(RepositoryError::CarTypeNotAllowed {
                car_number: evicted.to_string(),
                car_type_name: ev_type_name,
                spot_name: in_spot_name,
            });
        }

        conn.execute(
            "UPDATE cars SET spot_id = ?1 WHERE car_number = ?2",
            params![in_spot_id, evicted],
        )?;
        conn.execute(
            "UPDATE cars SET spot_id = ?1 WHERE car_number = ?2",
            params![ev_spot_id, incoming],
        )?;
        Ok(())
    }

    /// 插入车辆（导入用，同样复核容量与车型）
    pub fn insert_car(&self, car: &NewCar) -> RepositoryResult<()> {
        {
            let conn = self.get_conn()?;
            let off_layout_id: i64 = conn
                .query_row(
                    r#"
                    SELECT cs.spot_id
                    FROM car_spots cs
                    JOIN industries i ON cs.industry_id = i.industry_id
                    JOIN industry_types it ON i.industry_type_id = it.industry_type_id
                    WHERE it.industry_type_name = ?1
                    ORDER BY cs.spot_id LIMIT 1
                    "#,
                    params![IndustryType::OffLayout.to_db_str()],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "Spot".to_string(),
                    id: IndustryType::OffLayout.to_db_str().to_string(),
                })?;

            // 先落在场外暂存区，再经 set_car_spot 走统一复核
            conn.execute(
                r#"
                INSERT INTO cars (car_number, car_type_id, build_year, road_name, status, spot_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    car.car_number,
                    car.car_type_id,
                    car.build_year,
                    car.road_name,
                    car.status,
                    off_layout_id,
                ],
            )?;
        }

        if let Err(e) = self.set_car_spot(&car.car_number, car.spot_id) {
            let conn = self.get_conn()?;
            conn.execute(
                "DELETE FROM cars WHERE car_number = ?1",
                params![car.car_number],
            )?;
            return Err(e);
        }
        Ok(())
    }
}
