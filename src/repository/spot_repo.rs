// ==========================================
// 模型铁路调车场交换系统 - 车位数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: car_spots / industries / industry_types / car_types /
//       spot_allowed_car_types 的查询与写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::spot::{AllowedCarTypes, Spot, SpotOccupancy};
use crate::domain::types::IndustryType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 车位查询的公共列
const SPOT_COLUMNS: &str = r#"
    cs.spot_id, cs.spot_name, cs.industry_id, i.industry_name,
    it.industry_type_name, cs.capacity, cs.service_frequency
"#;

/// 车位查询的公共关联
const SPOT_JOINS: &str = r#"
    FROM car_spots cs
    JOIN industries i ON cs.industry_id = i.industry_id
    JOIN industry_types it ON i.industry_type_id = it.industry_type_id
"#;

/// 把 industry_type_name 解析为 IndustryType
pub(crate) fn parse_industry_type(row: &Row<'_>, idx: usize) -> SqliteResult<IndustryType> {
    let raw: String = row.get(idx)?;
    raw.parse::<IndustryType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn map_spot_row(row: &Row<'_>) -> SqliteResult<Spot> {
    Ok(Spot {
        spot_id: row.get(0)?,
        spot_name: row.get(1)?,
        industry_id: row.get(2)?,
        industry_name: row.get(3)?,
        industry_type: parse_industry_type(row, 4)?,
        capacity: row.get(5)?,
        service_frequency: row.get(6)?,
    })
}

/// 车位名比较键: 去首尾空白 + 小写
fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ==========================================
// SpotRepository - 车位仓储
// ==========================================
pub struct SpotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SpotRepository {
    /// 创建新的车位仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按名称查找调车场车位（不区分大小写，必须为 Yard 类型）
    ///
    /// 名称比较在 Rust 侧做 Unicode 小写折叠（SQLite 的 UPPER 只处理 ASCII）
    ///
    /// # 返回
    /// - Ok(Some(Spot)): 找到（同名时取 spot_id 最小者）
    /// - Ok(None): 名称不存在或不是 Yard
    pub fn find_yard_by_name(&self, yard_name: &str) -> RepositoryResult<Option<Spot>> {
        let key = name_key(yard_name);
        Ok(self
            .list_yard_spots()?
            .into_iter()
            .filter(|spot| name_key(&spot.spot_name) == key)
            .min_by_key(|spot| spot.spot_id))
    }

    /// 按名称查找任意车位（不区分大小写）
    pub fn find_by_name(&self, spot_name: &str) -> RepositoryResult<Option<Spot>> {
        let key = name_key(spot_name);
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} {} ORDER BY cs.spot_id", SPOT_COLUMNS, SPOT_JOINS);
        let mut stmt = conn.prepare(&sql)?;
        let spots = stmt
            .query_map([], map_spot_row)?
            .collect::<SqliteResult<Vec<Spot>>>()?;
        Ok(spots
            .into_iter()
            .find(|spot| name_key(&spot.spot_name) == key))
    }

    /// 列出所有调车场车位（按车位名排序）
    pub fn list_yard_spots(&self) -> RepositoryResult<Vec<Spot>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} {} WHERE it.industry_type_name = ?1 ORDER BY cs.spot_name",
            SPOT_COLUMNS, SPOT_JOINS
        );
        let mut stmt = conn.prepare(&sql)?;
        let spots = stmt
            .query_map(params![IndustryType::Yard.to_db_str()], map_spot_row)?
            .collect::<SqliteResult<Vec<Spot>>>()?;
        Ok(spots)
    }

    /// 按产业类型列出车位及当前占用
    ///
    /// 排序: 产业名, 再按车位名（目录顺序，对应实际线路布局）
    pub fn list_with_occupancy(
        &self,
        industry_type: IndustryType,
    ) -> RepositoryResult<Vec<SpotOccupancy>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}, COUNT(c.car_number) AS occupancy
            {}
            LEFT JOIN cars c ON c.spot_id = cs.spot_id
            WHERE it.industry_type_name = ?1
            GROUP BY cs.spot_id
            ORDER BY i.industry_name, cs.spot_name, cs.spot_id
            "#,
            SPOT_COLUMNS, SPOT_JOINS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![industry_type.to_db_str()], |row| {
                Ok(SpotOccupancy {
                    spot: map_spot_row(row)?,
                    occupancy: row.get(7)?,
                })
            })?
            .collect::<SqliteResult<Vec<SpotOccupancy>>>()?;
        Ok(rows)
    }

    /// 统计车位上的车辆数
    pub fn count_cars_at(&self, spot_id: i64) -> RepositoryResult<u32> {
        let conn = self.get_conn()?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM cars WHERE spot_id = ?1",
            params![spot_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 全部车位的允许车型（未出现的车位 = 接受任意车型）
    pub fn allowed_types_map(&self) -> RepositoryResult<HashMap<i64, AllowedCarTypes>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT spot_id, car_type_id FROM spot_allowed_car_types")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;

        let mut map: HashMap<i64, AllowedCarTypes> = HashMap::new();
        for row in rows {
            let (spot_id, car_type_id) = row?;
            map.entry(spot_id).or_default().insert(car_type_id);
        }
        Ok(map)
    }

    /// 单个车位的允许车型
    pub fn allowed_types_for(&self, spot_id: i64) -> RepositoryResult<AllowedCarTypes> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT car_type_id FROM spot_allowed_car_types WHERE spot_id = ?1")?;
        let ids = stmt
            .query_map(params![spot_id], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<Vec<i64>>>()?;
        Ok(AllowedCarTypes::from_ids(ids))
    }

    /// 车型 ID → 名称
    pub fn car_type_names(&self) -> RepositoryResult<HashMap<i64, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT car_type_id, car_type_name FROM car_types")?;
        let names = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<SqliteResult<HashMap<i64, String>>>()?;
        Ok(names)
    }

    // ==========================================
    // 写入操作（供导入使用）
    // ==========================================

    /// 确保产业类型存在，返回其ID
    pub fn ensure_industry_type(&self, industry_type: IndustryType) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO industry_types (industry_type_name) VALUES (?1)",
            params![industry_type.to_db_str()],
        )?;
        let id = conn.query_row(
            "SELECT industry_type_id FROM industry_types WHERE industry_type_name = ?1",
            params![industry_type.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 确保产业存在，返回其ID
    ///
    /// 已存在同名产业但类型不同 → ValidationError
    pub fn ensure_industry(
        &self,
        industry_name: &str,
        industry_type_id: i64,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO industries (industry_name, industry_type_id) VALUES (?1, ?2)",
            params![industry_name, industry_type_id],
        )?;
        let (id, existing_type_id): (i64, i64) = conn.query_row(
            "SELECT industry_id, industry_type_id FROM industries WHERE industry_name = ?1",
            params![industry_name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if existing_type_id != industry_type_id {
            return Err(RepositoryError::ValidationError(format!(
                "产业 '{}' 已以其他类型存在",
                industry_name
            )));
        }
        Ok(id)
    }

    /// 确保车型存在，返回其ID
    pub fn ensure_car_type(&self, car_type_name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO car_types (car_type_name) VALUES (?1)",
            params![car_type_name],
        )?;
        let id = conn.query_row(
            "SELECT car_type_id FROM car_types WHERE car_type_name = ?1",
            params![car_type_name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 插入车位，返回其ID
    pub fn insert_spot(
        &self,
        spot_name: &str,
        industry_id: i64,
        capacity: u32,
        service_frequency: Option<f64>,
    ) -> RepositoryResult<i64> {
        if capacity == 0 {
            return Err(RepositoryError::ValidationError(format!(
                "车位 '{}' 容量必须大于 0",
                spot_name
            )));
        }
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO car_spots (spot_name, industry_id, capacity, service_frequency)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![spot_name, industry_id, capacity, service_frequency],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 为车位添加允许车型
    pub fn add_allowed_type(&self, spot_id: i64, car_type_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO spot_allowed_car_types (spot_id, car_type_id) VALUES (?1, ?2)",
            params![spot_id, car_type_id],
        )?;
        Ok(())
    }
}
