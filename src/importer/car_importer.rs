// ==========================================
// 模型铁路调车场交换系统 - 车辆导入器
// ==========================================
// CSV 列: car_number, car_type, build_year, road_name, status, spot_id
// spot_id 列填写车位名称:
// - 空白 / STAGING / OFF_LAYOUT / OFF-LAYOUT → 场外暂存区
// - 无法识别的车位名 → 告警后放入场外暂存区
// 场外暂存车位缺失 → 错误；落位仍经由 set_car_spot 复核容量与车型
// ==========================================

use crate::db::TransactionGuard;
use crate::domain::spot::Spot;
use crate::domain::types::{IndustryType, OFF_LAYOUT_SPOT_NAME};
use crate::importer::csv_source::{open_csv_file, optional, read_rows, required};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_summary::ImportSummary;
use crate::repository::{CarRepository, NewCar, RepositoryError, SpotRepository};
use csv::Reader;
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// 视为"场外暂存"的车位写法
const OFF_LAYOUT_ALIASES: [&str; 4] = ["", "STAGING", "OFF_LAYOUT", "OFF-LAYOUT"];

#[derive(Debug, Deserialize)]
struct CarRow {
    #[serde(default)]
    car_number: String,
    #[serde(default)]
    car_type: String,
    #[serde(default)]
    build_year: String,
    #[serde(default)]
    road_name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    spot_id: String,
}

pub struct CarImporter {
    conn: Arc<Mutex<Connection>>,
    spot_repo: SpotRepository,
    car_repo: CarRepository,
    off_layout_spot_name: String,
}

impl CarImporter {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            spot_repo: SpotRepository::from_connection(conn.clone()),
            car_repo: CarRepository::from_connection(conn.clone()),
            conn,
            off_layout_spot_name: OFF_LAYOUT_SPOT_NAME.to_string(),
        }
    }

    /// 使用自定义的场外暂存车位名称
    pub fn with_off_layout_spot_name(mut self, name: impl Into<String>) -> Self {
        self.off_layout_spot_name = name.into();
        self
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn import_file(&self, path: &Path) -> ImportResult<ImportSummary> {
        let mut reader = open_csv_file(path)?;
        self.import(&mut reader)
    }

    pub fn import<R: Read>(&self, reader: &mut Reader<R>) -> ImportResult<ImportSummary> {
        let rows: Vec<(usize, CarRow)> = read_rows(reader)?;
        let tx = TransactionGuard::begin(self.conn.clone())
            .map_err(ImportError::DatabaseTransactionError)?;

        let off_layout = self
            .spot_repo
            .find_by_name(&self.off_layout_spot_name)?
            .filter(|spot| spot.industry_type == IndustryType::OffLayout)
            .ok_or_else(|| ImportError::OffLayoutSpotMissing(self.off_layout_spot_name.clone()))?;

        let mut known_types: HashSet<String> =
            self.spot_repo.car_type_names()?.into_values().collect();
        let mut summary = ImportSummary {
            rows_read: rows.len(),
            ..Default::default()
        };

        for (row, record) in rows {
            self.import_row(row, &record, &off_layout, &mut known_types, &mut summary)?;
        }

        tx.commit().map_err(ImportError::DatabaseTransactionError)?;
        info!(
            rows = summary.rows_read,
            inserted = summary.inserted,
            redirected = summary.redirected_to_off_layout,
            "车辆导入完成"
        );
        Ok(summary)
    }

    fn import_row(
        &self,
        row: usize,
        record: &CarRow,
        off_layout: &Spot,
        known_types: &mut HashSet<String>,
        summary: &mut ImportSummary,
    ) -> ImportResult<()> {
        let car_number = required(row, "car_number", &record.car_number)?;
        let car_type = required(row, "car_type", &record.car_type)?;
        let road_name = required(row, "road_name", &record.road_name)?;
        let build_year = match optional(&record.build_year) {
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| ImportError::InvalidValue {
                row,
                field: "build_year".to_string(),
                message: format!("不是整数: '{}'", raw),
            })?),
            None => None,
        };

        let reject = |source: RepositoryError| ImportError::RowRejected { row, source };

        let spot_id = self
            .resolve_spot(row, &record.spot_id, off_layout, summary)
            .map_err(reject)?;

        let car_type_id = self.spot_repo.ensure_car_type(&car_type).map_err(reject)?;
        if known_types.insert(car_type.clone()) {
            summary.car_types_created.push(car_type.clone());
        }

        self.car_repo
            .insert_car(&NewCar {
                car_number: car_number.clone(),
                car_type_id,
                build_year,
                road_name,
                status: optional(&record.status),
                spot_id,
            })
            .map_err(reject)?;

        debug!(row, car_number = %car_number, spot_id, "车辆已导入");
        summary.inserted += 1;
        Ok(())
    }

    /// 车位名称 → 车位ID（场外别名与未知名称都落到场外暂存区）
    fn resolve_spot(
        &self,
        row: usize,
        raw_spot: &str,
        off_layout: &Spot,
        summary: &mut ImportSummary,
    ) -> Result<i64, RepositoryError> {
        let normalized = raw_spot.trim().to_uppercase();
        if OFF_LAYOUT_ALIASES.contains(&normalized.as_str()) {
            summary.redirected_to_off_layout += 1;
            return Ok(off_layout.spot_id);
        }

        match self.spot_repo.find_by_name(&normalized)? {
            Some(spot) => Ok(spot.spot_id),
            None => {
                warn!(row, spot = %raw_spot, "车位不存在，改放场外暂存区");
                summary.redirected_to_off_layout += 1;
                Ok(off_layout.spot_id)
            }
        }
    }
}
