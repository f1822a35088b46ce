// ==========================================
// 模型铁路调车场交换系统 - 车位导入器
// ==========================================
// CSV 列: industry_type, industry_name, spot_name, capacity,
//         service_frequency, allowed_car_types（| 分隔）
// 产业类型 / 产业 / 车型按需创建；整个文件一个事务
// ==========================================

use crate::db::TransactionGuard;
use crate::domain::types::IndustryType;
use crate::importer::csv_source::{open_csv_file, optional, read_rows, required};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_summary::ImportSummary;
use crate::repository::{RepositoryError, SpotRepository};
use csv::Reader;
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct SpotRow {
    #[serde(default)]
    industry_type: String,
    #[serde(default)]
    industry_name: String,
    #[serde(default)]
    spot_name: String,
    #[serde(default)]
    capacity: String,
    #[serde(default)]
    service_frequency: String,
    #[serde(default)]
    allowed_car_types: String,
}

pub struct SpotImporter {
    conn: Arc<Mutex<Connection>>,
    spot_repo: SpotRepository,
}

impl SpotImporter {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            spot_repo: SpotRepository::from_connection(conn.clone()),
            conn,
        }
    }

    /// 从文件导入
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn import_file(&self, path: &Path) -> ImportResult<ImportSummary> {
        let mut reader = open_csv_file(path)?;
        self.import(&mut reader)
    }

    /// 从任意 CSV 读取器导入
    pub fn import<R: Read>(&self, reader: &mut Reader<R>) -> ImportResult<ImportSummary> {
        let rows: Vec<(usize, SpotRow)> = read_rows(reader)?;
        let tx = TransactionGuard::begin(self.conn.clone())
            .map_err(ImportError::DatabaseTransactionError)?;

        let mut known_types: HashSet<String> =
            self.spot_repo.car_type_names()?.into_values().collect();
        let mut summary = ImportSummary {
            rows_read: rows.len(),
            ..Default::default()
        };

        for (row, record) in rows {
            self.import_row(row, &record, &mut known_types, &mut summary)?;
        }

        tx.commit().map_err(ImportError::DatabaseTransactionError)?;
        info!(rows = summary.rows_read, inserted = summary.inserted, "车位导入完成");
        Ok(summary)
    }

    fn import_row(
        &self,
        row: usize,
        record: &SpotRow,
        known_types: &mut HashSet<String>,
        summary: &mut ImportSummary,
    ) -> ImportResult<()> {
        let industry_type: IndustryType = required(row, "industry_type", &record.industry_type)?
            .parse()
            .map_err(|message| ImportError::InvalidValue {
                row,
                field: "industry_type".to_string(),
                message,
            })?;
        let industry_name = required(row, "industry_name", &record.industry_name)?;
        let spot_name = required(row, "spot_name", &record.spot_name)?;

        let raw_capacity = required(row, "capacity", &record.capacity)?;
        let capacity = match raw_capacity.parse::<i64>() {
            Ok(c) if c > 0 => u32::try_from(c).map_err(|_| ImportError::InvalidValue {
                row,
                field: "capacity".to_string(),
                message: format!("容量超出范围: {}", c),
            })?,
            Ok(c) => {
                return Err(ImportError::InvalidValue {
                    row,
                    field: "capacity".to_string(),
                    message: format!("容量必须大于 0，实际 {}", c),
                })
            }
            Err(_) => {
                return Err(ImportError::InvalidValue {
                    row,
                    field: "capacity".to_string(),
                    message: format!("不是整数: '{}'", raw_capacity),
                })
            }
        };

        let service_frequency = match optional(&record.service_frequency) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| ImportError::InvalidValue {
                row,
                field: "service_frequency".to_string(),
                message: format!("不是数字: '{}'", raw),
            })?),
            None => None,
        };

        let reject = |source: RepositoryError| ImportError::RowRejected { row, source };

        let type_id = self.spot_repo.ensure_industry_type(industry_type).map_err(reject)?;
        let industry_id = self
            .spot_repo
            .ensure_industry(&industry_name, type_id)
            .map_err(reject)?;
        let spot_id = self
            .spot_repo
            .insert_spot(&spot_name, industry_id, capacity, service_frequency)
            .map_err(reject)?;

        for car_type in record
            .allowed_car_types
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let car_type_id = self.spot_repo.ensure_car_type(car_type).map_err(reject)?;
            if known_types.insert(car_type.to_string()) {
                summary.car_types_created.push(car_type.to_string());
            }
            self.spot_repo
                .add_allowed_type(spot_id, car_type_id)
                .map_err(reject)?;
        }

        debug!(row, industry = %industry_name, spot = %spot_name, capacity, "车位已导入");
        summary.inserted += 1;
        Ok(())
    }
}
