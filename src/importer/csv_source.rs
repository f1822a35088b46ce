// ==========================================
// 模型铁路调车场交换系统 - CSV 读取
// ==========================================
// 表头与字段两端空白会被去除；允许行长度不一致
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::{Reader, ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 从任意 reader 构造 CSV 读取器
pub fn csv_reader<R: Read>(input: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input)
}

/// 打开 CSV 文件
pub fn open_csv_file(path: &Path) -> ImportResult<Reader<File>> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    Ok(csv_reader(file))
}

/// 反序列化全部数据行
///
/// # 返回
/// (行号, 记录) 列表，行号从 1 开始、不含表头
pub fn read_rows<R: Read, T: DeserializeOwned>(reader: &mut Reader<R>) -> ImportResult<Vec<(usize, T)>> {
    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<T>().enumerate() {
        let row = idx + 1;
        let record = result.map_err(|e| ImportError::CsvParseError(format!("行 {}: {}", row, e)))?;
        rows.push((row, record));
    }
    Ok(rows)
}

/// 必填字段
pub fn required(row: usize, field: &str, value: &str) -> ImportResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ImportError::MissingField {
            row,
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// 可选字段（空白 → None）
pub fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
