/// Excel文件导入
///
/// 解析测试数据表格：第一行为表头，按中文列名取值，
/// 表头后固定跳过若干行（数据信息行 + 空行），只保留"序号"为数字的数据行
use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, DataType, Reader};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::log_file_parsing_failure;
use crate::utils::time_utils::{excel_serial_to_utc, parse_timestamp};

/// 导入/导出共用的列名
pub const COL_SERIAL: &str = "序号";
pub const COL_CURRENT: &str = "电流 (A)";
pub const COL_VOLTAGE: &str = "电压 (V)";
pub const COL_POWER: &str = "功率 (W)";
pub const COL_TIMESTAMP: &str = "时间戳";
pub const COL_ADDRESS: &str = "设备地址";
pub const COL_DEVICE_TYPE: &str = "设备类型";

/// 导入文件的标准列顺序
pub const IMPORT_COLUMNS: [&str; 7] = [
    COL_SERIAL, COL_CURRENT, COL_VOLTAGE, COL_POWER, COL_TIMESTAMP, COL_ADDRESS, COL_DEVICE_TYPE,
];

/// 解析出的一行数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedRow {
    pub serial: i64,
    pub current: Option<f64>,
    pub voltage: Option<f64>,
    pub power: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub device_address: Option<i32>,
    pub device_type: Option<String>,
}

/// 一个工作簿的解析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<ImportedRow>,
}

/// Excel导入器
pub struct ExcelImporter {
    skip_rows_after_header: usize,
}

impl ExcelImporter {
    pub fn new(skip_rows_after_header: usize) -> Self {
        Self { skip_rows_after_header }
    }

    /// 解析上传的文件内容（xlsx / xls）
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> AppResult<ParsedSheet> {
        info!("开始解析Excel文件: {} ({} 字节)", file_name, bytes.len());

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| AppError::import_error(file_name, format!("无法打开Excel文件: {}", e)))?;

        let sheet_names = workbook.sheet_names().to_owned();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| AppError::import_error(file_name, "Excel文件中没有工作表"))?;

        let range = match workbook.worksheet_range(&sheet_name) {
            Some(Ok(range)) => range,
            Some(Err(e)) => return Err(AppError::import_error(file_name, format!("无法读取工作表: {}", e))),
            None => return Err(AppError::import_error(file_name, format!("工作表不存在: {}", sheet_name))),
        };

        let mut rows_iter = range.rows();
        let header_row = rows_iter
            .next()
            .ok_or_else(|| AppError::import_error(file_name, "工作表为空"))?;
        let headers: Vec<String> = header_row.iter().map(|c| c.to_string().trim().to_string()).collect();
        let columns = Self::map_columns(&headers);
        if !columns.contains_key(COL_SERIAL) {
            return Err(AppError::import_error(file_name, format!("缺少必需的列: {}", COL_SERIAL)));
        }
        for column in IMPORT_COLUMNS.iter().skip(1) {
            if !columns.contains_key(*column) {
                warn!("[EXCEL_PARSE] {} 缺少列 '{}'，该字段将使用默认值", file_name, column);
            }
        }

        let mut rows = Vec::new();
        for (offset, row) in rows_iter.skip(self.skip_rows_after_header).enumerate() {
            // Excel中的实际行号：表头1行 + 跳过行 + 偏移
            let row_number = offset + self.skip_rows_after_header + 2;
            match Self::parse_row(row, &columns) {
                Some(parsed) => rows.push(parsed),
                None => {
                    if row.iter().any(|c| !matches!(c, DataType::Empty)) {
                        log_file_parsing_failure!("{} 第{}行序号无效，已忽略", file_name, row_number);
                    }
                }
            }
        }

        info!("Excel解析完成: {}，工作表 {}，有效数据 {} 行", file_name, sheet_name, rows.len());
        Ok(ParsedSheet { sheet_name, headers, rows })
    }

    /// 列名归一化：去空白，全角括号转半角
    pub fn normalize_header(header: &str) -> String {
        header
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '（' => '(',
                '）' => ')',
                other => other,
            })
            .collect()
    }

    /// 标准列名 -> 列索引
    fn map_columns(headers: &[String]) -> HashMap<&'static str, usize> {
        let normalized: Vec<String> = headers.iter().map(|h| Self::normalize_header(h)).collect();
        IMPORT_COLUMNS
            .iter()
            .filter_map(|column| {
                let wanted = Self::normalize_header(column);
                normalized.iter().position(|h| *h == wanted).map(|idx| (*column, idx))
            })
            .collect()
    }

    /// 解析数据行，序号不是数字或为0时返回 None
    fn parse_row(row: &[DataType], columns: &HashMap<&'static str, usize>) -> Option<ImportedRow> {
        let cell = |name: &str| columns.get(name).and_then(|idx| row.get(*idx));

        let serial = cell(COL_SERIAL).and_then(cell_to_f64)?;
        if serial == 0.0 || serial.fract() != 0.0 {
            return None;
        }

        Some(ImportedRow {
            serial: serial as i64,
            current: cell(COL_CURRENT).and_then(cell_to_f64),
            voltage: cell(COL_VOLTAGE).and_then(cell_to_f64),
            power: cell(COL_POWER).and_then(cell_to_f64),
            timestamp: cell(COL_TIMESTAMP).and_then(cell_to_datetime),
            device_address: cell(COL_ADDRESS).and_then(cell_to_f64).map(|v| v.trunc() as i32),
            device_type: cell(COL_DEVICE_TYPE).and_then(cell_to_text),
        })
    }
}

impl Default for ExcelImporter {
    fn default() -> Self {
        Self::new(2)
    }
}

/// 单元格转数值，文本单元格按数字解析（允许百分号）
fn cell_to_f64(cell: &DataType) -> Option<f64> {
    match cell {
        DataType::Float(v) => Some(*v),
        DataType::Int(v) => Some(*v as f64),
        DataType::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').trim();
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

fn cell_to_text(cell: &DataType) -> Option<String> {
    match cell {
        DataType::Empty => None,
        other => {
            let text = other.to_string().trim().to_string();
            if text.is_empty() { None } else { Some(text) }
        }
    }
}

/// 时间戳：Excel日期序列值或文本
fn cell_to_datetime(cell: &DataType) -> Option<DateTime<Utc>> {
    match cell {
        DataType::DateTime(serial) | DataType::Float(serial) => excel_serial_to_utc(*serial),
        DataType::String(s) => parse_timestamp(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(ExcelImporter::normalize_header("电流 (A)"), "电流(A)");
        assert_eq!(ExcelImporter::normalize_header("电流（A）"), "电流(A)");
        assert_eq!(ExcelImporter::normalize_header(" 序号 "), "序号");
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(cell_to_f64(&DataType::String("19.52341".to_string())), Some(19.52341));
        assert_eq!(cell_to_f64(&DataType::String("87.20%".to_string())), Some(87.2));
        assert_eq!(cell_to_f64(&DataType::String("数据信息".to_string())), None);
        assert_eq!(cell_to_f64(&DataType::Int(3)), Some(3.0));
        assert_eq!(cell_to_text(&DataType::Empty), None);
        assert!(cell_to_datetime(&DataType::String("2025/5/2 14:22:56".to_string())).is_some());
    }

    #[test]
    fn test_rows_need_nonzero_integer_serial() {
        let headers: Vec<String> = IMPORT_COLUMNS.iter().map(|h| h.to_string()).collect();
        let columns = ExcelImporter::map_columns(&headers);
        let row = |serial: DataType| {
            vec![
                serial,
                DataType::String("1.2".to_string()),
                DataType::String("20.1".to_string()),
                DataType::String("24.1".to_string()),
                DataType::String("2025/5/2 14:22:56".to_string()),
                DataType::Float(1.0),
                DataType::String("光伏关断器".to_string()),
            ]
        };

        let parsed = ExcelImporter::parse_row(&row(DataType::Float(3.0)), &columns).expect("序号3应保留");
        assert_eq!(parsed.serial, 3);
        assert_eq!(parsed.device_address, Some(1));
        assert!(ExcelImporter::parse_row(&row(DataType::Float(0.0)), &columns).is_none());
        assert!(ExcelImporter::parse_row(&row(DataType::String("0".to_string())), &columns).is_none());
        assert!(ExcelImporter::parse_row(&row(DataType::Float(1.5)), &columns).is_none());
        assert!(ExcelImporter::parse_row(&row(DataType::String("数据信息".to_string())), &columns).is_none());
    }

    #[test]
    fn test_invalid_bytes_are_rejected() {
        let importer = ExcelImporter::default();
        let err = importer.parse_bytes("坏文件.xlsx", b"not an excel file").expect_err("应解析失败");
        assert_eq!(err.error_code(), "IMPORT_ERROR");
    }
}
