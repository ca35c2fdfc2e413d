/// 测试记录导出
///
/// CSV 用于数据页面下载，XLSX 与导入格式保持一致，可直接重新导入
use chrono::{DateTime, Utc};
use log::debug;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::AppResult;
use crate::models::structs::TestRecord;
use crate::services::infrastructure::excel::excel_importer::IMPORT_COLUMNS;
use crate::utils::time_utils::{format_bj, DISPLAY_FORMAT};

/// CSV 表头
pub const CSV_HEADERS: [&str; 7] = [
    "测试日期", "电压(V)", "电流(A)", "功率(W)", "设备地址", "设备类型", "测试结果",
];

/// 元数据行首列文本
pub const METADATA_LABEL: &str = "数据信息";

const UTF8_BOM: char = '\u{FEFF}';

/// CSV 下载文件名：test_records_yyyyMMdd_HHmmss.csv
pub fn csv_file_name(now: DateTime<Utc>) -> String {
    format!("test_records_{}.csv", format_bj(now, "%Y%m%d_%H%M%S"))
}

/// XLSX 下载文件名
pub fn xlsx_file_name(now: DateTime<Utc>) -> String {
    format!("test_records_{}.xlsx", format_bj(now, "%Y%m%d_%H%M%S"))
}

/// 文件大小显示：B / KB / MB，保留1位小数
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < MB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{:.1} MB", size / MB)
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn opt_to_string<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// 生成CSV文本（带BOM，行之间以 \n 分隔）
pub fn records_to_csv(records: &[TestRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for record in records {
        let fields = [
            format_bj(record.test_date, DISPLAY_FORMAT),
            opt_to_string(&record.voltage),
            opt_to_string(&record.current),
            opt_to_string(&record.power),
            opt_to_string(&record.device_address),
            opt_to_string(&record.device_type),
            opt_to_string(&record.test_result),
        ];
        let line: Vec<String> = fields.iter().map(|f| escape_csv_field(f)).collect();
        lines.push(line.join(","));
    }

    format!("{}{}", UTF8_BOM, lines.join("\n"))
}

/// XLSX导出器
pub struct ExcelExporter;

impl ExcelExporter {
    /// 按导入格式写出工作簿：表头、数据信息行、空行、数据行
    pub fn records_to_xlsx(records: &[TestRecord], info: &str) -> AppResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("测试数据")?;

        Self::write_header(worksheet, &IMPORT_COLUMNS)?;
        worksheet.write_string(1, 0, METADATA_LABEL)?;
        worksheet.write_string(1, 1, info)?;
        // 第2行留空

        for (idx, record) in records.iter().enumerate() {
            let row = (idx + 3) as u32;
            worksheet.write_number(row, 0, (idx + 1) as f64)?;
            if let Some(current) = record.current {
                worksheet.write_number(row, 1, current)?;
            }
            if let Some(voltage) = record.voltage {
                worksheet.write_number(row, 2, voltage)?;
            }
            if let Some(power) = record.power {
                worksheet.write_number(row, 3, power)?;
            }
            worksheet.write_string(row, 4, format_bj(record.test_date, DISPLAY_FORMAT))?;
            if let Some(address) = record.device_address {
                worksheet.write_number(row, 5, address as f64)?;
            }
            if let Some(device_type) = &record.device_type {
                worksheet.write_string(row, 6, device_type)?;
            }
        }

        worksheet.set_column_width(4, 20)?;
        let buffer = workbook.save_to_buffer()?;
        debug!("XLSX导出完成: {} 条记录, {} 字节", records.len(), buffer.len());
        Ok(buffer)
    }

    /// 加粗表头
    pub fn write_header(worksheet: &mut Worksheet, headers: &[&str]) -> AppResult<()> {
        let bold = Format::new().set_bold();
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_csv_file_name_uses_beijing_time() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 6, 22, 56).unwrap();
        assert_eq!(csv_file_name(now), "test_records_20250502_142256.csv");
    }

    #[test]
    fn test_records_to_csv() {
        let mut record = TestRecord::new(Utc.with_ymd_and_hms(2025, 5, 2, 6, 22, 56).unwrap());
        record.voltage = Some(19.5);
        record.current = Some(1.25);
        record.device_address = Some(2);
        record.device_type = Some("逆变器,A型".to_string());
        record.test_result = Some("合格".to_string());

        let csv = records_to_csv(&[record]);
        assert!(csv.starts_with('\u{FEFF}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{FEFF}').split('\n').collect();
        assert_eq!(lines[0], "测试日期,电压(V),电流(A),功率(W),设备地址,设备类型,测试结果");
        assert_eq!(lines[1], "2025-05-02 14:22:56,19.5,1.25,,2,\"逆变器,A型\",合格");
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let csv = records_to_csv(&[]);
        assert_eq!(csv.trim_start_matches('\u{FEFF}').lines().count(), 1);
    }
}
