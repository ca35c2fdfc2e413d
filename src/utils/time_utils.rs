use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

/// 东八区偏移秒数
pub const BJ_OFFSET_SECONDS: i32 = 8 * 3600;

/// 显示与导出统一使用的时间格式
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 返回东八区 `FixedOffset` 对象
#[inline]
pub fn bj_offset() -> FixedOffset {
    FixedOffset::east_opt(BJ_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// 将 `DateTime<Utc>` 转换为北京时间
#[inline]
pub fn to_bj(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
    dt.with_timezone(&bj_offset())
}

/// 将任意时区 DateTime 格式化为北京时间字符串
#[inline]
pub fn format_bj<Tz: TimeZone>(dt: DateTime<Tz>, fmt: &str) -> String {
    dt.with_timezone(&bj_offset()).format(fmt).to_string()
}

/// 北京时间当天零点（UTC表示）
pub fn bj_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let day = to_bj(now).date_naive();
    bj_naive_to_utc(day.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// 北京时间的无时区时间转为UTC
pub fn bj_naive_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    (naive - Duration::seconds(BJ_OFFSET_SECONDS as i64)).and_utc()
}

/// Excel 序列日期（1899-12-30 起的天数，含小数）转换为UTC，序列值按北京时间解释
pub fn excel_serial_to_utc(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial <= 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let naive = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    Some(bj_naive_to_utc(naive))
}

/// 解析导入文件中的时间戳文本
///
/// 支持 RFC3339、`2025-05-02 14:22:56`、`2025/5/2 14:22:56` 以及纯日期，
/// 无时区信息的文本按北京时间解释
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    const FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(bj_naive_to_utc(naive));
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(bj_naive_to_utc);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 5, 2, 6, 22, 56).unwrap();
        assert_eq!(parse_timestamp("2025-05-02 14:22:56"), Some(expected));
        assert_eq!(parse_timestamp("2025/5/2 14:22:56"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-02T06:22:56Z"), Some(expected));
        assert_eq!(parse_timestamp("不是时间"), None);
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn test_excel_serial_date() {
        // 45779 = 2025-05-02，0.5 天 = 12:00 北京时间
        let dt = excel_serial_to_utc(45779.5).expect("序列日期应可转换");
        assert_eq!(format_bj(dt, DISPLAY_FORMAT), "2025-05-02 12:00:00");
        assert!(excel_serial_to_utc(-1.0).is_none());
    }

    #[test]
    fn test_bj_day_start() {
        // 北京时间 2025-05-02 01:00 对应 UTC 2025-05-01 17:00
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 17, 0, 0).unwrap();
        let start = bj_day_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 5, 1, 16, 0, 0).unwrap());
    }
}
