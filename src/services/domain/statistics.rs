/// 测试数据统计
///
/// 仪表板汇总和按天统计都是对记录集合的纯计算，
/// 电压/电流/功率的均值和极值只统计三项都有值且不为0的记录
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::models::structs::{DailyStatistics, TestRecord};
use crate::utils::time_utils::{bj_day_start, to_bj};

/// 仪表板统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_tests: u64,
    pub today_tests: u64,
    /// 合格率（%）
    pub pass_rate: f64,
    pub avg_voltage: Option<f64>,
    pub avg_current: Option<f64>,
    pub avg_power: Option<f64>,
    pub min_power: Option<f64>,
    pub max_power: Option<f64>,
    pub active_devices: u64,
    /// 未确认的告警数
    pub recent_alerts: u64,
    pub recent_records: Vec<TestRecord>,
}

/// 测量值汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSummary {
    pub sample_count: u64,
    pub avg_voltage: Option<f64>,
    pub avg_current: Option<f64>,
    pub avg_power: Option<f64>,
    pub min_power: Option<f64>,
    pub max_power: Option<f64>,
    pub std_dev_power: Option<f64>,
}

fn finite(value: f64) -> Option<f64> {
    if value.is_finite() { Some(value) } else { None }
}

/// 对完整测量的记录求均值、极值和功率标准差
pub fn summarize_measurements<'a, I>(records: I) -> MeasurementSummary
where
    I: IntoIterator<Item = &'a TestRecord>,
{
    let mut voltages = Vec::new();
    let mut currents = Vec::new();
    let mut powers = Vec::new();
    for record in records.into_iter().filter(|r| r.has_complete_measurements()) {
        voltages.push(record.voltage.unwrap_or_default());
        currents.push(record.current.unwrap_or_default());
        powers.push(record.power.unwrap_or_default());
    }

    if powers.is_empty() {
        return MeasurementSummary::default();
    }

    MeasurementSummary {
        sample_count: powers.len() as u64,
        avg_voltage: finite(Statistics::mean(&voltages)),
        avg_current: finite(Statistics::mean(&currents)),
        avg_power: finite(Statistics::mean(&powers)),
        min_power: finite(Statistics::min(&powers)),
        max_power: finite(Statistics::max(&powers)),
        std_dev_power: finite(Statistics::std_dev(&powers)),
    }
}

/// 合格率（%），没有记录时为0
pub fn pass_rate<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a TestRecord>,
{
    let (total, passed) = records
        .into_iter()
        .fold((0u64, 0u64), |(t, p), r| (t + 1, p + u64::from(r.is_passed())));
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// 计算仪表板统计
///
/// `records` 为全部记录（任意顺序），今日从北京时间零点算起
pub fn dashboard_stats(records: &[TestRecord], unacknowledged_alerts: u64, now: DateTime<Utc>) -> DashboardStats {
    let day_start = bj_day_start(now);
    let summary = summarize_measurements(records);
    let active_devices: HashSet<i32> = records.iter().filter_map(|r| r.device_address).collect();

    let mut recent: Vec<TestRecord> = records.to_vec();
    recent.sort_by(|a, b| b.test_date.cmp(&a.test_date));
    recent.truncate(10);

    DashboardStats {
        total_tests: records.len() as u64,
        today_tests: records.iter().filter(|r| r.test_date >= day_start).count() as u64,
        pass_rate: pass_rate(records),
        avg_voltage: summary.avg_voltage,
        avg_current: summary.avg_current,
        avg_power: summary.avg_power,
        min_power: summary.min_power,
        max_power: summary.max_power,
        active_devices: active_devices.len() as u64,
        recent_alerts: unacknowledged_alerts,
        recent_records: recent,
    }
}

/// 按北京时间日期分组统计，按日期升序
pub fn daily_statistics(records: &[TestRecord]) -> Vec<DailyStatistics> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&TestRecord>> = BTreeMap::new();
    for record in records {
        by_day.entry(to_bj(record.test_date).date_naive()).or_default().push(record);
    }

    by_day
        .into_iter()
        .map(|(day, day_records)| {
            let total = day_records.len() as u64;
            let passed = day_records.iter().filter(|r| r.is_passed()).count() as u64;
            let summary = summarize_measurements(day_records.iter().copied());
            DailyStatistics {
                test_day: day,
                total_tests: total,
                passed_tests: passed,
                failed_tests: total - passed,
                pass_rate: pass_rate(day_records.iter().copied()),
                avg_voltage: summary.avg_voltage,
                avg_current: summary.avg_current,
                avg_power: summary.avg_power,
                min_power: summary.min_power,
                max_power: summary.max_power,
            }
        })
        .collect()
}
