/// 报告生成服务
///
/// 按时间范围统计测试记录，保存分析结果，并导出为 Excel 或 HTML 报告
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

use crate::models::enums::AnalysisType;
use crate::models::structs::{default_id, AnalysisResult, DailyStatistics, RecordQuery};
use crate::services::domain::statistics::{daily_statistics, pass_rate, summarize_measurements, MeasurementSummary};
use crate::services::traits::PersistenceService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::time_utils::{bj_day_start, format_bj, DISPLAY_FORMAT};

const HTML_TEMPLATE_NAME: &str = "analysis_report.html";

/// 报告请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub analysis_type: AnalysisType,
    /// 仅 custom 使用
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// 分析结果中的整体统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStatistics {
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub pass_rate: f64,
    pub device_count: u64,
    pub measurements: MeasurementSummary,
}

/// `AnalysisResult.results` 的结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportContent {
    pub overall: OverallStatistics,
    pub daily: Vec<DailyStatistics>,
}

/// 报告生成服务接口
#[async_trait]
pub trait IReportGenerationService: Send + Sync {
    /// 统计并保存分析结果
    async fn generate(&self, request: &ReportRequest) -> AppResult<AnalysisResult>;

    async fn get_report(&self, id: &str) -> AppResult<AnalysisResult>;

    async fn list_reports(&self) -> AppResult<Vec<AnalysisResult>>;

    /// 导出Excel
    fn render_xlsx(&self, result: &AnalysisResult) -> AppResult<Vec<u8>>;

    /// 导出HTML
    fn render_html(&self, result: &AnalysisResult) -> AppResult<String>;
}

/// 报告生成服务实现
pub struct ReportGenerationService {
    persistence_service: Arc<dyn PersistenceService>,
    template_engine: Tera,
}

/// 根据分析类型计算时间范围
pub fn resolve_range(request: &ReportRequest, now: DateTime<Utc>) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let range = match request.analysis_type {
        AnalysisType::Daily => (bj_day_start(now), now),
        AnalysisType::Weekly => (now - Duration::days(7), now),
        AnalysisType::Monthly => (now - Duration::days(30), now),
        AnalysisType::Custom => match (request.start_date, request.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(AppError::validation_error("自定义报告需要指定开始和结束时间")),
        },
    };
    if range.0 > range.1 {
        return Err(AppError::validation_error("开始时间不能晚于结束时间"));
    }
    Ok(range)
}

impl ReportGenerationService {
    pub fn new(persistence_service: Arc<dyn PersistenceService>) -> AppResult<Self> {
        let mut tera = Tera::default();
        Self::add_default_templates(&mut tera)?;
        Ok(Self { persistence_service, template_engine: tera })
    }

    /// 添加默认模板
    fn add_default_templates(tera: &mut Tera) -> AppResult<()> {
        let html_template = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>测试数据分析报告 - {{ title }}</title>
    <style>
        body { font-family: 'Microsoft YaHei', sans-serif; margin: 20px; }
        .header { text-align: center; margin-bottom: 30px; }
        table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
        th, td { border: 1px solid #ccc; padding: 6px; text-align: center; }
        th { background-color: #f0f0f0; }
        .passed { color: green; font-weight: bold; }
        .failed { color: red; font-weight: bold; }
    </style>
</head>
<body>
    <div class="header">
        <h1>光伏关断器测试数据分析报告</h1>
        <h2>{{ title }}</h2>
        <p>{{ start_date }} 至 {{ end_date }}</p>
    </div>

    <h3>整体统计</h3>
    <table>
        <tr><th>测试总数</th><td>{{ overall.total_tests }}</td></tr>
        <tr><th>合格</th><td class="passed">{{ overall.passed_tests }}</td></tr>
        <tr><th>不合格</th><td class="failed">{{ overall.failed_tests }}</td></tr>
        <tr><th>合格率</th><td>{{ overall.pass_rate | round(precision=1) }}%</td></tr>
        <tr><th>设备数</th><td>{{ overall.device_count }}</td></tr>
        <tr><th>平均功率(W)</th><td>{% if overall.measurements.avg_power %}{{ overall.measurements.avg_power | round(precision=3) }}{% else %}-{% endif %}</td></tr>
    </table>

    <h3>每日统计</h3>
    <table>
        <thead>
            <tr><th>日期</th><th>总数</th><th>合格</th><th>不合格</th><th>合格率</th><th>平均电压(V)</th><th>平均电流(A)</th><th>平均功率(W)</th></tr>
        </thead>
        <tbody>
            {% for day in daily %}
            <tr>
                <td>{{ day.test_day }}</td>
                <td>{{ day.total_tests }}</td>
                <td>{{ day.passed_tests }}</td>
                <td>{{ day.failed_tests }}</td>
                <td>{{ day.pass_rate | round(precision=1) }}%</td>
                <td>{% if day.avg_voltage %}{{ day.avg_voltage | round(precision=3) }}{% else %}-{% endif %}</td>
                <td>{% if day.avg_current %}{{ day.avg_current | round(precision=3) }}{% else %}-{% endif %}</td>
                <td>{% if day.avg_power %}{{ day.avg_power | round(precision=3) }}{% else %}-{% endif %}</td>
            </tr>
            {% endfor %}
        </tbody>
    </table>
    <p>{{ summary }}</p>
    <p>生成时间: {{ created_at }}</p>
</body>
</html>
"#;

        tera.add_raw_template(HTML_TEMPLATE_NAME, html_template)
            .map_err(|e| AppError::template_error(format!("添加默认HTML模板失败: {}", e)))?;
        Ok(())
    }

    fn parse_content(result: &AnalysisResult) -> AppResult<ReportContent> {
        serde_json::from_value(result.results.clone())
            .map_err(|e| AppError::report_generation_error(format!("分析结果格式无效: {}", e)))
    }

    fn title(analysis_type: AnalysisType) -> &'static str {
        match analysis_type {
            AnalysisType::Daily => "日报",
            AnalysisType::Weekly => "周报",
            AnalysisType::Monthly => "月报",
            AnalysisType::Custom => "自定义报告",
        }
    }
}

#[async_trait]
impl IReportGenerationService for ReportGenerationService {
    async fn generate(&self, request: &ReportRequest) -> AppResult<AnalysisResult> {
        let (start, end) = resolve_range(request, Utc::now())?;
        let query = RecordQuery { date_from: Some(start), date_to: Some(end), ascending: true, ..Default::default() };
        let records = self.persistence_service.load_test_records(&query).await?;

        let passed = records.iter().filter(|r| r.is_passed()).count() as u64;
        let mut devices: Vec<i32> = records.iter().filter_map(|r| r.device_address).collect();
        devices.sort_unstable();
        devices.dedup();

        let overall = OverallStatistics {
            total_tests: records.len() as u64,
            passed_tests: passed,
            failed_tests: records.len() as u64 - passed,
            pass_rate: pass_rate(&records),
            device_count: devices.len() as u64,
            measurements: summarize_measurements(&records),
        };
        let content = ReportContent { overall, daily: daily_statistics(&records) };
        let summary = format!(
            "共{}条测试记录，合格率{:.1}%，涉及{}台设备",
            content.overall.total_tests, content.overall.pass_rate, content.overall.device_count
        );

        let result = AnalysisResult {
            id: default_id(),
            analysis_type: request.analysis_type,
            start_date: start,
            end_date: end,
            parameters: Some(serde_json::to_value(request)?),
            results: serde_json::to_value(&content)?,
            summary: Some(summary),
            created_at: Utc::now(),
        };
        self.persistence_service.save_analysis_result(&result).await?;
        info!("分析报告已生成: {} ({})", result.id, request.analysis_type);
        Ok(result)
    }

    async fn get_report(&self, id: &str) -> AppResult<AnalysisResult> {
        self.persistence_service
            .load_analysis_result(id)
            .await?
            .ok_or_else(|| AppError::not_found_error("分析报告", id))
    }

    async fn list_reports(&self) -> AppResult<Vec<AnalysisResult>> {
        self.persistence_service.load_all_analysis_results().await
    }

    fn render_xlsx(&self, result: &AnalysisResult) -> AppResult<Vec<u8>> {
        let content = Self::parse_content(result)?;
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold().set_background_color("#D3D3D3");

        let summary_sheet = workbook.add_worksheet();
        summary_sheet.set_name("统计摘要")?;
        summary_sheet.write_string_with_format(0, 0, "项目", &header_format)?;
        summary_sheet.write_string_with_format(0, 1, "值", &header_format)?;

        let overall = &content.overall;
        let m = &overall.measurements;
        let rows: Vec<(&str, Option<f64>)> = vec![
            ("测试总数", Some(overall.total_tests as f64)),
            ("合格", Some(overall.passed_tests as f64)),
            ("不合格", Some(overall.failed_tests as f64)),
            ("合格率(%)", Some(overall.pass_rate)),
            ("设备数", Some(overall.device_count as f64)),
            ("平均电压(V)", m.avg_voltage),
            ("平均电流(A)", m.avg_current),
            ("平均功率(W)", m.avg_power),
            ("最小功率(W)", m.min_power),
            ("最大功率(W)", m.max_power),
            ("功率标准差", m.std_dev_power),
        ];
        summary_sheet.write_string(1, 0, "报告类型")?;
        summary_sheet.write_string(1, 1, Self::title(result.analysis_type))?;
        summary_sheet.write_string(2, 0, "时间范围")?;
        summary_sheet.write_string(
            2,
            1,
            format!("{} 至 {}", format_bj(result.start_date, DISPLAY_FORMAT), format_bj(result.end_date, DISPLAY_FORMAT)),
        )?;
        for (idx, (label, value)) in rows.iter().enumerate() {
            let row = (idx + 3) as u32;
            summary_sheet.write_string(row, 0, *label)?;
            if let Some(v) = value {
                summary_sheet.write_number(row, 1, *v)?;
            }
        }
        summary_sheet.set_column_width(1, 40)?;

        let daily_sheet = workbook.add_worksheet();
        daily_sheet.set_name("每日统计")?;
        let headers = ["日期", "总数", "合格", "不合格", "合格率(%)", "平均电压(V)", "平均电流(A)", "平均功率(W)", "最小功率(W)", "最大功率(W)"];
        for (col, header) in headers.iter().enumerate() {
            daily_sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        for (idx, day) in content.daily.iter().enumerate() {
            let row = (idx + 1) as u32;
            daily_sheet.write_string(row, 0, day.test_day.format("%Y-%m-%d").to_string())?;
            daily_sheet.write_number(row, 1, day.total_tests as f64)?;
            daily_sheet.write_number(row, 2, day.passed_tests as f64)?;
            daily_sheet.write_number(row, 3, day.failed_tests as f64)?;
            daily_sheet.write_number(row, 4, day.pass_rate)?;
            let optional = [day.avg_voltage, day.avg_current, day.avg_power, day.min_power, day.max_power];
            for (offset, value) in optional.iter().enumerate() {
                if let Some(v) = value {
                    daily_sheet.write_number(row, (5 + offset) as u16, *v)?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn render_html(&self, result: &AnalysisResult) -> AppResult<String> {
        let content = Self::parse_content(result)?;
        let mut context = Context::new();
        context.insert("title", Self::title(result.analysis_type));
        context.insert("start_date", &format_bj(result.start_date, DISPLAY_FORMAT));
        context.insert("end_date", &format_bj(result.end_date, DISPLAY_FORMAT));
        context.insert("created_at", &format_bj(result.created_at, DISPLAY_FORMAT));
        context.insert("summary", &result.summary.clone().unwrap_or_default());
        context.insert("overall", &content.overall);
        context.insert("daily", &content.daily);

        Ok(self.template_engine.render(HTML_TEMPLATE_NAME, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::structs::{TestRecord, FAIL_RESULT, PASS_RESULT};
    use crate::services::infrastructure::SqliteOrmPersistenceService;

    async fn service_with_records() -> ReportGenerationService {
        let persistence = SqliteOrmPersistenceService::new_in_memory().await.unwrap();
        let now = Utc::now();
        let records: Vec<TestRecord> = (0..6)
            .map(|i| {
                let mut r = TestRecord::new(now - Duration::days(i));
                r.voltage = Some(19.5);
                r.current = Some(1.2);
                r.power = Some(20.0 + i as f64);
                r.device_address = Some((i % 2) as i32 + 1);
                r.test_result = Some(if i == 0 { FAIL_RESULT } else { PASS_RESULT }.to_string());
                r
            })
            .collect();
        persistence.insert_test_records(&records).await.unwrap();
        ReportGenerationService::new(Arc::new(persistence)).unwrap()
    }

    #[test]
    fn test_resolve_range() {
        let now = Utc::now();
        let weekly = ReportRequest { analysis_type: AnalysisType::Weekly, start_date: None, end_date: None };
        let (start, end) = resolve_range(&weekly, now).unwrap();
        assert_eq!(end - start, Duration::days(7));

        let custom = ReportRequest { analysis_type: AnalysisType::Custom, start_date: None, end_date: None };
        assert_eq!(resolve_range(&custom, now).unwrap_err().error_code(), "VALIDATION_ERROR");

        let reversed = ReportRequest {
            analysis_type: AnalysisType::Custom,
            start_date: Some(now),
            end_date: Some(now - Duration::days(1)),
        };
        assert!(resolve_range(&reversed, now).is_err());
    }

    #[tokio::test]
    async fn test_generate_weekly_report() {
        let service = service_with_records().await;
        let request = ReportRequest { analysis_type: AnalysisType::Weekly, start_date: None, end_date: None };
        let result = service.generate(&request).await.unwrap();

        let content: ReportContent = serde_json::from_value(result.results.clone()).unwrap();
        assert_eq!(content.overall.total_tests, 6);
        assert_eq!(content.overall.failed_tests, 1);
        assert_eq!(content.overall.device_count, 2);
        assert!(!content.daily.is_empty());

        let stored = service.get_report(&result.id).await.unwrap();
        assert_eq!(stored.id, result.id);
        assert_eq!(service.list_reports().await.unwrap().len(), 1);

        let html = service.render_html(&result).unwrap();
        assert!(html.contains("周报"));
        assert!(html.contains("每日统计"));

        let xlsx = service.render_xlsx(&result).unwrap();
        assert!(xlsx.starts_with(b"PK"), "xlsx 为 zip 格式");
    }

    #[tokio::test]
    async fn test_missing_report_is_not_found() {
        let service = service_with_records().await;
        assert_eq!(service.get_report("missing").await.unwrap_err().error_code(), "NOT_FOUND_ERROR");
    }
}
