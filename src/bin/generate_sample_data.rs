// 生成导入用的样例Excel文件
//
// 每个文件：表头、数据信息行、空行、数据行。数值以5位小数的文本写入，
// 时间戳从 2025/5/2 14:22:56 开始逐行加1秒。

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_xlsxwriter::Workbook;

use pv_lib::services::infrastructure::excel::{ExcelExporter, IMPORT_COLUMNS, METADATA_LABEL};

const DEVICE_TYPES: [&str; 4] = ["未知", "光伏关断器", "逆变器", "控制器"];

/// 样例文件的生成方式
#[derive(Debug, Clone, Copy)]
enum SampleKind {
    /// 随机基础数据
    Basic,
    /// 电压叠加正弦波动
    VoltageSweep,
    /// 功率放大并附加效率列
    PowerAnalysis,
}

struct SampleFile {
    file_name: &'static str,
    rows: usize,
    device_address: i32,
    device_type: &'static str,
    kind: SampleKind,
}

const SAMPLE_FILES: [SampleFile; 3] = [
    SampleFile {
        file_name: "实验数据_2025_05_02.xlsx",
        rows: 100,
        device_address: 1,
        device_type: "光伏关断器",
        kind: SampleKind::Basic,
    },
    SampleFile {
        file_name: "电压测试记录_20250502.xlsx",
        rows: 75,
        device_address: 2,
        device_type: "逆变器",
        kind: SampleKind::VoltageSweep,
    },
    SampleFile {
        file_name: "功率分析报告.xlsx",
        rows: 200,
        device_address: 3,
        device_type: "控制器",
        kind: SampleKind::PowerAnalysis,
    },
];

#[derive(Parser, Debug)]
#[command(name = "generate_sample_data", about = "生成样例导入文件")]
struct Cli {
    /// 输出目录
    #[arg(short, long, default_value = "sample_data")]
    out_dir: PathBuf,

    /// 随机种子，便于复现
    #[arg(long, default_value_t = 20250502)]
    seed: u64,
}

fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 2)
        .and_then(|d| d.and_hms_opt(14, 22, 56))
        .unwrap_or_default()
}

fn write_sample(sample: &SampleFile, rng: &mut StdRng) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Sheet1")?;

    let mut headers: Vec<&str> = IMPORT_COLUMNS.to_vec();
    if matches!(sample.kind, SampleKind::PowerAnalysis) {
        headers.push("效率");
    }
    ExcelExporter::write_header(worksheet, &headers)?;

    let start = start_time();
    let info = format!(
        "记录时间: {} | 设备地址: {} | 设备类型: {} | 数据点数: {}",
        start.format("%Y/%-m/%-d %H:%M:%S"),
        sample.device_address,
        sample.device_type,
        sample.rows
    );
    worksheet.write_string(1, 0, METADATA_LABEL)?;
    worksheet.write_string(1, 1, &info)?;

    for idx in 0..sample.rows {
        let serial = idx + 1;
        let row = (idx + 3) as u32;
        let current = rng.gen::<f64>() * 2.0 + 0.1;
        let mut voltage = rng.gen::<f64>() * 2.0 + 19.0;
        let mut power = rng.gen::<f64>() * 30.0 + 5.0;
        let mut device_type = DEVICE_TYPES[rng.gen_range(0..DEVICE_TYPES.len())];
        let mut device_address = rng.gen_range(1..=4);

        match sample.kind {
            SampleKind::Basic => {}
            SampleKind::VoltageSweep => {
                voltage += (serial as f64 / 10.0).sin() * 2.0;
                device_address = sample.device_address;
                device_type = sample.device_type;
            }
            SampleKind::PowerAnalysis => {
                power *= 1.0 + rng.gen::<f64>() * 0.5;
                device_address = sample.device_address;
                device_type = sample.device_type;
                let efficiency = 85.0 + rng.gen::<f64>() * 10.0;
                worksheet.write_string(row, 7, format!("{:.2}%", efficiency))?;
            }
        }

        let timestamp = start + Duration::seconds(idx as i64);
        worksheet.write_number(row, 0, serial as f64)?;
        worksheet.write_string(row, 1, format!("{:.5}", current))?;
        worksheet.write_string(row, 2, format!("{:.5}", voltage))?;
        worksheet.write_string(row, 3, format!("{:.5}", power))?;
        worksheet.write_string(row, 4, timestamp.format("%Y/%-m/%-d %H:%M:%S").to_string())?;
        worksheet.write_number(row, 5, device_address as f64)?;
        worksheet.write_string(row, 6, device_type)?;
    }

    worksheet.set_column_width(4, 20)?;
    worksheet.set_column_width(1, 15)?;
    Ok(workbook.save_to_buffer()?)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("创建输出目录失败: {:?}", cli.out_dir))?;

    let mut rng = StdRng::seed_from_u64(cli.seed);
    for sample in SAMPLE_FILES.iter() {
        let bytes = write_sample(sample, &mut rng)?;
        let path = cli.out_dir.join(sample.file_name);
        std::fs::write(&path, &bytes).with_context(|| format!("写入文件失败: {:?}", path))?;
        println!("已生成 {:?} ({} 行)", path, sample.rows);
    }
    Ok(())
}
