// 创建SQLite数据库并写入初始设备与系统配置

use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use serde_json::json;

use pv_lib::models::structs::{Device, SystemConfig};
use pv_lib::services::infrastructure::SqliteOrmPersistenceService;
use pv_lib::services::traits::PersistenceService;

/// 设备地址与类型，与样例数据一致
const SEED_DEVICES: [(i32, &str); 4] = [(1, "光伏关断器"), (2, "逆变器"), (3, "控制器"), (4, "光伏关断器")];

#[derive(Parser, Debug)]
#[command(name = "create_db", about = "创建测试数据库")]
struct Cli {
    /// 数据库文件路径
    #[arg(short, long, default_value = "data/pv_test_data.sqlite")]
    path: PathBuf,

    /// 不写入初始设备
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    println!("正在创建SQLite数据库: {:?}", cli.path);
    let persistence = SqliteOrmPersistenceService::new(Some(&cli.path)).await?;

    if !cli.no_seed {
        let mut created = 0;
        for (address, device_type) in SEED_DEVICES {
            if persistence.load_device_by_address(address).await?.is_some() {
                continue;
            }
            let mut device = Device::new(address);
            device.device_name = Some(format!("设备{}", address));
            device.device_type = Some(device_type.to_string());
            persistence.save_device(&device).await?;
            created += 1;
        }
        println!("已写入 {} 台初始设备", created);

        if persistence.load_system_config("data_retention_days").await?.is_none() {
            persistence
                .save_system_config(&SystemConfig {
                    config_key: "data_retention_days".to_string(),
                    config_value: json!(365),
                    description: Some("测试数据保留天数".to_string()),
                    updated_at: Utc::now(),
                })
                .await?;
        }
    }

    let devices = persistence.load_all_devices().await?;
    for device in &devices {
        println!(
            "  地址 {} - {}",
            device.device_address,
            device.device_type.as_deref().unwrap_or("未知")
        );
    }
    println!("数据库创建完成，共 {} 台设备", devices.len());
    Ok(())
}
