/// 控制台 + 文件日志实现

use crate::utils::config::LoggingConfig;
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write as IoWrite};
use std::sync::{Arc, Mutex};

/// 全局只安装一次
static LOGGER_INSTALLED: OnceCell<()> = OnceCell::new();

/// 实现 log::Log trait 的简单日志器
pub struct SimpleLogger {
    console_output: bool,
    file_writer: Arc<Mutex<Option<BufWriter<std::fs::File>>>>,
}

impl SimpleLogger {
    pub fn new(config: &LoggingConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut writer = None;
        if config.file_output {
            std::fs::create_dir_all(&config.log_dir)?;
            let file_name = format!("pv_server_{}.log", Local::now().format("%Y%m%d"));
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(config.log_dir.join(file_name))?;
            writer = Some(BufWriter::new(file));
        }

        Ok(Self {
            console_output: config.console_output,
            file_writer: Arc::new(Mutex::new(writer)),
        })
    }

    fn write_to_console(&self, record: &Record) {
        let message = format!(
            "[{}] [{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        );

        match record.level() {
            log::Level::Error => eprintln!("\x1b[31m{}\x1b[0m", message),
            log::Level::Warn => eprintln!("\x1b[33m{}\x1b[0m", message),
            _ => println!("{}", message),
        }
    }

    fn write_to_file(&self, record: &Record) {
        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(writer) = writer_guard.as_mut() {
                let message = format!(
                    "[{}] [{}] [{}] - {}\n",
                    Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    record.args()
                );

                if let Err(e) = writer.write_all(message.as_bytes()) {
                    eprintln!("写入日志文件失败: {}", e);
                } else {
                    let _ = writer.flush();
                }
            }
        }
    }
}

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if self.console_output {
            self.write_to_console(record);
        }
        self.write_to_file(record);
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();

        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(writer) = writer_guard.as_mut() {
                let _ = writer.flush();
            }
        }
    }
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// 安装全局日志器
///
/// 重复调用直接返回；文件无法创建时退回 env_logger 仅输出到控制台
pub fn init_logging(config: &LoggingConfig) {
    LOGGER_INSTALLED.get_or_init(|| {
        let level = parse_level(&config.log_level);
        match SimpleLogger::new(config) {
            Ok(logger) => {
                if log::set_boxed_logger(Box::new(logger)).is_ok() {
                    log::set_max_level(level);
                }
            }
            Err(e) => {
                eprintln!("日志文件初始化失败，使用控制台日志: {}", e);
                let _ = env_logger::Builder::new().filter_level(level).try_init();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warn"), LevelFilter::Warn);
        assert_eq!(parse_level("未知"), LevelFilter::Info);
    }

    #[test]
    fn test_file_logger_writes_line() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let config = LoggingConfig {
            log_level: "info".to_string(),
            console_output: false,
            file_output: true,
            log_dir: dir.path().to_path_buf(),
        };
        let logger = SimpleLogger::new(&config).expect("创建日志器失败");
        logger.write_to_file(
            &Record::builder()
                .args(format_args!("[数据导入] 测试消息"))
                .level(log::Level::Info)
                .target("pv_lib")
                .build(),
        );
        logger.flush();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).expect("读取目录失败").collect();
        assert_eq!(entries.len(), 1, "应生成一个日志文件");
        let path = entries[0].as_ref().expect("目录项无效").path();
        let content = std::fs::read_to_string(path).expect("读取日志失败");
        assert!(content.contains("[数据导入] 测试消息"));
    }
}
