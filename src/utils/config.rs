/// 配置管理模块
///
/// 配置文件为JSON格式，不存在时写入默认配置；
/// 部署相关的少量字段可以通过环境变量覆盖
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::utils::error::{AppError, AppResult};

/// 应用程序配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 应用程序基本设置
    pub app_settings: AppSettings,
    /// HTTP服务配置
    pub server_config: ServerConfig,
    /// 持久化配置
    pub persistence_config: PersistenceConfig,
    /// 日志配置
    pub logging_config: LoggingConfig,
    /// Excel导入配置
    pub import_config: ImportConfig,
    /// 设备监控配置
    pub monitor_config: MonitorConfig,
    /// 仿真与实时模拟配置
    pub simulation_config: SimulationSettings,
}

/// 应用程序基本设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub app_name: String,
    pub app_version: String,
    /// 运行环境 (development, testing, production)
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 是否允许任意来源的跨域请求（前端开发服务器）
    pub cors_allow_any: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite数据库文件路径
    pub database_path: PathBuf,
    /// 使用内存数据库（测试和演示用）
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub log_level: String,
    pub console_output: bool,
    pub file_output: bool,
    /// 日志目录
    pub log_dir: PathBuf,
}

/// Excel导入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 表头之后跳过的行数（数据信息行 + 空行）
    pub skip_rows_after_header: usize,
    /// 设备类型为空时的默认值
    pub default_device_type: String,
    /// 导入记录的默认测试结果
    pub default_test_result: String,
    /// 允许的文件扩展名
    pub allowed_extensions: Vec<String>,
    /// 数据页面分页大小，请求未指定时使用
    pub page_size: u64,
    /// 上传请求体上限（字节），文件以base64编码上传
    pub max_upload_bytes: usize,
}

/// 设备监控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 后台刷新周期（秒）
    pub refresh_interval_secs: u64,
    /// 最近一次数据在该窗口内视为在线（秒）
    pub online_window_secs: i64,
    /// 每次刷新拉取的数据时间窗口（秒）
    pub refresh_window_secs: i64,
    /// 初始加载的最新测试记录条数
    pub latest_records_limit: u64,
}

/// 仿真与实时模拟配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// 波形采样点数
    pub default_points: usize,
    /// 实时指标刷新周期（毫秒）
    pub ticker_interval_ms: u64,
    /// 实时指标保留的历史点数
    pub ticker_history: usize,
    /// 控制面板参数刷新周期（毫秒）
    pub control_tick_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: "PvShutoffTesting".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_allow_any: true,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/pv_test_data.sqlite"),
            in_memory: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            skip_rows_after_header: 2,
            default_device_type: "未知".to_string(),
            default_test_result: "合格".to_string(),
            allowed_extensions: vec!["xlsx".to_string(), "xls".to_string()],
            page_size: 20,
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5,
            online_window_secs: 60,
            refresh_window_secs: 10,
            latest_records_limit: 100,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            default_points: 200,
            ticker_interval_ms: 1000,
            ticker_history: 20,
            control_tick_ms: 1000,
        }
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: AppConfig,
    config_file_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_file_path: PathBuf) -> Self {
        Self {
            config: AppConfig::default(),
            config_file_path,
        }
    }

    /// 从文件加载配置，文件不存在时写入默认配置
    pub async fn load_from_file(&mut self) -> AppResult<()> {
        if !self.config_file_path.exists() {
            self.save_to_file().await?;
            return Ok(());
        }

        let content = tokio::fs::read_to_string(&self.config_file_path)
            .await
            .map_err(|e| AppError::io_error(format!("读取配置文件失败: {}", e), e.kind().to_string()))?;

        self.config = serde_json::from_str(&content)
            .map_err(|e| AppError::configuration_error(format!("解析配置文件失败: {}", e)))?;

        Ok(())
    }

    pub async fn save_to_file(&self) -> AppResult<()> {
        if let Some(parent) = self.config_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await
                    .map_err(|e| AppError::io_error(format!("创建配置目录失败: {}", e), e.kind().to_string()))?;
            }
        }

        let content = serde_json::to_string_pretty(&self.config)
            .map_err(|e| AppError::json_error(format!("序列化配置失败: {}", e)))?;

        tokio::fs::write(&self.config_file_path, content)
            .await
            .map_err(|e| AppError::io_error(format!("写入配置文件失败: {}", e), e.kind().to_string()))?;

        Ok(())
    }

    /// 使用环境变量覆盖部署相关配置
    pub fn override_from_env(&mut self) {
        if let Ok(host) = std::env::var("PV_SERVER_HOST") {
            self.config.server_config.host = host;
        }
        if let Ok(port) = std::env::var("PV_SERVER_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.config.server_config.port = port,
                Err(_) => {
                    crate::log_config_warning!("忽略无效的 PV_SERVER_PORT: {}", port);
                }
            }
        }
        if let Ok(path) = std::env::var("PV_DATABASE_PATH") {
            self.config.persistence_config.database_path = PathBuf::from(path);
        }
        if let Ok(log_level) = std::env::var("PV_LOG_LEVEL") {
            self.config.logging_config.log_level = log_level;
        }
        if let Ok(env) = std::env::var("APP_ENVIRONMENT") {
            self.config.app_settings.environment = env;
        }
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn get_config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    pub fn validate_config(&self) -> AppResult<()> {
        if self.config.server_config.host.is_empty() {
            return Err(AppError::configuration_error("服务监听地址不能为空"));
        }

        let valid_environments = ["development", "testing", "production"];
        if !valid_environments.contains(&self.config.app_settings.environment.as_str()) {
            return Err(AppError::configuration_error(format!(
                "无效的环境配置: {}，有效值: {:?}",
                self.config.app_settings.environment, valid_environments
            )));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging_config.log_level.as_str()) {
            return Err(AppError::configuration_error(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.config.logging_config.log_level, valid_log_levels
            )));
        }

        if self.config.import_config.page_size == 0 {
            return Err(AppError::configuration_error("分页大小必须大于0"));
        }
        if self.config.import_config.max_upload_bytes == 0 {
            return Err(AppError::configuration_error("上传大小上限必须大于0"));
        }

        let monitor = &self.config.monitor_config;
        if monitor.refresh_interval_secs == 0 || monitor.online_window_secs <= 0 {
            return Err(AppError::configuration_error("监控刷新周期和在线窗口必须大于0"));
        }

        let simulation = &self.config.simulation_config;
        if simulation.default_points == 0 || simulation.ticker_history == 0 {
            return Err(AppError::configuration_error("采样点数和历史点数必须大于0"));
        }

        Ok(())
    }

    pub fn reset_to_default(&mut self) {
        self.config = AppConfig::default();
    }
}

/// 加载、覆盖并校验配置，服务启动时使用
pub async fn load_app_config(config_path: PathBuf) -> AppResult<AppConfig> {
    let mut manager = ConfigManager::new(config_path);
    manager.load_from_file().await?;
    manager.override_from_env();
    manager.validate_config()?;
    Ok(manager.into_config())
}
