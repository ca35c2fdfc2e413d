/// 领域服务层模块
/// 包含仿真计算、控制面板、设备监控和统计等核心逻辑

/// 波形仿真 - 纯函数计算采样序列
pub mod waveform_generator;

/// 实时指标模拟 - 定时生成并广播数据点
pub mod metric_ticker;

/// 点动控制面板 - 系统/设备状态和自动测试序列
pub mod control_panel;

/// 设备监控 - 合并设备与最新记录，带请求序号的刷新
pub mod device_monitor;

/// 统计计算 - 仪表板汇总和按天统计
pub mod statistics;

// 重新导出常用类型
pub use waveform_generator::{
    generate_waveform, waveform_to_csv, WaveformCursor, WaveformParams, WaveformReading, WaveformSample,
};
pub use metric_ticker::{LiveMetric, MetricTicker};
pub use control_panel::{ControlPanel, ControlParameters, ControlState, SequenceStep, TEST_SEQUENCE};
pub use device_monitor::{snapshot_from, DeviceMonitor, MonitorSnapshot, MonitoredDevice};
pub use statistics::{daily_statistics, dashboard_stats, summarize_measurements, DashboardStats, MeasurementSummary};
