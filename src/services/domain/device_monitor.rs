/// 设备实时监控
///
/// 将设备表与最新测试记录合并为监控视图，并定期用最近几秒的记录刷新。
/// 每次刷新先领取一个请求序号，结果按序号应用，较早请求的结果晚到时直接丢弃。
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::models::structs::{Device, TestRecord};
use crate::services::traits::PersistenceService;

/// 监控视图中的一台设备
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredDevice {
    pub device_address: i32,
    pub name: String,
    pub device_type: Option<String>,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
}

impl MonitoredDevice {
    fn from_device(device: &Device) -> Self {
        Self {
            device_address: device.device_address,
            name: device.display_name(),
            device_type: device.device_type.clone(),
            online: false,
            last_seen: None,
            voltage: None,
            current: None,
            power: None,
        }
    }

    fn unknown(address: i32) -> Self {
        Self {
            device_address: address,
            name: format!("设备 {}", address),
            device_type: None,
            online: false,
            last_seen: None,
            voltage: None,
            current: None,
            power: None,
        }
    }

    fn apply_record(&mut self, record: &TestRecord) {
        if self.last_seen.is_some_and(|seen| seen > record.test_date) {
            return;
        }
        self.last_seen = Some(record.test_date);
        self.voltage = record.voltage;
        self.current = record.current;
        self.power = record.power;
        if self.device_type.is_none() {
            self.device_type = record.device_type.clone();
        }
    }
}

/// 监控快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub devices: Vec<MonitoredDevice>,
    pub online_count: usize,
    pub offline_count: usize,
    pub monitoring: bool,
    /// 最近一次生效的刷新序号
    pub applied_seq: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 地址缺失或为0（导入时的默认值）的记录不对应任何设备
fn valid_address(record: &TestRecord) -> Option<i32> {
    record.device_address.filter(|address| *address > 0)
}

/// 合并设备表和最新记录，按地址升序
///
/// 最新记录在在线窗口内的设备视为在线，未登记地址命名为"设备 {地址}"
pub fn snapshot_from(
    devices: &[Device],
    latest_records: &[TestRecord],
    now: DateTime<Utc>,
    online_window: Duration,
) -> Vec<MonitoredDevice> {
    let mut merged: BTreeMap<i32, MonitoredDevice> = devices
        .iter()
        .map(|d| (d.device_address, MonitoredDevice::from_device(d)))
        .collect();

    for record in latest_records {
        let Some(address) = valid_address(record) else { continue };
        merged
            .entry(address)
            .or_insert_with(|| MonitoredDevice::unknown(address))
            .apply_record(record);
    }

    let mut list: Vec<MonitoredDevice> = merged.into_values().collect();
    for device in list.iter_mut() {
        device.online = device.last_seen.is_some_and(|seen| now - seen <= online_window);
    }
    list
}

struct MonitorState {
    devices: Vec<MonitoredDevice>,
    applied_seq: u64,
    updated_at: Option<DateTime<Utc>>,
}

/// 设备监控服务
pub struct DeviceMonitor {
    state: RwLock<MonitorState>,
    next_seq: AtomicU64,
    monitoring: AtomicBool,
    online_window: Duration,
    refresh_window: Duration,
    latest_limit: u64,
}

impl DeviceMonitor {
    pub fn new(online_window_secs: i64, refresh_window_secs: i64, latest_limit: u64) -> Self {
        Self {
            state: RwLock::new(MonitorState { devices: Vec::new(), applied_seq: 0, updated_at: None }),
            next_seq: AtomicU64::new(1),
            monitoring: AtomicBool::new(true),
            online_window: Duration::seconds(online_window_secs),
            refresh_window: Duration::seconds(refresh_window_secs),
            latest_limit,
        }
    }

    /// 领取刷新请求序号
    pub fn begin_request(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    pub fn set_monitoring(&self, enabled: bool) {
        self.monitoring.store(enabled, Ordering::SeqCst);
        info!("设备监控已{}", if enabled { "开启" } else { "暂停" });
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.read().await;
        let online_count = state.devices.iter().filter(|d| d.online).count();
        MonitorSnapshot {
            devices: state.devices.clone(),
            online_count,
            offline_count: state.devices.len() - online_count,
            monitoring: self.is_monitoring(),
            applied_seq: state.applied_seq,
            updated_at: state.updated_at,
        }
    }

    /// 全量加载结果，序号过期时返回 false 且不修改状态
    pub async fn apply_load(
        &self,
        seq: u64,
        devices: &[Device],
        latest_records: &[TestRecord],
        now: DateTime<Utc>,
    ) -> bool {
        let mut state = self.state.write().await;
        if seq <= state.applied_seq {
            debug!("丢弃过期的监控加载结果 #{} (已应用 #{})", seq, state.applied_seq);
            return false;
        }
        state.devices = snapshot_from(devices, latest_records, now, self.online_window);
        state.applied_seq = seq;
        state.updated_at = Some(now);
        true
    }

    /// 增量刷新：近期记录对应的设备置为在线并更新读数，超出在线窗口的设备置为离线
    pub async fn apply_refresh(&self, seq: u64, recent_records: &[TestRecord], now: DateTime<Utc>) -> bool {
        let mut state = self.state.write().await;
        if seq <= state.applied_seq {
            debug!("丢弃过期的监控刷新结果 #{} (已应用 #{})", seq, state.applied_seq);
            return false;
        }

        for record in recent_records {
            let Some(address) = valid_address(record) else { continue };
            if let Some(device) = state.devices.iter_mut().find(|d| d.device_address == address) {
                device.apply_record(record);
            }
        }
        let window = self.online_window;
        for device in state.devices.iter_mut() {
            device.online = device.last_seen.is_some_and(|seen| now - seen <= window);
        }
        state.applied_seq = seq;
        state.updated_at = Some(now);
        true
    }

    /// 从存储全量加载
    pub async fn load(&self, persistence: &dyn PersistenceService) -> AppResult<MonitorSnapshot> {
        let seq = self.begin_request();
        let devices = persistence.load_all_devices().await?;
        let latest = persistence.load_latest_records(self.latest_limit).await?;
        self.apply_load(seq, &devices, &latest, Utc::now()).await;
        Ok(self.snapshot().await)
    }

    /// 用最近刷新窗口内的记录刷新
    pub async fn refresh(&self, persistence: &dyn PersistenceService) -> AppResult<MonitorSnapshot> {
        let seq = self.begin_request();
        let now = Utc::now();
        let recent = persistence.load_records_since(now - self.refresh_window).await?;
        self.apply_refresh(seq, &recent, now).await;
        Ok(self.snapshot().await)
    }

    /// 后台轮询，监控暂停时跳过
    pub fn spawn_poller(
        self: &Arc<Self>,
        persistence: Arc<dyn PersistenceService>,
        interval: StdDuration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = monitor.load(persistence.as_ref()).await {
                error!("设备监控初始加载失败: {}", e);
            }
            let mut timer = tokio::time::interval(interval);
            timer.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = timer.tick() => {
                        if !monitor.is_monitoring() {
                            continue;
                        }
                        if let Err(e) = monitor.refresh(persistence.as_ref()).await {
                            error!("设备监控刷新失败: {}", e);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 2, 6, 0, 0).unwrap()
    }

    fn record(address: i32, secs_ago: i64, voltage: f64) -> TestRecord {
        let mut r = TestRecord::new(now() - Duration::seconds(secs_ago));
        r.device_address = Some(address);
        r.voltage = Some(voltage);
        r
    }

    #[test]
    fn test_snapshot_merges_devices_and_records() {
        let mut d1 = Device::new(1);
        d1.device_name = Some("1号关断器".to_string());
        let devices = vec![Device::new(3), d1];
        let records = vec![record(1, 10, 20.1), record(1, 30, 19.0), record(3, 120, 19.5), record(7, 5, 21.0)];

        let list = snapshot_from(&devices, &records, now(), Duration::seconds(60));
        let addresses: Vec<i32> = list.iter().map(|d| d.device_address).collect();
        assert_eq!(addresses, vec![1, 3, 7]);

        assert_eq!(list[0].name, "1号关断器");
        assert!(list[0].online);
        assert_eq!(list[0].voltage, Some(20.1), "应使用最新的记录");
        assert!(!list[1].online, "超过60秒视为离线");
        assert_eq!(list[2].name, "设备 7");
        assert!(list[2].online);
    }

    #[test]
    fn test_zero_address_is_not_a_device() {
        let records = vec![record(0, 5, 20.0), record(2, 5, 19.8)];
        let list = snapshot_from(&[Device::new(1)], &records, now(), Duration::seconds(60));
        let addresses: Vec<i32> = list.iter().map(|d| d.device_address).collect();
        assert_eq!(addresses, vec![1, 2], "地址为0的记录不应生成设备");
        assert!(!list[0].online);
    }

    #[tokio::test]
    async fn test_refresh_updates_and_expires() {
        let monitor = DeviceMonitor::new(60, 10, 100);
        let seq = monitor.begin_request();
        let devices = vec![Device::new(1), Device::new(2)];
        assert!(monitor.apply_load(seq, &devices, &[record(1, 50, 19.0)], now()).await);
        assert_eq!(monitor.snapshot().await.online_count, 1);

        let later = now() + Duration::seconds(20);
        let mut fresh = record(2, 0, 20.5);
        fresh.test_date = later;
        let seq = monitor.begin_request();
        assert!(monitor.apply_refresh(seq, &[fresh], later).await);

        let snapshot = monitor.snapshot().await;
        assert!(!snapshot.devices[0].online, "设备1最后记录已超过60秒");
        assert!(snapshot.devices[1].online);
        assert_eq!(snapshot.devices[1].voltage, Some(20.5));
        assert_eq!(snapshot.offline_count, 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let monitor = DeviceMonitor::new(60, 10, 100);
        let devices = vec![Device::new(1)];
        let slow = monitor.begin_request();
        let fast = monitor.begin_request();

        assert!(monitor.apply_load(fast, &devices, &[record(1, 1, 21.0)], now()).await);
        assert!(!monitor.apply_refresh(slow, &[record(1, 0, 99.0)], now()).await);

        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.applied_seq, fast);
        assert_eq!(snapshot.devices[0].voltage, Some(21.0));
    }

    #[test]
    fn test_monitoring_toggle() {
        let monitor = DeviceMonitor::new(60, 10, 100);
        assert!(monitor.is_monitoring());
        monitor.set_monitoring(false);
        assert!(!monitor.is_monitoring());
    }

    #[tokio::test]
    async fn test_poller_loads_once_on_start() {
        use crate::services::infrastructure::SqliteOrmPersistenceService;

        let store = SqliteOrmPersistenceService::new_in_memory().await.unwrap();
        store.save_device(&Device::new(1)).await.unwrap();
        let persistence: Arc<dyn PersistenceService> = Arc::new(store);

        let monitor = Arc::new(DeviceMonitor::new(60, 10, 100));
        let cancel = CancellationToken::new();
        let handle = monitor.spawn_poller(persistence, StdDuration::from_secs(3600), cancel.clone());

        let mut snapshot = monitor.snapshot().await;
        for _ in 0..200 {
            if snapshot.applied_seq > 0 {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
            snapshot = monitor.snapshot().await;
        }
        // 启动时只做一次全量加载，首个刷新周期未到
        assert_eq!(snapshot.applied_seq, 1);
        assert_eq!(snapshot.devices.len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }
}
