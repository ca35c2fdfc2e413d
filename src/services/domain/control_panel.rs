/// 点动控制面板
///
/// 维护系统启停、急停、4路设备开关和控制模式，周期性刷新模拟参数，
/// 并可运行固定的自动测试序列。急停会立即终止正在运行的序列。
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::log_simulation_event;
use crate::models::enums::ControlMode;

/// 受控设备数量
pub const DEVICE_COUNT: usize = 4;

/// 模拟参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlParameters {
    pub system_voltage: f64,
    pub output_current: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub frequency: f64,
    pub efficiency: f64,
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            system_voltage: 738.0,
            output_current: 0.0,
            temperature: 25.6,
            pressure: 101.3,
            frequency: 50.0,
            efficiency: 0.0,
        }
    }
}

/// 序列步骤动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceAction {
    Init,
    Device1On,
    VoltageTest,
    Device2On,
    LoadTest,
    Shutdown,
}

/// 自动测试序列中的一步
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequenceStep {
    pub id: u8,
    pub name: &'static str,
    pub duration_ms: u64,
    pub action: SequenceAction,
}

/// 固定的自动测试序列
pub const TEST_SEQUENCE: [SequenceStep; 6] = [
    SequenceStep { id: 1, name: "系统初始化", duration_ms: 2000, action: SequenceAction::Init },
    SequenceStep { id: 2, name: "设备1开启", duration_ms: 1000, action: SequenceAction::Device1On },
    SequenceStep { id: 3, name: "电压稳定测试", duration_ms: 3000, action: SequenceAction::VoltageTest },
    SequenceStep { id: 4, name: "设备2开启", duration_ms: 1000, action: SequenceAction::Device2On },
    SequenceStep { id: 5, name: "负载测试", duration_ms: 5000, action: SequenceAction::LoadTest },
    SequenceStep { id: 6, name: "系统关闭", duration_ms: 2000, action: SequenceAction::Shutdown },
];

/// 控制面板状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    pub system_active: bool,
    pub emergency_stop: bool,
    pub devices: [bool; DEVICE_COUNT],
    pub mode: ControlMode,
    pub sequence_running: bool,
    /// 已完成的步骤数
    pub sequence_step: usize,
    pub parameters: ControlParameters,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            system_active: false,
            emergency_stop: false,
            devices: [false; DEVICE_COUNT],
            mode: ControlMode::Manual,
            sequence_running: false,
            sequence_step: 0,
            parameters: ControlParameters::default(),
        }
    }
}

impl ControlState {
    pub fn active_devices(&self) -> usize {
        self.devices.iter().filter(|on| **on).count()
    }

    /// 刷新模拟参数，系统未运行或急停时不变
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.system_active || self.emergency_stop {
            return;
        }
        let on = self.active_devices();
        let p = &mut self.parameters;
        p.system_voltage += (rng.gen::<f64>() - 0.5) * 2.0;
        p.output_current = on as f64 * (15.0 + rng.gen::<f64>() * 5.0);
        p.temperature += (rng.gen::<f64>() - 0.5) * 0.5;
        p.pressure += (rng.gen::<f64>() - 0.5) * 0.2;
        p.frequency = 50.0 + (rng.gen::<f64>() - 0.5) * 0.1;
        p.efficiency = if on > 0 { 85.0 + rng.gen::<f64>() * 10.0 } else { 0.0 };
    }

    fn apply_action(&mut self, action: SequenceAction) {
        match action {
            SequenceAction::Init => self.system_active = true,
            SequenceAction::Device1On => self.devices[0] = true,
            SequenceAction::Device2On => self.devices[1] = true,
            SequenceAction::Shutdown => {
                self.system_active = false;
                self.devices = [false; DEVICE_COUNT];
            }
            SequenceAction::VoltageTest | SequenceAction::LoadTest => {}
        }
    }
}

/// 控制面板服务
#[derive(Clone)]
pub struct ControlPanel {
    state: Arc<RwLock<ControlState>>,
    sequence_cancel: Arc<Mutex<Option<CancellationToken>>>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ControlState::default())),
            sequence_cancel: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn state(&self) -> ControlState {
        self.state.read().await.clone()
    }

    pub async fn tick(&self) -> ControlState {
        let mut state = self.state.write().await;
        state.tick(&mut rand::thread_rng());
        state.clone()
    }

    /// 系统启动/停止，急停状态下不能启动
    pub async fn set_system_active(&self, active: bool) -> AppResult<ControlState> {
        let mut state = self.state.write().await;
        if active && state.emergency_stop {
            return Err(AppError::business_logic_error("急停状态下无法启动系统，请先复位"));
        }
        state.system_active = active;
        log_simulation_event!("系统{}", if active { "启动" } else { "停止" });
        Ok(state.clone())
    }

    /// 设备开关，编号从1开始
    pub async fn set_device(&self, device: usize, on: bool) -> AppResult<ControlState> {
        if device == 0 || device > DEVICE_COUNT {
            return Err(AppError::validation_error(format!("设备编号无效: {}", device)));
        }
        let mut state = self.state.write().await;
        if on && state.emergency_stop {
            return Err(AppError::business_logic_error("急停状态下无法开启设备"));
        }
        state.devices[device - 1] = on;
        log_simulation_event!("设备{} {}", device, if on { "开启" } else { "关闭" });
        Ok(state.clone())
    }

    pub async fn set_mode(&self, mode: ControlMode) -> ControlState {
        let mut state = self.state.write().await;
        state.mode = mode;
        state.clone()
    }

    /// 急停：停止系统、关闭全部设备、终止序列
    pub async fn emergency_stop(&self) -> ControlState {
        self.cancel_sequence().await;
        let mut state = self.state.write().await;
        state.emergency_stop = true;
        state.system_active = false;
        state.devices = [false; DEVICE_COUNT];
        state.sequence_running = false;
        state.sequence_step = 0;
        warn!("[模拟控制] 紧急停止已触发");
        state.clone()
    }

    /// 复位到初始状态
    pub async fn reset(&self) -> ControlState {
        self.cancel_sequence().await;
        let mut state = self.state.write().await;
        *state = ControlState::default();
        log_simulation_event!("控制面板已复位");
        state.clone()
    }

    /// 启动自动测试序列
    pub async fn start_test_sequence(&self) -> AppResult<JoinHandle<()>> {
        {
            let mut state = self.state.write().await;
            if state.emergency_stop {
                return Err(AppError::business_logic_error("急停状态下无法运行测试序列"));
            }
            if state.sequence_running {
                return Err(AppError::conflict_error("测试序列已在运行"));
            }
            state.sequence_running = true;
            state.sequence_step = 0;
        }

        let cancel = CancellationToken::new();
        *self.sequence_cancel.lock().await = Some(cancel.clone());
        log_simulation_event!("自动测试序列开始，共{}步", TEST_SEQUENCE.len());

        let panel = self.clone();
        Ok(tokio::spawn(async move {
            panel.run_sequence(cancel).await;
        }))
    }

    async fn run_sequence(&self, cancel: CancellationToken) {
        for step in TEST_SEQUENCE.iter() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("测试序列在步骤 {} 被取消", step.id);
                    return;
                }
                _ = tokio::time::sleep(Duration::from_millis(step.duration_ms)) => {}
            }
            let mut state = self.state.write().await;
            if cancel.is_cancelled() || state.emergency_stop {
                return;
            }
            state.apply_action(step.action);
            state.sequence_step += 1;
            log_simulation_event!("测试序列步骤 {} [{}] 完成", step.id, step.name);
        }

        self.finish_sequence(&cancel).await;
    }

    /// 序列正常结束后清理运行标记
    ///
    /// 令牌已被取消说明期间发生过复位或急停，此后的状态与令牌可能属于新启动的序列，不能改动
    async fn finish_sequence(&self, cancel: &CancellationToken) {
        let mut state = self.state.write().await;
        let mut current = self.sequence_cancel.lock().await;
        if cancel.is_cancelled() {
            return;
        }
        state.sequence_running = false;
        state.sequence_step = 0;
        *current = None;
        log_simulation_event!("自动测试序列完成");
    }

    async fn cancel_sequence(&self) {
        if let Some(cancel) = self.sequence_cancel.lock().await.take() {
            cancel.cancel();
        }
    }

    /// 启动参数刷新任务
    pub fn spawn_ticker(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let panel = self.clone();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = timer.tick() => {
                        panel.tick().await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tick_only_when_active() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = ControlState::default();
        state.tick(&mut rng);
        assert_eq!(state.parameters, ControlParameters::default());

        state.system_active = true;
        state.devices = [true, true, false, false];
        state.tick(&mut rng);
        let p = &state.parameters;
        assert!((30.0..=40.0).contains(&p.output_current));
        assert!((85.0..=95.0).contains(&p.efficiency));
        assert!((737.0..=739.0).contains(&p.system_voltage));
        assert!((49.95..=50.05).contains(&p.frequency));
    }

    #[test]
    fn test_no_devices_means_zero_output() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = ControlState { system_active: true, ..Default::default() };
        state.tick(&mut rng);
        assert_eq!(state.parameters.output_current, 0.0);
        assert_eq!(state.parameters.efficiency, 0.0);
    }

    #[tokio::test]
    async fn test_emergency_stop_blocks_start() {
        let panel = ControlPanel::new();
        panel.set_system_active(true).await.unwrap();
        panel.set_device(1, true).await.unwrap();

        let state = panel.emergency_stop().await;
        assert!(state.emergency_stop);
        assert!(!state.system_active);
        assert_eq!(state.active_devices(), 0);

        assert!(panel.set_system_active(true).await.is_err());
        assert!(panel.start_test_sequence().await.is_err());

        let state = panel.reset().await;
        assert_eq!(state, ControlState::default());
        assert!(panel.set_system_active(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_device_number() {
        let panel = ControlPanel::new();
        assert_eq!(panel.set_device(0, true).await.unwrap_err().error_code(), "VALIDATION_ERROR");
        assert!(panel.set_device(5, true).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_runs_to_completion() {
        let panel = ControlPanel::new();
        let handle = panel.start_test_sequence().await.unwrap();
        assert!(panel.start_test_sequence().await.is_err(), "运行中不能重复启动");

        tokio::time::sleep(Duration::from_millis(3100)).await;
        let state = panel.state().await;
        assert!(state.system_active);
        assert_eq!(state.devices, [true, false, false, false]);
        assert_eq!(state.sequence_step, 2);

        handle.await.unwrap();
        let state = panel.state().await;
        assert!(!state.sequence_running);
        assert!(!state.system_active);
        assert_eq!(state.sequence_step, 0);
        assert_eq!(state.active_devices(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_stop_cancels_sequence() {
        let panel = ControlPanel::new();
        let handle = panel.start_test_sequence().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(panel.state().await.system_active);

        panel.emergency_stop().await;
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_millis(20_000)).await;
        let state = panel.state().await;
        assert!(!state.sequence_running);
        assert!(!state.system_active);
        assert_eq!(state.active_devices(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_sequence_leaves_restarted_one_alone() {
        let panel = ControlPanel::new();
        let first = panel.start_test_sequence().await.unwrap();
        let first_token = panel.sequence_cancel.lock().await.clone().unwrap();

        panel.reset().await;
        first.await.unwrap();
        let second = panel.start_test_sequence().await.unwrap();

        // 旧序列迟到的收尾不能清掉新序列
        panel.finish_sequence(&first_token).await;
        let state = panel.state().await;
        assert!(state.sequence_running);
        let stored = panel.sequence_cancel.lock().await.clone();
        assert!(stored.is_some_and(|token| !token.is_cancelled()));

        panel.reset().await;
        assert!(!panel.state().await.sequence_running);
        second.await.unwrap();
        assert!(panel.start_test_sequence().await.is_ok(), "复位后可以再次启动");
    }
}
