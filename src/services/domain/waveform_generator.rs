/// 波形仿真
///
/// 在固定的两个周期窗口内（t ∈ [0, 4π)）按参数计算采样点，
/// 同一参数重复计算得到完全相同的结果
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::enums::WaveformType;
use crate::models::structs::SimulationConfig;

/// 波形参数，相位单位为弧度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformParams {
    pub waveform_type: WaveformType,
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
    /// 占空比（%），仅PWM使用
    pub duty_cycle: f64,
    pub points: usize,
}

impl Default for WaveformParams {
    fn default() -> Self {
        Self {
            waveform_type: WaveformType::Sine,
            frequency: 1.0,
            amplitude: 5.0,
            phase: 0.0,
            duty_cycle: 50.0,
            points: 200,
        }
    }
}

impl WaveformParams {
    /// 界面滑块范围校验，仅HTTP入口调用
    pub fn validate(&self) -> AppResult<()> {
        if !(0.1..=10.0).contains(&self.frequency) {
            return Err(AppError::validation_error(format!("频率超出范围(0.1-10): {}", self.frequency)));
        }
        if !(0.0..=10.0).contains(&self.amplitude) {
            return Err(AppError::validation_error(format!("幅值超出范围(0-10): {}", self.amplitude)));
        }
        if !(0.0..=360.0).contains(&self.phase) {
            return Err(AppError::validation_error(format!("相位超出范围(0-360): {}", self.phase)));
        }
        if !(0.0..=100.0).contains(&self.duty_cycle) {
            return Err(AppError::validation_error(format!("占空比超出范围(0-100): {}", self.duty_cycle)));
        }
        if !(1..=10_000).contains(&self.points) {
            return Err(AppError::validation_error(format!("采样点数超出范围(1-10000): {}", self.points)));
        }
        Ok(())
    }
}

impl From<&SimulationConfig> for WaveformParams {
    fn from(config: &SimulationConfig) -> Self {
        let points = config
            .parameters
            .as_ref()
            .and_then(|p| p.get("points"))
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(200);
        Self {
            waveform_type: config.waveform_type,
            frequency: config.frequency,
            amplitude: config.amplitude,
            phase: config.phase,
            duty_cycle: config.duty_cycle,
            points,
        }
    }
}

/// 单个采样点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformSample {
    pub time: usize,
    pub value: f64,
    pub voltage: f64,
    pub current: f64,
}

/// 播放光标读数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformReading {
    pub index: usize,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// 周期内的归一化位置 [0, 1)
fn normalized_position(t: f64, params: &WaveformParams) -> f64 {
    let period = 2.0 * PI / params.frequency;
    (t + params.phase).rem_euclid(period) / period
}

/// 单点波形值
pub fn waveform_value(t: f64, params: &WaveformParams) -> f64 {
    let a = params.amplitude;
    match params.waveform_type {
        WaveformType::Sine => a * (params.frequency * t + params.phase).sin(),
        WaveformType::Square => {
            if (params.frequency * t + params.phase).sin() >= 0.0 {
                a
            } else {
                -a
            }
        }
        WaveformType::Triangle => {
            let l = normalized_position(t, params);
            if l < 0.5 {
                a * (4.0 * l - 1.0)
            } else {
                a * (3.0 - 4.0 * l)
            }
        }
        WaveformType::Pwm => {
            if normalized_position(t, params) < params.duty_cycle / 100.0 {
                a
            } else {
                0.0
            }
        }
    }
}

/// 生成采样序列
pub fn generate_waveform(params: &WaveformParams) -> Vec<WaveformSample> {
    let points = params.points;
    (0..points)
        .map(|i| {
            let t = (i as f64 / points as f64) * 4.0 * PI;
            let value = waveform_value(t, params);
            WaveformSample {
                time: i,
                value: round3(value),
                voltage: round3(20.0 + value * 0.5),
                current: round3(value.abs() * 0.8),
            }
        })
        .collect()
}

/// 采样序列导出为CSV（带BOM）
pub fn waveform_to_csv(samples: &[WaveformSample]) -> String {
    let mut csv = String::from("\u{FEFF}时间,数值,电压(V),电流(A)");
    for s in samples {
        csv.push('\n');
        csv.push_str(&format!("{},{},{},{}", s.time, s.value, s.voltage, s.current));
    }
    csv
}

/// 波形播放光标，每次前进一个采样点，到末尾后回到开头
#[derive(Debug, Clone)]
pub struct WaveformCursor {
    samples: Vec<WaveformSample>,
    index: usize,
}

impl WaveformCursor {
    pub fn new(params: &WaveformParams) -> Self {
        Self { samples: generate_waveform(params), index: 0 }
    }

    pub fn samples(&self) -> &[WaveformSample] {
        &self.samples
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 当前点读数，功率 = 电压 × 电流
    pub fn current_reading(&self) -> Option<WaveformReading> {
        self.samples.get(self.index).map(|s| WaveformReading {
            index: self.index,
            voltage: s.voltage,
            current: s.current,
            power: round3(s.voltage * s.current),
        })
    }

    /// 前进一步并返回新位置的读数
    pub fn advance(&mut self) -> Option<WaveformReading> {
        if self.samples.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.samples.len();
        self.current_reading()
    }

    /// 参数变化后重新计算，光标归零
    pub fn reset(&mut self, params: &WaveformParams) {
        self.samples = generate_waveform(params);
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(waveform_type: WaveformType) -> WaveformParams {
        WaveformParams { waveform_type, ..Default::default() }
    }

    #[test]
    fn test_sine_starts_at_zero() {
        let samples = generate_waveform(&params(WaveformType::Sine));
        assert_eq!(samples.len(), 200);
        assert_eq!(samples[0].value, 0.0);
        assert_eq!(samples[0].voltage, 20.0);
        assert_eq!(samples[0].current, 0.0);
        // 四分之一周期处为峰值
        assert_eq!(samples[25].value, 5.0);
        assert_eq!(samples[25].voltage, 22.5);
        assert_eq!(samples[25].current, 4.0);
    }

    #[test]
    fn test_triangle_range() {
        let samples = generate_waveform(&params(WaveformType::Triangle));
        assert_eq!(samples[0].value, -5.0);
        assert_eq!(samples[50].value, 5.0);
        assert!(samples.iter().all(|s| s.value >= -5.0 && s.value <= 5.0));
    }

    #[test]
    fn test_negative_phase_wraps() {
        let p = WaveformParams { waveform_type: WaveformType::Pwm, phase: -PI, ..Default::default() };
        let samples = generate_waveform(&p);
        // 相位 -π 时前半周期处于后半段，输出低电平
        assert_eq!(samples[0].value, 0.0);
        assert_eq!(samples[50].value, 5.0);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(WaveformParams::default().validate().is_ok());
        let bad = WaveformParams { frequency: 0.0, ..Default::default() };
        assert_eq!(bad.validate().unwrap_err().error_code(), "VALIDATION_ERROR");
        let bad = WaveformParams { duty_cycle: 120.0, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = WaveformParams { points: 0, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_cursor_wraps_and_reports_power() {
        let p = WaveformParams { points: 4, ..Default::default() };
        let mut cursor = WaveformCursor::new(&p);
        assert_eq!(cursor.index(), 0);
        for _ in 0..3 {
            cursor.advance();
        }
        assert_eq!(cursor.index(), 3);
        let reading = cursor.advance().unwrap();
        assert_eq!(reading.index, 0);
        assert_eq!(reading.power, round3(reading.voltage * reading.current));
    }

    #[test]
    fn test_points_read_from_config_parameters() {
        let config = SimulationConfig {
            id: "c1".to_string(),
            name: "方波".to_string(),
            waveform_type: WaveformType::Square,
            frequency: 2.0,
            amplitude: 3.0,
            phase: 0.0,
            duty_cycle: 50.0,
            parameters: Some(serde_json::json!({"points": 64})),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let p = WaveformParams::from(&config);
        assert_eq!(p.points, 64);
        assert_eq!(p.waveform_type, WaveformType::Square);
    }

    #[test]
    fn test_waveform_csv() {
        let csv = waveform_to_csv(&generate_waveform(&WaveformParams { points: 2, ..Default::default() }));
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "0,0,20,0");
    }
}
