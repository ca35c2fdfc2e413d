use pv_lib::models::enums::WaveformType;
use pv_lib::services::domain::{generate_waveform, waveform_to_csv, WaveformCursor, WaveformParams};

fn params(waveform_type: WaveformType) -> WaveformParams {
    WaveformParams { waveform_type, ..Default::default() }
}

#[test]
fn sine_is_zero_at_origin_and_bounded() {
    let samples = generate_waveform(&params(WaveformType::Sine));
    assert_eq!(samples.len(), 200);
    assert_eq!(samples[0].value, 0.0);
    assert!(samples.iter().all(|s| s.value.abs() <= 5.0));
    // 电压、电流由波形值派生
    for s in &samples {
        assert!((s.voltage - (20.0 + s.value * 0.5)).abs() < 0.002);
        assert!((s.current - s.value.abs() * 0.8).abs() < 0.002);
    }
}

#[test]
fn square_only_takes_plus_minus_amplitude() {
    let p = WaveformParams { amplitude: 3.0, ..params(WaveformType::Square) };
    let samples = generate_waveform(&p);
    assert!(samples.iter().all(|s| s.value == 3.0 || s.value == -3.0));
    assert!(samples.iter().any(|s| s.value == -3.0));
}

#[test]
fn square_four_points_follows_float_sine_sign() {
    let p = WaveformParams { points: 4, ..params(WaveformType::Square) };
    let values: Vec<f64> = generate_waveform(&p).iter().map(|s| s.value).collect();
    // sin(π) 与 sin(3π) 的浮点结果为极小正数，sin(2π) 为极小负数
    assert_eq!(values, vec![5.0, 5.0, -5.0, 5.0]);
}

#[test]
fn triangle_has_no_jumps() {
    let samples = generate_waveform(&params(WaveformType::Triangle));
    let max_step = samples
        .windows(2)
        .map(|w| (w[1].value - w[0].value).abs())
        .fold(0.0_f64, f64::max);
    // 每个采样点移动 1/100 周期，对应幅值变化 4A/100
    assert!(max_step <= 0.2 + 0.002, "相邻点变化过大: {}", max_step);
}

#[test]
fn pwm_high_ratio_matches_duty_cycle() {
    for duty in [10.0, 25.0, 50.0, 75.0] {
        let p = WaveformParams { duty_cycle: duty, ..params(WaveformType::Pwm) };
        let samples = generate_waveform(&p);
        assert!(samples.iter().all(|s| s.value == 0.0 || s.value == 5.0));
        let high = samples.iter().filter(|s| s.value == 5.0).count() as f64;
        let expected = duty / 100.0 * samples.len() as f64;
        assert!((high - expected).abs() <= 2.0, "占空比 {}: 高电平 {} 点", duty, high);
    }
}

#[test]
fn pwm_duty_extremes() {
    let off = WaveformParams { duty_cycle: 0.0, ..params(WaveformType::Pwm) };
    assert!(generate_waveform(&off).iter().all(|s| s.value == 0.0));

    let on = WaveformParams { duty_cycle: 100.0, ..params(WaveformType::Pwm) };
    assert!(generate_waveform(&on).iter().all(|s| s.value == 5.0));
}

#[test]
fn generation_is_deterministic() {
    for waveform_type in WaveformType::ALL {
        let p = WaveformParams { frequency: 2.5, phase: 1.2, ..params(*waveform_type) };
        assert_eq!(generate_waveform(&p), generate_waveform(&p));
    }
}

#[test]
fn csv_has_header_and_one_line_per_sample() {
    let p = WaveformParams { points: 10, ..Default::default() };
    let csv = waveform_to_csv(&generate_waveform(&p));
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], "\u{FEFF}时间,数值,电压(V),电流(A)");
    assert!(lines[1].starts_with("0,"));
}

#[test]
fn cursor_wraps_after_last_sample() {
    let p = WaveformParams { points: 3, ..Default::default() };
    let mut cursor = WaveformCursor::new(&p);
    assert_eq!(cursor.index(), 0);
    cursor.advance();
    cursor.advance();
    let reading = cursor.advance().expect("光标应有读数");
    assert_eq!(reading.index, 0);
    assert_eq!(reading.power, 0.0);
}
