/// 实时指标模拟
///
/// 按固定周期生成模拟的电流/电压/功率数据点，保留最近若干个，
/// 并通过广播通道推送给所有订阅者（WebSocket 客户端）
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 一个模拟数据点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMetric {
    /// 单调递增序号，客户端据此丢弃过期数据
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub current: f64,
    pub voltage: f64,
    pub power: f64,
}

impl LiveMetric {
    /// current = r·2+0.5, voltage = r·2+19, power = r·10+15
    pub fn random<R: Rng + ?Sized>(seq: u64, rng: &mut R) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            current: round3(rng.gen::<f64>() * 2.0 + 0.5),
            voltage: round3(rng.gen::<f64>() * 2.0 + 19.0),
            power: round3(rng.gen::<f64>() * 10.0 + 15.0),
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

struct TickerState {
    history: VecDeque<LiveMetric>,
    next_seq: u64,
}

/// 实时指标生成器
#[derive(Clone)]
pub struct MetricTicker {
    state: Arc<RwLock<TickerState>>,
    sender: broadcast::Sender<LiveMetric>,
    capacity: usize,
}

impl MetricTicker {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            state: Arc::new(RwLock::new(TickerState {
                history: VecDeque::with_capacity(capacity),
                next_seq: 1,
            })),
            sender,
            capacity: capacity.max(1),
        }
    }

    /// 订阅新数据点
    pub fn subscribe(&self) -> broadcast::Receiver<LiveMetric> {
        self.sender.subscribe()
    }

    /// 当前保留的数据点（按时间先后）
    pub async fn snapshot(&self) -> Vec<LiveMetric> {
        self.state.read().await.history.iter().cloned().collect()
    }

    /// 生成一个数据点，超出容量时丢弃最早的
    pub async fn tick(&self) -> LiveMetric {
        let metric = {
            let mut state = self.state.write().await;
            let metric = LiveMetric::random(state.next_seq, &mut rand::thread_rng());
            state.next_seq += 1;
            state.history.push_back(metric.clone());
            while state.history.len() > self.capacity {
                state.history.pop_front();
            }
            metric
        };
        // 没有订阅者时发送失败，忽略
        let _ = self.sender.send(metric.clone());
        metric
    }

    /// 启动后台定时任务，取消令牌触发后退出
    pub fn spawn(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let ticker = self.clone();
        tokio::spawn(async move {
            info!("实时指标模拟已启动，周期 {:?}", interval);
            let mut timer = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("实时指标模拟已停止");
                        break;
                    }
                    _ = timer.tick() => {
                        let metric = ticker.tick().await;
                        debug!("实时指标 #{}: {:.3}A {:.3}V {:.3}W", metric.seq, metric.current, metric.voltage, metric.power);
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
    fn test_metric_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for seq in 0..200 {
            let m = LiveMetric::random(seq, &mut rng);
            assert!((0.5..=2.5).contains(&m.current));
            assert!((19.0..=21.0).contains(&m.voltage));
            assert!((15.0..=25.0).contains(&m.power));
        }
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let ticker = MetricTicker::new(20);
        for _ in 0..25 {
            ticker.tick().await;
        }
        let snapshot = ticker.snapshot().await;
        assert_eq!(snapshot.len(), 20);
        assert_eq!(snapshot.first().unwrap().seq, 6);
        assert_eq!(snapshot.last().unwrap().seq, 25);
    }

    #[tokio::test]
    async fn test_subscribers_receive_points() {
        let ticker = MetricTicker::new(20);
        let mut rx = ticker.subscribe();
        let sent = ticker.tick().await;
        let received = rx.recv().await.unwrap();
        assert_eq!(sent, received);
    }

    #[tokio::test]
    async fn test_spawned_task_stops_on_cancel() {
        let ticker = MetricTicker::new(5);
        let cancel = CancellationToken::new();
        let handle = ticker.spawn(Duration::from_millis(5), cancel.clone());
        tokio::time::sleep(Duration::from_millis(40)).await;
        cancel.cancel();
        handle.await.unwrap();
        assert!(!ticker.snapshot().await.is_empty());
    }
}
