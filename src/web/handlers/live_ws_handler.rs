use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::stream::StreamExt;
use log::{debug, warn};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::services::domain::LiveMetric;
use crate::web::AppState;

/// 推送给客户端的消息
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LiveMessage<'a> {
    Snapshot(&'a [LiveMetric]),
    Metric(&'a LiveMetric),
}

pub async fn live_ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn send_json(socket: &mut WebSocket, message: &LiveMessage<'_>) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => socket.send(Message::Text(Utf8Bytes::from(json))).await.is_ok(),
        Err(e) => {
            warn!("实时数据序列化失败: {}", e);
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, app_state: Arc<AppState>) {
    debug!("实时数据WebSocket已连接");

    // 先订阅再取快照，避免漏掉两者之间的数据点
    let mut rx = app_state.metric_ticker.subscribe();
    let snapshot = app_state.metric_ticker.snapshot().await;
    let last_seq = snapshot.last().map(|m| m.seq).unwrap_or(0);
    if !send_json(&mut socket, &LiveMessage::Snapshot(&snapshot)).await {
        return;
    }

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(metric) => {
                    // 快照中已包含的点不重复发送
                    if metric.seq <= last_seq {
                        continue;
                    }
                    if !send_json(&mut socket, &LiveMessage::Metric(&metric)).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("实时数据客户端落后，跳过 {} 个数据点", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("实时数据WebSocket已断开");
}
