//! WebSocket 接続ハンドラ
//!
//! ソケットごとに 2 つのタスクを起動します。
//! - writer: コネクションの `PusherChannel` から受け取ったフレームを書き込む
//! - reader: 受信フレームをパースしてルーターに渡す
//!
//! 先に終了した方がもう一方を中断し、その後ブローカーから一度だけ削除します。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ConnectionId, PushFrame},
    infrastructure::dto::parse_client_message,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// コネクションの writer タスクを起動
///
/// `rx` にはブローカーが生成した順にフレームが届く。
/// `PushFrame::Close` を受け取るとクローズフレームを送って終了する。
fn pusher_loop(
    connection_id: ConnectionId,
    mut rx: mpsc::UnboundedReceiver<PushFrame>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                PushFrame::Text(json) => {
                    if let Err(e) = sender.send(Message::Text(json.into())).await {
                        tracing::debug!("Write to '{}' failed: {}", connection_id, e);
                        break;
                    }
                }
                PushFrame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    tracing::info!("Closed connection '{}'", connection_id);
                    break;
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_client_usecase.execute(tx).await;

    let mut send_task = pusher_loop(connection_id.clone(), rx, sender);

    let state_clone = state.clone();
    let reader_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", reader_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match parse_client_message(text.as_str()) {
                    Ok(command) => {
                        tracing::debug!("'{}' sent {:?}", reader_id, command.kind());
                        state_clone
                            .route_message_usecase
                            .execute(&reader_id, command)
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!("Dropped message from '{}': {}", reader_id, e);
                    }
                },
                Message::Binary(_) => {
                    tracing::warn!("Dropped binary frame from '{}'", reader_id);
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", reader_id);
                    break;
                }
                // Ping/Pong は WebSocket プロトコル側で自動応答される
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // どちらかのタスクが終了したらもう一方を中断
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await;
}
