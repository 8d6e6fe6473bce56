//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 各コネクションの writer タスクへの `UnboundedSender` を管理
//! - `Notice` を JSON にエンコードして writer に渡す
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `PusherChannel` を受け取り、送信に使用します。
//! チャンネルは unbounded なので送信がブローカーをブロックすることはありません。
//! ソケットへの書き込みとバックプレッシャーは writer タスク側の責務です。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, Notice, PushFrame, PusherChannel},
    infrastructure::dto::websocket::ServerMessage,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの writer channel
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }

    /// 通知を JSON テキストにエンコード
    pub fn encode(notice: &Notice) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerMessage::from(notice.clone()))
            .map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
    }

    async fn send_frame(
        &self,
        client_id: &ConnectionId,
        frame: PushFrame,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        let sender = clients
            .get(client_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(client_id.as_str().to_string()))?;
        sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", client_id);
        clients.insert(client_id, sender);
    }

    async fn unregister_client(&self, client_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(client_id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", client_id);
    }

    async fn push_to(
        &self,
        client_id: &ConnectionId,
        notice: &Notice,
    ) -> Result<(), MessagePushError> {
        let json = Self::encode(notice)?;
        self.send_frame(client_id, PushFrame::Text(json)).await?;
        tracing::trace!("Pushed message to client '{}'", client_id);
        Ok(())
    }

    async fn close(&self, client_id: &ConnectionId) -> Result<(), MessagePushError> {
        self.send_frame(client_id, PushFrame::Close).await
    }
}
