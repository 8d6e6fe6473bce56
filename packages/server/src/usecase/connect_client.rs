//! UseCase: クライアント接続処理
//!
//! WebSocket のアップグレード直後に呼ばれ、コネクションの writer channel を
//! トランスポートに登録します。ブローカーへの登録は `register` メッセージを
//! 受信した時点で `RouteMessageUseCase` が行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionIdFactory, MessagePusher, PusherChannel};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 新しいコネクション ID を払い出し、writer channel を登録する
    ///
    /// # Returns
    ///
    /// 払い出した `ConnectionId`（Domain Model）
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        let connection_id = ConnectionIdFactory::generate();
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        tracing::info!("Connection '{}' accepted", connection_id);
        connection_id
    }
}
