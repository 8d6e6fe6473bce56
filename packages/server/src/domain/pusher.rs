//! MessagePusher trait 定義
//!
//! ブローカーが必要とする送信側トランスポートのインターフェース。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::{notice::Notice, value_object::ConnectionId};

/// コネクションの writer タスクに渡すフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    Text(String),
    /// ソケットを閉じて書き込みを終了する
    Close,
}

/// writer タスクへのチャンネル
pub type PusherChannel = mpsc::UnboundedSender<PushFrame>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    #[error("failed to encode notice: {0}")]
    EncodeFailed(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// メッセージ送信（通知）の抽象化
///
/// 送信はベストエフォートで相手を待ちません。実装はフレームを writer に渡して即座に返ります。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 新しく受け付けたコネクションの writer channel を登録
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel);

    /// コネクションの writer channel を登録解除
    async fn unregister_client(&self, client_id: &ConnectionId);

    /// `notice` をエンコードして writer に渡す
    async fn push_to(&self, client_id: &ConnectionId, notice: &Notice)
    -> Result<(), MessagePushError>;

    /// writer にソケットのクローズを依頼
    async fn close(&self, client_id: &ConnectionId) -> Result<(), MessagePushError>;
}
