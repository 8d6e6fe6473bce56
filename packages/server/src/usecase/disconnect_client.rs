//! UseCase: クライアント切断処理
//!
//! ソケットが閉じたとき（正常・異常を問わず）に一度だけ呼ばれます。
//! ブローカーからの削除で発生した通知（ペア解除・キュー位置の更新・ロスター）を
//! 配送してから、トランスポートの登録を解除します。

use std::sync::Arc;

use crate::domain::ConnectionId;

use super::{DeliveryEngine, SharedBroker};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    broker: SharedBroker,
    delivery: Arc<DeliveryEngine>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(broker: SharedBroker, delivery: Arc<DeliveryEngine>) -> Self {
        Self { broker, delivery }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// ブローカーに登録済みのコネクションだった場合は `true`
    pub async fn execute(&self, connection_id: &ConnectionId) -> bool {
        let was_registered = {
            let mut broker = self.broker.lock().await;
            let was_registered = broker.registry().contains(connection_id);
            let effects = broker.remove(connection_id);
            self.delivery.dispatch(&mut broker, effects).await;
            was_registered
        };

        self.delivery
            .message_pusher()
            .unregister_client(connection_id)
            .await;

        if was_registered {
            tracing::info!("Connection '{}' removed from broker", connection_id);
        } else {
            tracing::debug!("Connection '{}' closed before registering", connection_id);
        }
        was_registered
    }
}
