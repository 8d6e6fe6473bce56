//! UseCase: ブローカー状態取得処理（デバッグ用）

use crate::domain::BrokerSnapshot;

use super::SharedBroker;

/// ブローカー状態取得のユースケース
pub struct GetBrokerStateUseCase {
    broker: SharedBroker,
}

impl GetBrokerStateUseCase {
    /// 新しい GetBrokerStateUseCase を作成
    pub fn new(broker: SharedBroker) -> Self {
        Self { broker }
    }

    /// 現在のブローカー状態のスナップショットを取得
    pub async fn execute(&self) -> BrokerSnapshot {
        self.broker.lock().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Broker, ConnectionId, DisplayName, Role},
        infrastructure::repository::InMemoryHistoryStore,
    };
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_execute_returns_current_snapshot() {
        // テスト項目: 登録済みの接続とキューがスナップショットに反映される
        // given (前提条件):
        let broker: SharedBroker = Arc::new(Mutex::new(Broker::new(Box::new(
            InMemoryHistoryStore::new(),
        ))));
        let op = ConnectionId::new("op".to_string()).unwrap();
        let alice = ConnectionId::new("alice".to_string()).unwrap();
        {
            let mut b = broker.lock().await;
            b.register(&op, DisplayName::new("Op".to_string()).unwrap(), Role::Operator)
                .unwrap();
            b.register(
                &alice,
                DisplayName::new("Alice".to_string()).unwrap(),
                Role::Participant,
            )
            .unwrap();
        }
        let usecase = GetBrokerStateUseCase::new(broker);

        // when (操作):
        let snapshot = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(snapshot.connections.len(), 2);
        assert_eq!(snapshot.queue, vec![alice]);
        assert!(snapshot.pairings.is_empty());
    }
}
