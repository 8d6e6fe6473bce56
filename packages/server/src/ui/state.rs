//! 全ハンドラで共有するサーバー状態

use std::sync::Arc;

use madoguchi_shared::time::Clock;

use crate::usecase::{
    ConnectClientUseCase, DisconnectClientUseCase, GetBrokerStateUseCase, RouteMessageUseCase,
};

/// アプリケーション共有状態
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// RouteMessageUseCase（受信メッセージルーティングのユースケース）
    pub route_message_usecase: Arc<RouteMessageUseCase>,
    /// GetBrokerStateUseCase（ブローカー状態取得のユースケース）
    pub get_broker_state_usecase: Arc<GetBrokerStateUseCase>,
    pub clock: Arc<dyn Clock>,
}
