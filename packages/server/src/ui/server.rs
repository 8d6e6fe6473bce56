//! サーバーの起動処理

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use madoguchi_shared::time::Clock;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{Broker, MessagePusher},
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryHistoryStore},
    usecase::{
        ConnectClientUseCase, DeliveryEngine, DisconnectClientUseCase, GetBrokerStateUseCase,
        RouteMessageUseCase, SharedBroker,
    },
};

use super::{
    handler::{debug_broker_state, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// セッションブローカーサーバー
///
/// 組み立て済みのアプリケーション状態と Delivery Engine を保持します。
/// flush tick はサーバーが稼働している間だけ動きます。
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::default();
/// let server = Server::new(&config, Arc::new(SystemClock));
/// server.run(&config).await?;
/// ```
pub struct Server {
    app_state: Arc<AppState>,
    broker: SharedBroker,
    delivery: Arc<DeliveryEngine>,
    flush_interval: Duration,
}

impl Server {
    /// `config` に従ってブローカー・トランスポート・UseCase を組み立てる
    ///
    /// 依存関係を以下の順に初期化する:
    /// 1. ブローカー状態（インメモリ履歴付き）
    /// 2. MessagePusher
    /// 3. Delivery Engine
    /// 4. UseCases
    pub fn new(config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        // 1. Broker state
        let broker: SharedBroker = Arc::new(Mutex::new(Broker::new(Box::new(
            InMemoryHistoryStore::new(),
        ))));

        // 2. MessagePusher (WebSocket implementation)
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::default());

        // 3. Delivery Engine
        let delivery = Arc::new(DeliveryEngine::new(message_pusher.clone()));

        // 4. UseCases
        let app_state = Arc::new(AppState {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(message_pusher)),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
                broker.clone(),
                delivery.clone(),
            )),
            route_message_usecase: Arc::new(RouteMessageUseCase::new(
                broker.clone(),
                delivery.clone(),
                clock.clone(),
                config.admin_secret.clone(),
            )),
            get_broker_state_usecase: Arc::new(GetBrokerStateUseCase::new(broker.clone())),
            clock,
        });

        Self {
            app_state,
            broker,
            delivery,
            flush_interval: config.flush_interval,
        }
    }

    /// HTTP ルーターを作成
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/debug/broker", get(debug_broker_state))
            .route("/api/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state.clone())
    }

    /// 設定されたアドレスで待ち受け、Ctrl+C または SIGTERM まで稼働する
    ///
    /// # Errors
    ///
    /// アドレスへのバインドに失敗した場合、またはサーバー実行中にエラーが発生した場合
    pub async fn run(self, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(config.bind_addr()).await?;

        tracing::info!("Session broker listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", config.bind_addr());
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// バインド済みの listener で `shutdown` が完了するまで稼働する
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let flush_task = self
            .delivery
            .clone()
            .spawn_flush_task(self.broker.clone(), self.flush_interval);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        flush_task.abort();
        result
    }
}
