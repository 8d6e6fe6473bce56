//! UseCase 層
//!
//! ブローカー集約を単一の `Mutex` で保護し、UI 層からの入力をドメイン操作に変換します。
//! ドメイン操作が返したエフェクトは、ロックを保持したまま `DeliveryEngine` が配送します。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::Broker;

mod connect_client;
mod delivery;
mod disconnect_client;
mod get_broker_state;
mod route_message;

pub use connect_client::ConnectClientUseCase;
pub use delivery::DeliveryEngine;
pub use disconnect_client::DisconnectClientUseCase;
pub use get_broker_state::GetBrokerStateUseCase;
pub use route_message::RouteMessageUseCase;

/// 各コネクションのタスクと flush tick が共有するブローカー状態
pub type SharedBroker = Arc<Mutex<Broker>>;
