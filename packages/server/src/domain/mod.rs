//! Domain 層: ブローカー状態・値オブジェクト・ドメインが必要とするインターフェース

pub mod broker;
pub mod command;
pub mod entity;
pub mod error;
pub mod history;
pub mod lane;
pub mod notice;
pub mod pusher;
pub mod registry;
pub mod scheduler;
pub mod value_object;

pub use broker::{Broker, BrokerSnapshot};
pub use command::{Command, CommandKind};
pub use entity::{Connection, HistoryEntry};
pub use error::{BrokerError, ValueObjectError};
pub use history::HistoryStore;
pub use lane::LowPriorityLanes;
pub use notice::{Effect, NegotiationKind, Notice, Priority, RosterEntry};
pub use pusher::{MessagePushError, MessagePusher, PushFrame, PusherChannel};
pub use registry::ConnectionRegistry;
pub use scheduler::PairingScheduler;
pub use value_object::{
    ChatText, ConnectionId, ConnectionIdFactory, DisplayName, PairingKey, Role, Timestamp,
};
