//! 検証済みの受信コマンド

use serde_json::Value;

use super::{
    notice::NegotiationKind,
    value_object::{ChatText, ConnectionId, DisplayName, Role},
};

/// パースと検証を終えた受信メッセージ
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Register {
        name: DisplayName,
        role: Role,
        credential: Option<String>,
    },
    Select {
        target: ConnectionId,
    },
    EndPairing {
        target: Option<ConnectionId>,
    },
    Chat {
        target: ConnectionId,
        text: ChatText,
    },
    Negotiate {
        kind: NegotiationKind,
        target: ConnectionId,
        payload: Value,
    },
    MediaFrame {
        target: ConnectionId,
        payload: Value,
    },
}

/// [`Command`] の種別（ルート表のキー）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Register,
    Select,
    EndPairing,
    Chat,
    Negotiate,
    MediaFrame,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Register { .. } => CommandKind::Register,
            Command::Select { .. } => CommandKind::Select,
            Command::EndPairing { .. } => CommandKind::EndPairing,
            Command::Chat { .. } => CommandKind::Chat,
            Command::Negotiate { .. } => CommandKind::Negotiate,
            Command::MediaFrame { .. } => CommandKind::MediaFrame,
        }
    }
}
