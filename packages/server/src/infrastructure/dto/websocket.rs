//! WebSocket メッセージの DTO
//!
//! すべてのフレームは JSON オブジェクトで、`type` フィールドで種別を判別します。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// クライアントから受信するフレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Register {
        display_name: String,
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credential: Option<String>,
    },
    Select {
        target_id: String,
    },
    EndPairing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
    },
    Chat {
        target_id: String,
        text: String,
    },
    Offer {
        target_id: String,
        payload: Value,
    },
    Answer {
        target_id: String,
        payload: Value,
    },
    IceCandidate {
        target_id: String,
        payload: Value,
    },
    MediaFrame {
        target_id: String,
        payload: Value,
    },
}

/// クライアントへ送信するフレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Welcome {
        assigned_id: String,
    },
    QueuePosition {
        position: usize,
    },
    Roster {
        entries: Vec<RosterEntryDto>,
    },
    PairingStarted {
        partner: PartnerDto,
        history: Vec<HistoryEntryDto>,
    },
    PairingEnded,
    Chat {
        sender_id: String,
        sender: String,
        text: String,
        timestamp: i64,
    },
    Offer {
        payload: Value,
        sender_id: String,
    },
    Answer {
        payload: Value,
        sender_id: String,
    },
    IceCandidate {
        payload: Value,
        sender_id: String,
    },
    MediaFrame {
        payload: Value,
        sender_id: String,
    },
    Error {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntryDto {
    pub id: String,
    pub display_name: String,
    pub role: String,
    pub paired: bool,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDto {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryDto {
    pub sender: String,
    pub text: String,
    pub timestamp: i64,
}
