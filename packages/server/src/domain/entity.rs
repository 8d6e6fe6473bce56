//! ドメインエンティティ

use serde::Serialize;

use super::value_object::{ChatText, ConnectionId, DisplayName, Role, Timestamp};

/// 登録済みのコネクション
///
/// ロールと表示名は登録時に確定し、切断とともに破棄されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: DisplayName,
    pub role: Role,
    /// 登録順（ロスターと遅れて来た operator のキュー投入順に使用）
    pub joined_seq: u64,
}

impl Connection {
    pub fn new(id: ConnectionId, name: DisplayName, role: Role, joined_seq: u64) -> Self {
        Self {
            id,
            name,
            role,
            joined_seq,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.role == Role::Operator
    }
}

/// ペアの会話履歴の 1 行（追記後は変更されない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub sender: DisplayName,
    pub text: ChatText,
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    pub fn new(sender: DisplayName, text: ChatText, timestamp: Timestamp) -> Self {
        Self {
            sender,
            text,
            timestamp,
        }
    }
}
