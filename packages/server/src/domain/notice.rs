//! 送信通知と、ブローカー操作が生成するエフェクト

use serde_json::Value;

use super::{
    entity::HistoryEntry,
    value_object::{ChatText, ConnectionId, DisplayName, Role, Timestamp},
};

/// 送信通知の配送クラス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// 即時にトランスポートへ送る
    High,
    /// 次の flush tick まで最新優先のスロットに保留する
    Low,
}

/// WebRTC ネゴシエーションの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationKind {
    Offer,
    Answer,
    IceCandidate,
}

/// operator 向けロスターの 1 行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: ConnectionId,
    pub name: DisplayName,
    pub role: Role,
    pub paired: bool,
    /// 1 始まりのキュー位置（キュー外は 0）
    pub position: usize,
}

/// 1 つのコネクションに届ける通知
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Welcome {
        assigned_id: ConnectionId,
    },
    /// 0 はキュー外を表す
    QueuePosition {
        position: usize,
    },
    Roster {
        entries: Vec<RosterEntry>,
    },
    PairingStarted {
        partner_id: ConnectionId,
        partner_name: DisplayName,
        history: Vec<HistoryEntry>,
    },
    PairingEnded,
    Chat {
        sender_id: ConnectionId,
        sender: DisplayName,
        text: ChatText,
        timestamp: Timestamp,
    },
    Negotiation {
        kind: NegotiationKind,
        payload: Value,
        sender_id: ConnectionId,
    },
    MediaFrame {
        payload: Value,
        sender_id: ConnectionId,
    },
    Error {
        reason: String,
    },
}

impl Notice {
    /// 中継された通知の送信元コネクション
    pub fn sender_id(&self) -> Option<&ConnectionId> {
        match self {
            Notice::Chat { sender_id, .. }
            | Notice::Negotiation { sender_id, .. }
            | Notice::MediaFrame { sender_id, .. } => Some(sender_id),
            _ => None,
        }
    }
}

/// ブローカー操作が要求する副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Deliver {
        to: ConnectionId,
        notice: Notice,
        priority: Priority,
    },
    /// コネクションのトランスポートを閉じる
    Close { connection: ConnectionId },
}

impl Effect {
    pub fn high(to: ConnectionId, notice: Notice) -> Self {
        Effect::Deliver {
            to,
            notice,
            priority: Priority::High,
        }
    }

    pub fn low(to: ConnectionId, notice: Notice) -> Self {
        Effect::Deliver {
            to,
            notice,
            priority: Priority::Low,
        }
    }
}
