//! DTO とドメインモデルの変換

use madoguchi_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    BrokerError, BrokerSnapshot, ChatText, Command, ConnectionId, DisplayName, HistoryEntry, NegotiationKind,
    Notice, Role, RosterEntry, ValueObjectError,
};
use crate::infrastructure::dto::{
    http::{BrokerStateDto, ConnectionDto, PairingDto},
    websocket as dto,
};

// ========================================
// DTO → Domain
// ========================================

/// 受信テキストフレームをドメインのコマンドに変換
///
/// 不正な JSON・未知の `type`・必須項目の欠落・範囲外の値はいずれも
/// `BrokerError::Malformed` になります。
pub fn parse_client_message(raw: &str) -> Result<Command, BrokerError> {
    let message: dto::ClientMessage =
        serde_json::from_str(raw).map_err(|e| BrokerError::Malformed(e.to_string()))?;
    Ok(Command::try_from(message)?)
}

impl TryFrom<dto::ClientMessage> for Command {
    type Error = ValueObjectError;

    fn try_from(message: dto::ClientMessage) -> Result<Self, Self::Error> {
        use dto::ClientMessage as M;

        let command = match message {
            M::Register {
                display_name,
                role,
                credential,
            } => Command::Register {
                name: DisplayName::new(display_name)?,
                role: Role::try_from(role.as_str())?,
                credential,
            },
            M::Select { target_id } => Command::Select {
                target: ConnectionId::new(target_id)?,
            },
            M::EndPairing { target_id } => Command::EndPairing {
                target: target_id.map(ConnectionId::new).transpose()?,
            },
            M::Chat { target_id, text } => Command::Chat {
                target: ConnectionId::new(target_id)?,
                text: ChatText::new(text)?,
            },
            M::Offer { target_id, payload } => {
                negotiate(NegotiationKind::Offer, target_id, payload)?
            }
            M::Answer { target_id, payload } => {
                negotiate(NegotiationKind::Answer, target_id, payload)?
            }
            M::IceCandidate { target_id, payload } => {
                negotiate(NegotiationKind::IceCandidate, target_id, payload)?
            }
            M::MediaFrame { target_id, payload } => Command::MediaFrame {
                target: ConnectionId::new(target_id)?,
                payload,
            },
        };
        Ok(command)
    }
}

fn negotiate(
    kind: NegotiationKind,
    target_id: String,
    payload: serde_json::Value,
) -> Result<Command, ValueObjectError> {
    Ok(Command::Negotiate {
        kind,
        target: ConnectionId::new(target_id)?,
        payload,
    })
}

// ========================================
// Domain → DTO
// ========================================

impl From<HistoryEntry> for dto::HistoryEntryDto {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            sender: entry.sender.into_string(),
            text: entry.text.into_string(),
            timestamp: entry.timestamp.value(),
        }
    }
}

impl From<RosterEntry> for dto::RosterEntryDto {
    fn from(entry: RosterEntry) -> Self {
        Self {
            id: entry.id.into_string(),
            display_name: entry.name.into_string(),
            role: entry.role.as_str().to_string(),
            paired: entry.paired,
            position: entry.position,
        }
    }
}

impl From<Notice> for dto::ServerMessage {
    fn from(notice: Notice) -> Self {
        use dto::ServerMessage as S;

        match notice {
            Notice::Welcome { assigned_id } => S::Welcome {
                assigned_id: assigned_id.into_string(),
            },
            Notice::QueuePosition { position } => S::QueuePosition { position },
            Notice::Roster { entries } => S::Roster {
                entries: entries.into_iter().map(Into::into).collect(),
            },
            Notice::PairingStarted {
                partner_id,
                partner_name,
                history,
            } => S::PairingStarted {
                partner: dto::PartnerDto {
                    id: partner_id.into_string(),
                    display_name: partner_name.into_string(),
                },
                history: history.into_iter().map(Into::into).collect(),
            },
            Notice::PairingEnded => S::PairingEnded,
            Notice::Chat {
                sender_id,
                sender,
                text,
                timestamp,
            } => S::Chat {
                sender_id: sender_id.into_string(),
                sender: sender.into_string(),
                text: text.into_string(),
                timestamp: timestamp.value(),
            },
            Notice::Negotiation {
                kind,
                payload,
                sender_id,
            } => {
                let sender_id = sender_id.into_string();
                match kind {
                    NegotiationKind::Offer => S::Offer { payload, sender_id },
                    NegotiationKind::Answer => S::Answer { payload, sender_id },
                    NegotiationKind::IceCandidate => S::IceCandidate { payload, sender_id },
                }
            }
            Notice::MediaFrame { payload, sender_id } => S::MediaFrame {
                payload,
                sender_id: sender_id.into_string(),
            },
            Notice::Error { reason } => S::Error { reason },
        }
    }
}

impl BrokerStateDto {
    /// `generated_at_millis` 時点のスナップショットからデバッグ用 DTO を作成
    pub fn from_snapshot(snapshot: BrokerSnapshot, generated_at_millis: i64) -> Self {
        Self {
            connections: snapshot
                .connections
                .into_iter()
                .map(|c| ConnectionDto {
                    id: c.id.into_string(),
                    display_name: c.name.into_string(),
                    role: c.role.as_str().to_string(),
                })
                .collect(),
            queue: snapshot
                .queue
                .into_iter()
                .map(ConnectionId::into_string)
                .collect(),
            pairings: snapshot
                .pairings
                .into_iter()
                .map(|(operator, participant)| PairingDto {
                    operator: operator.into_string(),
                    participant: participant.into_string(),
                })
                .collect(),
            pending_low_priority: snapshot.pending_low_priority,
            transcripts: snapshot.transcripts,
            generated_at: timestamp_to_rfc3339(generated_at_millis).unwrap_or_default(),
        }
    }
}
