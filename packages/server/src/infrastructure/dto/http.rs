//! HTTP API のレスポンス DTO

use serde::{Deserialize, Serialize};

/// `GET /debug/broker` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerStateDto {
    pub connections: Vec<ConnectionDto>,
    /// キュー内のコネクション ID（先頭から）
    pub queue: Vec<String>,
    pub pairings: Vec<PairingDto>,
    pub pending_low_priority: usize,
    pub transcripts: usize,
    /// RFC 3339
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    pub id: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingDto {
    pub operator: String,
    pub participant: String,
}
