//! ブローカードメインの値オブジェクト

use std::fmt;

use serde::Serialize;

use super::error::ValueObjectError;

/// コネクションの一意な識別子
///
/// トランスポートがソケットを受け付けたときに [`ConnectionIdFactory`] が生成します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub const MAX_LEN: usize = 64;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let len = value.chars().count();
        if len == 0 || len > Self::MAX_LEN || value.chars().any(char::is_whitespace) {
            return Err(ValueObjectError::InvalidConnectionId { max: Self::MAX_LEN });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ConnectionId の生成
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId(uuid::Uuid::new_v4().to_string())
    }
}

/// ペアの相手と operator のロスターに表示される名前
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    pub const MAX_LEN: usize = 32;

    /// 前後の空白は検証前に取り除く
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > Self::MAX_LEN {
            return Err(ValueObjectError::InvalidDisplayName { max: Self::MAX_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 登録済みコネクションのロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// キューから participant を選ぶ特権ロール（同時に 1 人まで）
    Operator,
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Participant => "participant",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "operator" | "admin" => Ok(Role::Operator),
            "participant" | "user" => Ok(Role::Participant),
            other => Err(ValueObjectError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ペア間で中継され履歴に残るチャット本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChatText(String);

impl ChatText {
    pub const MAX_LEN: usize = 2000;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let len = value.chars().count();
        if len == 0 || len > Self::MAX_LEN {
            return Err(ValueObjectError::InvalidChatText { max: Self::MAX_LEN });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ChatText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// operator と participant のペアを表す正規化されたキー
///
/// 常に operator が先になるため、どちらの側からも同じ履歴を参照します。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairingKey {
    operator: ConnectionId,
    participant: ConnectionId,
}

impl PairingKey {
    pub fn new(operator: ConnectionId, participant: ConnectionId) -> Self {
        Self {
            operator,
            participant,
        }
    }

    pub fn operator(&self) -> &ConnectionId {
        &self.operator
    }

    pub fn participant(&self) -> &ConnectionId {
        &self.participant
    }

    pub fn involves(&self, id: &ConnectionId) -> bool {
        &self.operator == id || &self.participant == id
    }
}

impl fmt::Display for PairingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operator, self.participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_rejects_empty_and_whitespace() {
        // テスト項目: 空文字や空白を含む ConnectionId は作成できない
        // given (前提条件):
        let empty = String::new();
        let spaced = "al ice".to_string();
        let too_long = "a".repeat(ConnectionId::MAX_LEN + 1);

        // when (操作):
        let results = [
            ConnectionId::new(empty),
            ConnectionId::new(spaced),
            ConnectionId::new(too_long),
        ];

        // then (期待する結果):
        assert!(results.iter().all(Result::is_err));
        assert!(ConnectionId::new("alice".to_string()).is_ok());
    }

    #[test]
    fn test_generated_connection_ids_are_unique() {
        // テスト項目: ConnectionIdFactory が毎回異なる ID を生成する
        // given (前提条件):

        // when (操作):
        let first = ConnectionIdFactory::generate();
        let second = ConnectionIdFactory::generate();

        // then (期待する結果):
        assert_ne!(first, second);
        assert!(ConnectionId::new(first.into_string()).is_ok());
    }

    #[test]
    fn test_display_name_is_trimmed() {
        // テスト項目: DisplayName は前後の空白が除去され、空白のみは拒否される
        // given (前提条件):
        let padded = "  Alice  ".to_string();

        // when (操作):
        let name = DisplayName::new(padded).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), "Alice");
        assert!(DisplayName::new("   ".to_string()).is_err());
        assert!(DisplayName::new("x".repeat(DisplayName::MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_role_accepts_legacy_aliases() {
        // テスト項目: "admin" / "user" も Role として解釈される
        // given (前提条件):

        // when (操作):
        let admin = Role::try_from("admin");
        let user = Role::try_from("user");
        let unknown = Role::try_from("guest");

        // then (期待する結果):
        assert_eq!(admin, Ok(Role::Operator));
        assert_eq!(user, Ok(Role::Participant));
        assert_eq!(
            unknown,
            Err(ValueObjectError::UnknownRole("guest".to_string()))
        );
    }

    #[test]
    fn test_chat_text_length_limits() {
        // テスト項目: ChatText の長さ制限（1..=2000 文字）
        // given (前提条件):
        let max = "あ".repeat(ChatText::MAX_LEN);

        // when (操作):
        let ok = ChatText::new(max);
        let empty = ChatText::new(String::new());
        let over = ChatText::new("a".repeat(ChatText::MAX_LEN + 1));

        // then (期待する結果):
        assert!(ok.is_ok());
        assert!(empty.is_err());
        assert!(over.is_err());
    }

    #[test]
    fn test_pairing_key_is_operator_first() {
        // テスト項目: PairingKey は operator を先頭にした文字列表現を持つ
        // given (前提条件):
        let op = ConnectionId::new("op".to_string()).unwrap();
        let alice = ConnectionId::new("alice".to_string()).unwrap();

        // when (操作):
        let key = PairingKey::new(op.clone(), alice.clone());

        // then (期待する結果):
        assert_eq!(key.to_string(), "op:alice");
        assert!(key.involves(&op));
        assert!(key.involves(&alice));
        assert_eq!(key, PairingKey::new(op, alice));
    }
}
