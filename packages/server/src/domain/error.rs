//! ドメインエラー定義

use thiserror::Error;

/// 外部入力から値オブジェクトを生成する際のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("connection id must be 1..={max} non-whitespace characters")]
    InvalidConnectionId { max: usize },
    #[error("display name must be 1..={max} characters after trimming")]
    InvalidDisplayName { max: usize },
    #[error("chat text must be 1..={max} characters")]
    InvalidChatText { max: usize },
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// ブローカー操作のエラー
///
/// いずれも単一のコネクションまたはメッセージに閉じており、プロセスを停止させることはありません。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// operator がいる状態で 2 人目が登録しようとした
    #[error("an operator session is already active")]
    RoleConflict,
    /// operator 登録の credential が誤っている、または無い
    #[error("invalid operator credential")]
    InvalidCredential,
    /// 指定されたコネクションが存在しない、ロールが違う、または送信者の相手ではない
    #[error("connection '{0}' not found")]
    NotFound(String),
    /// 送信者のロールではこのメッセージを送れない
    #[error("sender is not allowed to send this message")]
    Unauthorized,
    /// 受信ペイロードのパースまたは検証に失敗した
    #[error("malformed message: {0}")]
    Malformed(String),
    /// 登録済みのコネクションが再度登録しようとした
    #[error("connection '{0}' is already registered")]
    AlreadyRegistered(String),
    /// トランスポートが既に無いコネクションへの送信
    #[error("transport for '{0}' is unavailable")]
    TransportUnavailable(String),
}

impl From<ValueObjectError> for BrokerError {
    fn from(e: ValueObjectError) -> Self {
        BrokerError::Malformed(e.to_string())
    }
}
