//! UseCase: 受信メッセージのルーティング（Relay Router）
//!
//! ## 概要
//!
//! パース済みの `Command` を種別ごとのルート表で振り分けます。各ルートは
//! 送信者に必要なロールと、ブローカー状態に対する純粋なハンドラ関数を持ちます。
//! ハンドラが返したエフェクトは Delivery Engine に渡されます。
//!
//! ## エラー方針
//!
//! - RoleConflict / InvalidCredential: 送信者にエラーを返し、接続を閉じる
//! - NotFound: ペア操作（select / end-pairing）のみ送信者にエラーを返す
//! - それ以外（Unauthorized, AlreadyRegistered, リレー先不明）: ログのみで破棄

use std::sync::Arc;

use madoguchi_shared::time::Clock;

use crate::domain::{
    Broker, BrokerError, Command, CommandKind, ConnectionId, Effect, Notice, Role, Timestamp,
};

use super::{DeliveryEngine, SharedBroker};

/// コマンドを送信できる送信者の条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requirement {
    /// 未登録のコネクションのみ
    Unregistered,
    AnyRole,
    Operator,
    Participant,
}

impl Requirement {
    fn check(self, sender: &ConnectionId, role: Option<Role>) -> Result<(), BrokerError> {
        match (self, role) {
            (Requirement::Unregistered, None) => Ok(()),
            (Requirement::AnyRole, Some(_)) => Ok(()),
            (Requirement::Operator, Some(Role::Operator)) => Ok(()),
            (Requirement::Participant, Some(Role::Participant)) => Ok(()),
            (Requirement::Unregistered, Some(_)) => {
                Err(BrokerError::AlreadyRegistered(sender.as_str().to_string()))
            }
            _ => Err(BrokerError::Unauthorized),
        }
    }
}

struct RouteContext<'a> {
    sender: &'a ConnectionId,
    now: Timestamp,
    admin_secret: Option<&'a str>,
}

type Handler = fn(&mut Broker, &RouteContext<'_>, Command) -> Result<Vec<Effect>, BrokerError>;

struct Route {
    requirement: Requirement,
    /// NotFound を送信者にエラー通知するかどうか
    reply_not_found: bool,
    handler: Handler,
}

fn route(kind: CommandKind) -> Route {
    let (requirement, reply_not_found, handler): (Requirement, bool, Handler) = match kind {
        CommandKind::Register => (Requirement::Unregistered, false, handle_register),
        CommandKind::Select => (Requirement::Operator, true, handle_select),
        CommandKind::EndPairing => (Requirement::AnyRole, true, handle_end_pairing),
        CommandKind::Chat => (Requirement::AnyRole, false, handle_chat),
        CommandKind::Negotiate => (Requirement::AnyRole, false, handle_negotiate),
        CommandKind::MediaFrame => (Requirement::Participant, false, handle_media_frame),
    };
    Route {
        requirement,
        reply_not_found,
        handler,
    }
}

fn mismatch(kind: CommandKind) -> BrokerError {
    BrokerError::Malformed(format!("command routed to the wrong handler: {:?}", kind))
}

fn handle_register(
    broker: &mut Broker,
    ctx: &RouteContext<'_>,
    command: Command,
) -> Result<Vec<Effect>, BrokerError> {
    let kind = command.kind();
    let Command::Register {
        name,
        role,
        credential,
    } = command
    else {
        return Err(mismatch(kind));
    };
    if role == Role::Operator
        && let Some(secret) = ctx.admin_secret
        && credential.as_deref() != Some(secret)
    {
        return Err(BrokerError::InvalidCredential);
    }
    broker.register(ctx.sender, name, role)
}

fn handle_select(
    broker: &mut Broker,
    ctx: &RouteContext<'_>,
    command: Command,
) -> Result<Vec<Effect>, BrokerError> {
    let kind = command.kind();
    let Command::Select { target } = command else {
        return Err(mismatch(kind));
    };
    broker.select(ctx.sender, &target)
}

fn handle_end_pairing(
    broker: &mut Broker,
    ctx: &RouteContext<'_>,
    command: Command,
) -> Result<Vec<Effect>, BrokerError> {
    let kind = command.kind();
    let Command::EndPairing { target } = command else {
        return Err(mismatch(kind));
    };
    broker.end_pairing(ctx.sender, target.as_ref())
}

fn handle_chat(
    broker: &mut Broker,
    ctx: &RouteContext<'_>,
    command: Command,
) -> Result<Vec<Effect>, BrokerError> {
    let kind = command.kind();
    let Command::Chat { target, text } = command else {
        return Err(mismatch(kind));
    };
    broker.chat(ctx.sender, &target, text, ctx.now)
}

fn handle_negotiate(
    broker: &mut Broker,
    ctx: &RouteContext<'_>,
    command: Command,
) -> Result<Vec<Effect>, BrokerError> {
    let kind = command.kind();
    let Command::Negotiate {
        kind: negotiation,
        target,
        payload,
    } = command
    else {
        return Err(mismatch(kind));
    };
    broker.negotiate(ctx.sender, negotiation, &target, payload)
}

fn handle_media_frame(
    broker: &mut Broker,
    ctx: &RouteContext<'_>,
    command: Command,
) -> Result<Vec<Effect>, BrokerError> {
    let kind = command.kind();
    let Command::MediaFrame { target, payload } = command else {
        return Err(mismatch(kind));
    };
    broker.media_frame(ctx.sender, &target, payload)
}

/// 受信メッセージルーティングのユースケース
pub struct RouteMessageUseCase {
    broker: SharedBroker,
    delivery: Arc<DeliveryEngine>,
    clock: Arc<dyn Clock>,
    /// operator 登録に必要な共有シークレット（None なら検証しない）
    admin_secret: Option<String>,
}

impl RouteMessageUseCase {
    /// 新しい RouteMessageUseCase を作成
    pub fn new(
        broker: SharedBroker,
        delivery: Arc<DeliveryEngine>,
        clock: Arc<dyn Clock>,
        admin_secret: Option<String>,
    ) -> Self {
        Self {
            broker,
            delivery,
            clock,
            admin_secret,
        }
    }

    /// コマンドを振り分けて実行
    ///
    /// エラーは方針に従って送信者への通知か破棄に変換されるため、
    /// 呼び出し元には何も返しません。
    pub async fn execute(&self, sender: &ConnectionId, command: Command) {
        let kind = command.kind();
        let route = route(kind);
        let ctx = RouteContext {
            sender,
            now: Timestamp::new(self.clock.now_millis()),
            admin_secret: self.admin_secret.as_deref(),
        };

        let mut broker = self.broker.lock().await;
        let result = route
            .requirement
            .check(sender, broker.role_of(sender))
            .and_then(|()| (route.handler)(&mut *broker, &ctx, command));

        let effects = match result {
            Ok(effects) => effects,
            Err(e) => Self::effects_for_error(sender, kind, &route, e),
        };
        self.delivery.dispatch(&mut broker, effects).await;
    }

    fn effects_for_error(
        sender: &ConnectionId,
        kind: CommandKind,
        route: &Route,
        error: BrokerError,
    ) -> Vec<Effect> {
        match error {
            BrokerError::RoleConflict | BrokerError::InvalidCredential => {
                tracing::warn!("Rejected registration from '{}': {}", sender, error);
                vec![
                    Effect::high(
                        sender.clone(),
                        Notice::Error {
                            reason: error.to_string(),
                        },
                    ),
                    Effect::Close {
                        connection: sender.clone(),
                    },
                ]
            }
            BrokerError::NotFound(_) if route.reply_not_found => {
                tracing::info!("{:?} from '{}' failed: {}", kind, sender, error);
                vec![Effect::high(
                    sender.clone(),
                    Notice::Error {
                        reason: error.to_string(),
                    },
                )]
            }
            BrokerError::NotFound(_) | BrokerError::AlreadyRegistered(_) => {
                tracing::debug!("Dropped {:?} from '{}': {}", kind, sender, error);
                Vec::new()
            }
            BrokerError::Unauthorized
            | BrokerError::Malformed(_)
            | BrokerError::TransportUnavailable(_) => {
                tracing::warn!("Dropped {:?} from '{}': {}", kind, sender, error);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatText, DisplayName, MessagePusher, PushFrame},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryHistoryStore,
        },
    };
    use madoguchi_shared::time::FixedClock;
    use serde_json::{Value, json};
    use tokio::sync::{Mutex, mpsc};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ルート表によるロール検証（select は operator のみ、media-frame は participant のみ）
    // - エラー方針（RoleConflict は通知＋切断、Unauthorized は無応答）
    // - チャットの中継と履歴への追記
    // ========================================

    struct Harness {
        usecase: RouteMessageUseCase,
        broker: SharedBroker,
        pusher: Arc<WebSocketMessagePusher>,
    }

    impl Harness {
        fn new(admin_secret: Option<&str>) -> Self {
            let broker: SharedBroker = Arc::new(Mutex::new(Broker::new(Box::new(
                InMemoryHistoryStore::new(),
            ))));
            let pusher = Arc::new(WebSocketMessagePusher::default());
            let delivery = Arc::new(DeliveryEngine::new(pusher.clone()));
            let usecase = RouteMessageUseCase::new(
                broker.clone(),
                delivery,
                Arc::new(FixedClock::new(1_700_000_000_000)),
                admin_secret.map(str::to_string),
            );
            Self {
                usecase,
                broker,
                pusher,
            }
        }

        async fn connect(&self, name: &str) -> (ConnectionId, mpsc::UnboundedReceiver<PushFrame>) {
            let id = ConnectionId::new(name.to_string()).unwrap();
            let (tx, rx) = mpsc::unbounded_channel();
            self.pusher.register_client(id.clone(), tx).await;
            (id, rx)
        }

        async fn register(&self, id: &ConnectionId, role: Role) {
            self.usecase
                .execute(
                    id,
                    Command::Register {
                        name: DisplayName::new(id.as_str().to_string()).unwrap(),
                        role,
                        credential: None,
                    },
                )
                .await;
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PushFrame>) -> Vec<PushFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    fn messages(rx: &mut mpsc::UnboundedReceiver<PushFrame>) -> Vec<Value> {
        drain(rx)
            .into_iter()
            .filter_map(|frame| match frame {
                PushFrame::Text(json) => serde_json::from_str(&json).ok(),
                PushFrame::Close => None,
            })
            .filter(|v: &Value| v["type"] != "roster")
            .collect()
    }

    #[tokio::test]
    async fn test_second_operator_gets_error_and_close() {
        // テスト項目: 2 人目の operator はエラー通知を受け取り、接続が閉じられる
        // given (前提条件):
        let harness = Harness::new(None);
        let (op, _op_rx) = harness.connect("op").await;
        let (op2, mut op2_rx) = harness.connect("op2").await;
        harness.register(&op, Role::Operator).await;

        // when (操作):
        harness.register(&op2, Role::Operator).await;

        // then (期待する結果):
        let frames = drain(&mut op2_rx);
        assert_eq!(frames.len(), 2);
        match &frames[0] {
            PushFrame::Text(json) => {
                let value: Value = serde_json::from_str(json).unwrap();
                assert_eq!(value["type"], "error");
            }
            other => panic!("expected error frame, got {:?}", other),
        }
        assert_eq!(frames[1], PushFrame::Close);
        assert_eq!(harness.broker.lock().await.role_of(&op2), None);
    }

    #[tokio::test]
    async fn test_wrong_credential_is_rejected() {
        // テスト項目: シークレット設定時、誤った credential の operator 登録は拒否される
        // given (前提条件):
        let harness = Harness::new(Some("s3cret"));
        let (op, mut op_rx) = harness.connect("op").await;

        // when (操作):
        harness
            .usecase
            .execute(
                &op,
                Command::Register {
                    name: DisplayName::new("Op".to_string()).unwrap(),
                    role: Role::Operator,
                    credential: Some("guess".to_string()),
                },
            )
            .await;

        // then (期待する結果):
        let frames = drain(&mut op_rx);
        assert_eq!(frames.last(), Some(&PushFrame::Close));
        assert!(harness.broker.lock().await.registry().operator().is_none());
    }

    #[tokio::test]
    async fn test_correct_credential_is_accepted() {
        // テスト項目: 正しい credential の operator 登録は welcome を受け取る
        // given (前提条件):
        let harness = Harness::new(Some("s3cret"));
        let (op, mut op_rx) = harness.connect("op").await;

        // when (操作):
        harness
            .usecase
            .execute(
                &op,
                Command::Register {
                    name: DisplayName::new("Op".to_string()).unwrap(),
                    role: Role::Operator,
                    credential: Some("s3cret".to_string()),
                },
            )
            .await;

        // then (期待する結果):
        let received = messages(&mut op_rx);
        assert_eq!(received[0], json!({ "type": "welcome", "assignedId": "op" }));
    }

    #[tokio::test]
    async fn test_unauthorized_select_is_silent() {
        // テスト項目: participant の select は誰にも通知されず状態も変わらない
        // given (前提条件):
        let harness = Harness::new(None);
        let (op, mut op_rx) = harness.connect("op").await;
        let (alice, mut alice_rx) = harness.connect("alice").await;
        let (bob, mut bob_rx) = harness.connect("bob").await;
        harness.register(&op, Role::Operator).await;
        harness.register(&alice, Role::Participant).await;
        harness.register(&bob, Role::Participant).await;
        drain(&mut op_rx);
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        harness
            .usecase
            .execute(&alice, Command::Select { target: bob.clone() })
            .await;

        // then (期待する結果):
        assert!(drain(&mut op_rx).is_empty());
        assert!(drain(&mut alice_rx).is_empty());
        assert!(drain(&mut bob_rx).is_empty());
        let broker = harness.broker.lock().await;
        assert!(broker.scheduler().pairings().is_empty());
        assert_eq!(broker.scheduler().queue_len(), 2);
    }

    #[tokio::test]
    async fn test_select_unknown_target_replies_error() {
        // テスト項目: 存在しない対象の select は operator にエラーが返される
        // given (前提条件):
        let harness = Harness::new(None);
        let (op, mut op_rx) = harness.connect("op").await;
        harness.register(&op, Role::Operator).await;
        drain(&mut op_rx);

        // when (操作):
        harness
            .usecase
            .execute(
                &op,
                Command::Select {
                    target: ConnectionId::new("ghost".to_string()).unwrap(),
                },
            )
            .await;

        // then (期待する結果):
        let received = messages(&mut op_rx);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["type"], "error");
    }

    #[tokio::test]
    async fn test_chat_is_relayed_with_sender_and_timestamp() {
        // テスト項目: ペア中のチャットが送信者名とタイムスタンプ付きで相手に届く
        // given (前提条件):
        let harness = Harness::new(None);
        let (op, mut op_rx) = harness.connect("op").await;
        let (alice, mut alice_rx) = harness.connect("alice").await;
        harness.register(&op, Role::Operator).await;
        harness.register(&alice, Role::Participant).await;
        harness
            .usecase
            .execute(&op, Command::Select { target: alice.clone() })
            .await;
        drain(&mut op_rx);
        drain(&mut alice_rx);

        // when (操作):
        harness
            .usecase
            .execute(
                &alice,
                Command::Chat {
                    target: op.clone(),
                    text: ChatText::new("hi".to_string()).unwrap(),
                },
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            messages(&mut op_rx),
            vec![json!({
                "type": "chat",
                "senderId": "alice",
                "sender": "alice",
                "text": "hi",
                "timestamp": 1_700_000_000_000_i64
            })]
        );
        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(harness.broker.lock().await.snapshot().transcripts, 1);
    }

    #[tokio::test]
    async fn test_media_frame_from_operator_is_dropped() {
        // テスト項目: operator からのメディアフレームはルート表で破棄される
        // given (前提条件):
        let harness = Harness::new(None);
        let (op, _op_rx) = harness.connect("op").await;
        let (alice, mut alice_rx) = harness.connect("alice").await;
        harness.register(&op, Role::Operator).await;
        harness.register(&alice, Role::Participant).await;
        harness
            .usecase
            .execute(&op, Command::Select { target: alice.clone() })
            .await;
        drain(&mut alice_rx);

        // when (操作):
        harness
            .usecase
            .execute(
                &op,
                Command::MediaFrame {
                    target: alice.clone(),
                    payload: json!("jpeg"),
                },
            )
            .await;

        // then (期待する結果):
        assert!(harness.broker.lock().await.lanes().is_empty());
        assert!(drain(&mut alice_rx).is_empty());
    }

    #[tokio::test]
    async fn test_media_frame_is_parked_until_flush() {
        // テスト項目: participant のメディアフレームは即時送信されず低優先度レーンに入る
        // given (前提条件):
        let harness = Harness::new(None);
        let (op, mut op_rx) = harness.connect("op").await;
        let (alice, _alice_rx) = harness.connect("alice").await;
        harness.register(&op, Role::Operator).await;
        harness.register(&alice, Role::Participant).await;
        harness
            .usecase
            .execute(&op, Command::Select { target: alice.clone() })
            .await;
        drain(&mut op_rx);

        // when (操作):
        for n in 0..5 {
            harness
                .usecase
                .execute(
                    &alice,
                    Command::MediaFrame {
                        target: op.clone(),
                        payload: json!(n),
                    },
                )
                .await;
        }

        // then (期待する結果):
        assert!(drain(&mut op_rx).is_empty());
        assert_eq!(harness.broker.lock().await.lanes().len(), 1);
    }

    #[tokio::test]
    async fn test_second_registration_is_ignored() {
        // テスト項目: 登録済みコネクションの再登録は無視される
        // given (前提条件):
        let harness = Harness::new(None);
        let (alice, mut alice_rx) = harness.connect("alice").await;
        harness.register(&alice, Role::Participant).await;
        drain(&mut alice_rx);

        // when (操作):
        harness.register(&alice, Role::Operator).await;

        // then (期待する結果):
        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(
            harness.broker.lock().await.role_of(&alice),
            Some(Role::Participant)
        );
    }
}
