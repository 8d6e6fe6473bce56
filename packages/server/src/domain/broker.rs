//! Broker 集約
//!
//! Connection Registry・Pairing Scheduler・Session History Store・低優先度レーンを
//! 所有し、これらを変更する唯一の場所です。各操作は集約に対する同期関数で、
//! 呼び出し元が実行すべきエフェクトを返します。操作が返った時点で以下の不変条件が成り立ちます。
//!
//! - キュー内・ペア中の ID はすべて登録済み
//! - participant がキューにいるのは、ペアでなく operator がいるときに限る
//! - ペアは対称で、各コネクションが属するペアは高々 1 つ
//! - 削除されたコネクションに関わる保留中の低優先度通知は残らない

use serde_json::Value;

use super::{
    entity::{Connection, HistoryEntry},
    error::BrokerError,
    history::HistoryStore,
    lane::LowPriorityLanes,
    notice::{Effect, NegotiationKind, Notice, RosterEntry},
    registry::ConnectionRegistry,
    scheduler::PairingScheduler,
    value_object::{ChatText, ConnectionId, DisplayName, PairingKey, Role, Timestamp},
};

pub struct Broker {
    registry: ConnectionRegistry,
    scheduler: PairingScheduler,
    history: Box<dyn HistoryStore>,
    lanes: LowPriorityLanes,
}

/// ある時点のブローカー状態
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSnapshot {
    pub connections: Vec<Connection>,
    pub queue: Vec<ConnectionId>,
    /// (operator, participant)
    pub pairings: Vec<(ConnectionId, ConnectionId)>,
    pub pending_low_priority: usize,
    pub transcripts: usize,
}

impl Broker {
    pub fn new(history: Box<dyn HistoryStore>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            scheduler: PairingScheduler::new(),
            history,
            lanes: LowPriorityLanes::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &PairingScheduler {
        &self.scheduler
    }

    pub fn lanes(&self) -> &LowPriorityLanes {
        &self.lanes
    }

    pub fn lanes_mut(&mut self) -> &mut LowPriorityLanes {
        &mut self.lanes
    }

    pub fn role_of(&self, id: &ConnectionId) -> Option<Role> {
        self.registry.lookup(id).ok().map(|c| c.role)
    }

    /// コネクションを登録し、キュー状態を確定する
    ///
    /// participant は operator がいればキューに入り、いなければ位置 0 を通知される。
    /// operator の登録時は、ペアでない participant を参加順にすべてキューへ入れる。
    pub fn register(
        &mut self,
        id: &ConnectionId,
        name: DisplayName,
        role: Role,
    ) -> Result<Vec<Effect>, BrokerError> {
        self.registry.register(id.clone(), name, role)?;

        let mut effects = vec![Effect::high(
            id.clone(),
            Notice::Welcome {
                assigned_id: id.clone(),
            },
        )];

        match role {
            Role::Participant => {
                let position = if self.registry.operator().is_some() {
                    self.scheduler.enqueue(id.clone()).unwrap_or(0)
                } else {
                    0
                };
                effects.push(Effect::high(id.clone(), Notice::QueuePosition { position }));
            }
            Role::Operator => {
                let waiting: Vec<ConnectionId> = self
                    .registry
                    .participants()
                    .into_iter()
                    .filter(|c| !self.scheduler.is_paired(&c.id))
                    .map(|c| c.id.clone())
                    .collect();
                for participant in waiting {
                    if let Some(position) = self.scheduler.enqueue(participant.clone()) {
                        effects.push(Effect::high(participant, Notice::QueuePosition { position }));
                    }
                }
            }
        }

        effects.extend(self.roster_effect());
        Ok(effects)
    }

    /// operator と `target` をペアにする（キュー内の位置は問わない）
    ///
    /// operator が別の相手とペア中なら先にそのペアを解除する。
    /// 現在の相手を再度選んだ場合は何もしない。
    pub fn select(
        &mut self,
        operator_id: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<Vec<Effect>, BrokerError> {
        let operator = self.registry.lookup(operator_id)?;
        if !operator.is_operator() {
            return Err(BrokerError::Unauthorized);
        }
        let operator_name = operator.name.clone();

        let participant_name = match self.registry.lookup(target) {
            Ok(c) if c.role == Role::Participant => c.name.clone(),
            _ => return Err(BrokerError::NotFound(target.as_str().to_string())),
        };

        if self.scheduler.partner_of(operator_id) == Some(target) {
            return Ok(Vec::new());
        }

        let mut effects = Vec::new();
        if self.scheduler.is_paired(operator_id) {
            // 解除された participant の新しい位置は後続の再採番で通知される
            let (released, _) = self.release_pairing(operator_id);
            effects.extend(released);
        }

        self.scheduler.pair(operator_id.clone(), target.clone());
        let key = PairingKey::new(operator_id.clone(), target.clone());
        let history = self.history.entries(&key);
        tracing::debug!(
            "Pairing {} started with {} prior history entries",
            key,
            history.len()
        );

        effects.push(Effect::high(
            operator_id.clone(),
            Notice::PairingStarted {
                partner_id: target.clone(),
                partner_name: participant_name,
                history: history.clone(),
            },
        ));
        effects.push(Effect::high(
            target.clone(),
            Notice::PairingStarted {
                partner_id: operator_id.clone(),
                partner_name: operator_name,
                history,
            },
        ));
        effects.extend(self.queue_position_effects());
        effects.extend(self.roster_effect());
        Ok(effects)
    }

    /// `initiator` が属するペアを終了する
    ///
    /// `explicit_partner` を指定する場合は現在の相手と一致しなければならない。
    /// participant 側はキュー末尾に戻る。
    pub fn end_pairing(
        &mut self,
        initiator: &ConnectionId,
        explicit_partner: Option<&ConnectionId>,
    ) -> Result<Vec<Effect>, BrokerError> {
        self.registry.lookup(initiator)?;

        let partner = self.scheduler.partner_of(initiator).cloned();
        match (explicit_partner, partner) {
            (Some(named), Some(partner)) if *named == partner => {}
            (Some(named), _) => return Err(BrokerError::NotFound(named.as_str().to_string())),
            (None, Some(_)) => {}
            (None, None) => return Err(BrokerError::NotFound(initiator.as_str().to_string())),
        }

        let (mut effects, requeued) = self.release_pairing(initiator);
        if let Some(participant) = requeued {
            let position = self.scheduler.position(&participant).unwrap_or(0);
            effects.push(Effect::high(participant, Notice::QueuePosition { position }));
        }
        effects.extend(self.roster_effect());
        Ok(effects)
    }

    /// コネクションを削除し、それを参照するものをすべて後始末する
    ///
    /// 冪等: 未知の ID の削除はエフェクトを返さない。
    pub fn remove(&mut self, id: &ConnectionId) -> Vec<Effect> {
        self.lanes.discard(id);
        if let Some(partner) = self.scheduler.partner_of(id).cloned() {
            self.lanes.discard_from(&partner, id);
        }
        let Some(connection) = self.registry.remove(id) else {
            return Vec::new();
        };
        let forgotten = self.history.forget_involving(id);
        if forgotten > 0 {
            tracing::debug!("Dropped {} transcripts involving {}", forgotten, id);
        }

        let mut effects = Vec::new();
        match connection.role {
            Role::Operator => {
                if let Some(partner) = self.scheduler.unpair(id) {
                    effects.push(Effect::high(partner, Notice::PairingEnded));
                }
                let cleared = self.scheduler.clear_queue();
                tracing::info!(
                    "Operator {} left; cleared {} queued participants",
                    id,
                    cleared.len()
                );
                for participant in self.registry.participants() {
                    effects.push(Effect::high(
                        participant.id.clone(),
                        Notice::QueuePosition { position: 0 },
                    ));
                }
            }
            Role::Participant => {
                if self.scheduler.dequeue(id) {
                    effects.extend(self.queue_position_effects());
                }
                if let Some(operator) = self.scheduler.unpair(id) {
                    effects.push(Effect::high(operator, Notice::PairingEnded));
                }
                effects.extend(self.roster_effect());
            }
        }
        effects
    }

    /// チャットを送信者の相手に中継し、履歴に追記する
    pub fn chat(
        &mut self,
        sender: &ConnectionId,
        target: &ConnectionId,
        text: ChatText,
        now: Timestamp,
    ) -> Result<Vec<Effect>, BrokerError> {
        self.ensure_partner(sender, target)?;
        let sender_conn = self.registry.lookup(sender)?;
        let sender_name = sender_conn.name.clone();
        let key = if sender_conn.is_operator() {
            PairingKey::new(sender.clone(), target.clone())
        } else {
            PairingKey::new(target.clone(), sender.clone())
        };

        self.history.append(
            &key,
            HistoryEntry::new(sender_name.clone(), text.clone(), now),
        );

        Ok(vec![Effect::high(
            target.clone(),
            Notice::Chat {
                sender_id: sender.clone(),
                sender: sender_name,
                text,
                timestamp: now,
            },
        )])
    }

    /// WebRTC ネゴシエーションのペイロードをそのまま送信者の相手に転送する
    pub fn negotiate(
        &mut self,
        sender: &ConnectionId,
        kind: NegotiationKind,
        target: &ConnectionId,
        payload: Value,
    ) -> Result<Vec<Effect>, BrokerError> {
        self.ensure_partner(sender, target)?;
        Ok(vec![Effect::high(
            target.clone(),
            Notice::Negotiation {
                kind,
                payload,
                sender_id: sender.clone(),
            },
        )])
    }

    /// participant からのメディアフレームを低優先度で operator に転送する
    pub fn media_frame(
        &mut self,
        sender: &ConnectionId,
        target: &ConnectionId,
        payload: Value,
    ) -> Result<Vec<Effect>, BrokerError> {
        if self.role_of(sender) != Some(Role::Participant) {
            return Err(BrokerError::Unauthorized);
        }
        self.ensure_partner(sender, target)?;
        Ok(vec![Effect::low(
            target.clone(),
            Notice::MediaFrame {
                payload,
                sender_id: sender.clone(),
            },
        )])
    }

    /// 保留中の低優先度通知をすべて取り出す
    pub fn drain_low_priority(&mut self) -> Vec<(ConnectionId, Notice)> {
        self.lanes.drain()
    }

    pub fn snapshot(&self) -> BrokerSnapshot {
        BrokerSnapshot {
            connections: self
                .registry
                .in_join_order()
                .into_iter()
                .cloned()
                .collect(),
            queue: self
                .scheduler
                .positions()
                .into_iter()
                .map(|(id, _)| id)
                .collect(),
            pairings: self
                .scheduler
                .pairings()
                .into_iter()
                .map(|(a, b)| {
                    if self.role_of(&a) == Some(Role::Operator) {
                        (a, b)
                    } else {
                        (b, a)
                    }
                })
                .collect(),
            pending_low_priority: self.lanes.len(),
            transcripts: self.history.len(),
        }
    }

    fn ensure_partner(
        &self,
        sender: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<(), BrokerError> {
        if self.scheduler.partner_of(sender) == Some(target) {
            Ok(())
        } else {
            Err(BrokerError::NotFound(target.as_str().to_string()))
        }
    }

    /// `id` のペアを解除し、participant 側を再キューして双方に通知する
    ///
    /// 元の相手から届いた保留中のフレームは破棄する。
    /// エフェクトと、キューに戻った participant を返す。
    fn release_pairing(&mut self, id: &ConnectionId) -> (Vec<Effect>, Option<ConnectionId>) {
        let Some(partner) = self.scheduler.unpair(id) else {
            return (Vec::new(), None);
        };
        self.lanes.discard_from(&partner, id);
        self.lanes.discard_from(id, &partner);
        let (operator, participant) = if self.role_of(id) == Some(Role::Operator) {
            (id.clone(), partner)
        } else {
            (partner, id.clone())
        };

        self.scheduler.enqueue(participant.clone());
        let effects = vec![
            Effect::high(participant.clone(), Notice::PairingEnded),
            Effect::high(operator, Notice::PairingEnded),
        ];
        (effects, Some(participant))
    }

    fn queue_position_effects(&self) -> Vec<Effect> {
        self.scheduler
            .positions()
            .into_iter()
            .map(|(id, position)| Effect::high(id, Notice::QueuePosition { position }))
            .collect()
    }

    fn roster_effect(&self) -> Option<Effect> {
        let operator = self.registry.operator()?;
        let entries = self
            .registry
            .in_join_order()
            .into_iter()
            .map(|c| RosterEntry {
                id: c.id.clone(),
                name: c.name.clone(),
                role: c.role,
                paired: self.scheduler.is_paired(&c.id),
                position: self.scheduler.position(&c.id).unwrap_or(0),
            })
            .collect();
        Some(Effect::high(operator.id.clone(), Notice::Roster { entries }))
    }
}
