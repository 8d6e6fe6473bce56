//! UseCase: 通知の配送（Delivery Engine）
//!
//! ## 概要
//!
//! 送信通知を 2 段階の優先度でトランスポートに載せます。
//!
//! - `High`: 即時にトランスポートへ送る。送信失敗は破棄する
//! - `Low`: ブローカー状態内の宛先レーン（最新優先）に保留し、周期的な flush tick で
//!   コネクションごとに 1 tick あたり高々 1 件送る
//!
//! flush tick がブローカーのロックを持つのはレーンを取り出す間だけで、送信はロック解放後に行います。

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::domain::{Broker, BrokerError, ConnectionId, Effect, MessagePusher, Notice, Priority};

use super::SharedBroker;

pub struct DeliveryEngine {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DeliveryEngine {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    pub fn message_pusher(&self) -> &Arc<dyn MessagePusher> {
        &self.message_pusher
    }

    /// `notice` を指定の優先度で `to` に送る
    ///
    /// `broker` はロック済みのブローカー状態。低優先度の通知はそのレーンに保留され、
    /// ここではトランスポートに触れない。
    pub async fn send(
        &self,
        broker: &mut Broker,
        to: ConnectionId,
        notice: Notice,
        priority: Priority,
    ) {
        match priority {
            Priority::High => {
                self.push_now(&to, &notice).await;
            }
            Priority::Low => {
                if broker.lanes_mut().put(to.clone(), notice).is_some() {
                    tracing::trace!("Superseded pending low-priority notice for '{}'", to);
                }
            }
        }
    }

    /// ブローカー操作のエフェクトを順番に実行
    pub async fn dispatch(&self, broker: &mut Broker, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Deliver {
                    to,
                    notice,
                    priority,
                } => self.send(broker, to, notice, priority).await,
                Effect::Close { connection } => {
                    if let Err(e) = self.message_pusher.close(&connection).await {
                        tracing::debug!("Failed to close '{}': {}", connection, e);
                    }
                }
            }
        }
    }

    /// flush tick を 1 回実行し、トランスポートに渡せた件数を返す
    pub async fn flush(&self, broker: &Mutex<Broker>) -> usize {
        let pending = broker.lock().await.drain_low_priority();

        let mut delivered = 0;
        for (to, notice) in pending {
            if self.push_now(&to, &notice).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// 周期 flush タスクを起動
    pub fn spawn_flush_task(self: Arc<Self>, broker: SharedBroker, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.flush(&broker).await;
            }
        })
    }

    async fn push_now(&self, to: &ConnectionId, notice: &Notice) -> bool {
        match self.message_pusher.push_to(to, notice).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(
                    "{} ({})",
                    BrokerError::TransportUnavailable(to.as_str().to_string()),
                    e
                );
                false
            }
        }
    }
}
