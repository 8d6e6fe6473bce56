//! Pairing Scheduler
//!
//! FIFO の待機キューと対称なペア関係を保持します。ロールや operator の有無に関する
//! ルールは [`Broker`](super::broker::Broker) が担い、この型は構造上の不変条件のみを保証します。
//!
//! - キューに重複が無い
//! - キュー待ちとペア中を同時に満たすコネクションは無い
//! - ペアは両方向に保存される

use std::collections::{HashMap, VecDeque};

use super::value_object::ConnectionId;

#[derive(Debug, Default)]
pub struct PairingScheduler {
    queue: VecDeque<ConnectionId>,
    partners: HashMap<ConnectionId, ConnectionId>,
}

impl PairingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// キュー末尾に追加
    ///
    /// 1 始まりの位置を返す。ペア中なら `None`。既にキューにいる場合は現在の位置のまま。
    pub fn enqueue(&mut self, id: ConnectionId) -> Option<usize> {
        if self.partners.contains_key(&id) {
            return None;
        }
        if let Some(position) = self.position(&id) {
            return Some(position);
        }
        self.queue.push_back(id);
        Some(self.queue.len())
    }

    /// キューから取り除く（キューにいたかどうかを返す）
    pub fn dequeue(&mut self, id: &ConnectionId) -> bool {
        match self.queue.iter().position(|queued| queued == id) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// 1 始まりのキュー位置
    pub fn position(&self, id: &ConnectionId) -> Option<usize> {
        self.queue
            .iter()
            .position(|queued| queued == id)
            .map(|index| index + 1)
    }

    /// キュー内の全 ID と位置（先頭から）
    pub fn positions(&self) -> Vec<(ConnectionId, usize)> {
        self.queue
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index + 1))
            .collect()
    }

    pub fn is_queued(&self, id: &ConnectionId) -> bool {
        self.queue.contains(id)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// キューを空にし、入っていた ID を返す
    pub fn clear_queue(&mut self) -> Vec<ConnectionId> {
        self.queue.drain(..).collect()
    }

    /// 2 つのコネクションをペアにし、両方をキューから外す
    ///
    /// どちらかが既にペア中なら何も変更せず `false` を返す。
    pub fn pair(&mut self, a: ConnectionId, b: ConnectionId) -> bool {
        if a == b || self.partners.contains_key(&a) || self.partners.contains_key(&b) {
            return false;
        }
        self.dequeue(&a);
        self.dequeue(&b);
        self.partners.insert(a.clone(), b.clone());
        self.partners.insert(b, a);
        true
    }

    /// `id` のペアを解除し、元の相手を返す
    pub fn unpair(&mut self, id: &ConnectionId) -> Option<ConnectionId> {
        let partner = self.partners.remove(id)?;
        self.partners.remove(&partner);
        Some(partner)
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<&ConnectionId> {
        self.partners.get(id)
    }

    pub fn is_paired(&self, id: &ConnectionId) -> bool {
        self.partners.contains_key(id)
    }

    /// 各ペアを 1 回ずつ（`a < b` の向きで）
    pub fn pairings(&self) -> Vec<(ConnectionId, ConnectionId)> {
        let mut pairs: Vec<(ConnectionId, ConnectionId)> = self
            .partners
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}
