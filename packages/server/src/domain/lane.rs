//! 低優先度レーン（最新優先）
//!
//! 各コネクションが保留できる低優先度通知は高々 1 件です。
//! 新しい通知を積むと保留中の通知は置き換えられ、flush tick より速い送信者の
//! 途中フレームはバックログにならずに捨てられます。

use std::collections::HashMap;

use super::{notice::Notice, value_object::ConnectionId};

#[derive(Debug, Default)]
pub struct LowPriorityLanes {
    slots: HashMap<ConnectionId, Notice>,
}

impl LowPriorityLanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// `to` 宛てに `notice` を保留し、置き換えた通知を返す
    pub fn put(&mut self, to: ConnectionId, notice: Notice) -> Option<Notice> {
        self.slots.insert(to, notice)
    }

    /// `id` 宛ての保留通知を破棄
    pub fn discard(&mut self, id: &ConnectionId) -> Option<Notice> {
        self.slots.remove(id)
    }

    /// `to` 宛ての保留通知を、送信元が `sender` の場合のみ破棄
    pub fn discard_from(&mut self, to: &ConnectionId, sender: &ConnectionId) -> Option<Notice> {
        if self.slots.get(to)?.sender_id() == Some(sender) {
            self.slots.remove(to)
        } else {
            None
        }
    }

    /// 保留通知をすべて取り出し、全レーンを空にする
    pub fn drain(&mut self) -> Vec<(ConnectionId, Notice)> {
        self.slots.drain().collect()
    }

    pub fn pending_for(&self, id: &ConnectionId) -> Option<&Notice> {
        self.slots.get(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
