//! Connection Registry
//!
//! コネクション ID からロールと表示名を引けるようにし、
//! 現在 operator ロールを持つコネクションを管理します。

use std::collections::HashMap;

use super::{
    entity::Connection,
    error::BrokerError,
    value_object::{ConnectionId, DisplayName, Role},
};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    operator: Option<ConnectionId>,
    next_seq: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// トランスポートが払い出した ID でコネクションを登録
    ///
    /// # Errors
    ///
    /// * `AlreadyRegistered` - ID が登録済み
    /// * `RoleConflict` - operator が既にいる状態で operator として登録しようとした
    pub fn register(
        &mut self,
        id: ConnectionId,
        name: DisplayName,
        role: Role,
    ) -> Result<&Connection, BrokerError> {
        if self.connections.contains_key(&id) {
            return Err(BrokerError::AlreadyRegistered(id.into_string()));
        }
        if role == Role::Operator {
            if self.operator.is_some() {
                return Err(BrokerError::RoleConflict);
            }
            self.operator = Some(id.clone());
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let connection = self
            .connections
            .entry(id.clone())
            .or_insert(Connection::new(id, name, role, seq));
        Ok(connection)
    }

    pub fn lookup(&self, id: &ConnectionId) -> Result<&Connection, BrokerError> {
        self.connections
            .get(id)
            .ok_or_else(|| BrokerError::NotFound(id.as_str().to_string()))
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// コネクションを削除（未登録なら `None`）
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        let removed = self.connections.remove(id)?;
        if self.operator.as_ref() == Some(id) {
            self.operator = None;
        }
        Some(removed)
    }

    pub fn operator(&self) -> Option<&Connection> {
        self.operator
            .as_ref()
            .and_then(|id| self.connections.get(id))
    }

    /// 全コネクション（登録順）
    pub fn in_join_order(&self) -> Vec<&Connection> {
        let mut connections: Vec<&Connection> = self.connections.values().collect();
        connections.sort_by_key(|c| c.joined_seq);
        connections
    }

    /// participant のみ（登録順）
    pub fn participants(&self) -> Vec<&Connection> {
        self.in_join_order()
            .into_iter()
            .filter(|c| c.role == Role::Participant)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
