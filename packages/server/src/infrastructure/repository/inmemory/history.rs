//! InMemory History Store 実装
//!
//! ドメイン層が定義する HistoryStore trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。プロセス再起動で履歴は消えます。

use std::collections::HashMap;

use crate::domain::{ConnectionId, HistoryEntry, HistoryStore, PairingKey};

/// インメモリ履歴ストア
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    /// Key: PairingKey, Value: 追記順の履歴
    transcripts: HashMap<PairingKey, Vec<HistoryEntry>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&mut self, key: &PairingKey, entry: HistoryEntry) {
        self.transcripts.entry(key.clone()).or_default().push(entry);
    }

    fn entries(&self, key: &PairingKey) -> Vec<HistoryEntry> {
        self.transcripts.get(key).cloned().unwrap_or_default()
    }

    fn forget_involving(&mut self, id: &ConnectionId) -> usize {
        let before = self.transcripts.len();
        self.transcripts.retain(|key, _| !key.involves(id));
        before - self.transcripts.len()
    }

    fn len(&self) -> usize {
        self.transcripts.len()
    }
}
