//! Session History Store trait 定義
//!
//! ドメイン層が必要とするストアのインターフェース。
//! 具体的な実装（インメモリ）は Infrastructure 層が提供します（依存性の逆転）。
//! ブローカー状態のロック中に呼ばれるため同期 trait です。

use super::{
    entity::HistoryEntry,
    value_object::{ConnectionId, PairingKey},
};

pub trait HistoryStore: Send + Sync {
    /// `key` の履歴に 1 件追記
    fn append(&mut self, key: &PairingKey, entry: HistoryEntry);

    /// `key` の履歴を古い順にすべて取得（無ければ空）
    fn entries(&self, key: &PairingKey) -> Vec<HistoryEntry>;

    /// `id` を含むキーの履歴をすべて破棄し、破棄した件数を返す
    fn forget_involving(&mut self, id: &ConnectionId) -> usize;

    /// 保持している履歴の数
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
