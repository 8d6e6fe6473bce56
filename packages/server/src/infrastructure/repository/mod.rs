//! ドメイン層のストア trait の実装

pub mod inmemory;

pub use inmemory::InMemoryHistoryStore;
