pub mod history;

pub use history::InMemoryHistoryStore;
