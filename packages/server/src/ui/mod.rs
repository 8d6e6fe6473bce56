//! UI 層: axum サーバー・ハンドラ・共有状態

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
