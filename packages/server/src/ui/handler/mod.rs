//! リクエストハンドラ

mod http;
mod websocket;

pub use http::{debug_broker_state, health_check};
pub use websocket::websocket_handler;
