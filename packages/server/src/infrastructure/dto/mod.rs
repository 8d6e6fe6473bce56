//! DTO（Data Transfer Object）
//!
//! プロトコルごとに整理しています。
//! - `websocket`: WebSocket メッセージの DTO
//! - `http`: HTTP API レスポンスの DTO

pub mod conversion;
pub mod http;
pub mod websocket;

pub use conversion::parse_client_message;
