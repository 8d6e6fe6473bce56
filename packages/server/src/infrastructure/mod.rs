//! Infrastructure 層: DTO・WebSocket トランスポート・ストレージ

pub mod dto;
pub mod message_pusher;
pub mod repository;
