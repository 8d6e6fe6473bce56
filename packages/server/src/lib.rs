//! Madoguchi session broker.
//!
//! Pairs a single operator with queued participants one at a time and relays
//! chat, WebRTC negotiation and video frames between the pair over WebSocket.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
