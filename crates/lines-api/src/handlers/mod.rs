//! HTTP and WebSocket handlers

pub mod ready;
pub mod subscribe;
