//! Inbound adapters: HTTP endpoints and the realtime WebSocket.

pub mod http;
pub mod ws;
