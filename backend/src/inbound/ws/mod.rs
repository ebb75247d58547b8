//! Realtime WebSocket adapter.
//!
//! `GET {API_V1_STR}/realtime/ws/{token}` upgrades to a WebSocket. The token
//! must be non-empty; validating it against issued credentials is left to
//! the authentication layer.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, info};

mod messages;
mod registry;
mod session;

pub use messages::{ClientMessage, ServerMessage};
pub use registry::{ConnectionInfo, ConnectionRegistry, Registration, token_fingerprint};

/// Dependencies of the WebSocket endpoint.
#[derive(Clone)]
pub struct WsState {
    pub registry: Arc<ConnectionRegistry>,
    pub heartbeat: Duration,
}

impl WsState {
    pub fn new(registry: Arc<ConnectionRegistry>, heartbeat: Duration) -> Self {
        Self {
            registry,
            heartbeat: heartbeat.max(Duration::from_millis(10)),
        }
    }
}

/// Upgrade to the realtime socket. Responds 401 for an empty token.
#[get("/realtime/ws/{token:.*}")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    token: web::Path<String>,
    req: HttpRequest,
    body: Payload,
) -> actix_web::Result<HttpResponse> {
    let token = token.into_inner();
    if token.trim().is_empty() {
        return Err(actix_web::error::ErrorUnauthorized("missing token"));
    }

    let (response, ws_session, stream) = actix_ws::handle(&req, body).map_err(|err| {
        error!(error = %err, "websocket upgrade failed");
        err
    })?;

    let registration = state.registry.register(&token);
    info!(
        connection = %registration.id(),
        token = %token_fingerprint(&token),
        "websocket connected"
    );
    let session = session::WsSession::new(state.heartbeat, registration);
    actix_web::rt::spawn(session.run(ws_session, stream));
    Ok(response)
}

#[cfg(test)]
mod tests;
