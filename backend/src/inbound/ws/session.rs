//! Per-connection WebSocket loop.
//!
//! The server pings every heartbeat interval and closes the socket after two
//! intervals without client traffic. Text frames are answered with a typed
//! reply; other frames only count as activity.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{debug, warn};

use super::messages::{ServerMessage, reply_to};
use super::registry::Registration;

enum Shutdown {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

pub(super) struct WsSession {
    heartbeat: Duration,
    registration: Registration,
}

impl WsSession {
    pub(super) fn new(heartbeat: Duration, registration: Registration) -> Self {
        Self {
            heartbeat,
            registration,
        }
    }

    fn client_timeout(&self) -> Duration {
        self.heartbeat.saturating_mul(2)
    }

    pub(super) async fn run(self, mut session: Session, mut stream: MessageStream) {
        let mut last_seen = Instant::now();
        let mut heartbeat = time::interval(self.heartbeat);

        let shutdown = loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => self.on_tick(&mut session, last_seen).await,
                message = stream.recv() => {
                    self.on_message(&mut session, &mut last_seen, message).await
                }
            };
            if let Err(shutdown) = result {
                break shutdown;
            }
        };

        self.log_shutdown(&shutdown);
        if let Some(reason) = close_reason(shutdown) {
            if let Err(error) = session.close(reason).await {
                debug!(%error, "socket already closed");
            }
        }
        // Dropping `self` releases the registration.
    }

    async fn on_tick(&self, session: &mut Session, last_seen: Instant) -> Result<(), Shutdown> {
        if last_seen.elapsed() > self.client_timeout() {
            return Err(Shutdown::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(Shutdown::Network)
    }

    async fn on_message(
        &self,
        session: &mut Session,
        last_seen: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), Shutdown> {
        let message = message.ok_or(Shutdown::StreamClosed)?;
        let message = message.map_err(Shutdown::Protocol)?;
        *last_seen = Instant::now();

        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(Shutdown::Network),
            Message::Text(text) => send_json(session, &reply_to(&text)).await,
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
            Message::Close(reason) => Err(Shutdown::ClientClosed(reason)),
        }
    }

    fn log_shutdown(&self, shutdown: &Shutdown) {
        let connection = self.registration.id();
        match shutdown {
            Shutdown::HeartbeatTimeout => warn!(%connection, "heartbeat timeout; closing"),
            Shutdown::Protocol(error) => warn!(%connection, %error, "websocket protocol error"),
            Shutdown::Network(error) => warn!(%connection, %error, "websocket send failed"),
            Shutdown::ClientClosed(_) | Shutdown::StreamClosed => {
                debug!(%connection, "websocket closed by client");
            }
        }
    }
}

async fn send_json(session: &mut Session, message: &ServerMessage) -> Result<(), Shutdown> {
    match serde_json::to_string(message) {
        Ok(body) => session.text(body).await.map_err(Shutdown::Network),
        Err(error) => {
            warn!(%error, "failed to serialise websocket reply");
            Ok(())
        }
    }
}

fn close_reason(shutdown: Shutdown) -> Option<Option<CloseReason>> {
    match shutdown {
        Shutdown::HeartbeatTimeout => Some(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        })),
        Shutdown::Protocol(_) => Some(Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        })),
        Shutdown::ClientClosed(reason) => Some(reason),
        Shutdown::StreamClosed | Shutdown::Network(_) => None,
    }
}
