//! HTTP server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use crate::outbound::persistence::DatabaseSessions;
use crate::settings::Settings;

/// Everything [`super::create_server`] needs besides health state.
#[derive(Clone)]
pub struct ServerConfig {
    pub(crate) settings: Arc<Settings>,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) sessions: DatabaseSessions,
}

impl ServerConfig {
    /// Bind to `0.0.0.0:{PORT}` with a disabled session factory.
    pub fn new(settings: Arc<Settings>) -> Self {
        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
        Self {
            settings,
            bind_addr,
            sessions: DatabaseSessions::disabled(),
        }
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: DatabaseSessions) -> Self {
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn binds_all_interfaces_on_the_configured_port() {
        let settings = Settings {
            port: 9123,
            ..Settings::default()
        };
        let config = ServerConfig::new(Arc::new(settings));
        assert_eq!(config.bind_addr(), "0.0.0.0:9123".parse().expect("addr"));
        assert!(!config.sessions.is_available());
    }
}
