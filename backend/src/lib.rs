//! Pantry backend library.
//!
//! - [`domain`]: schema-as-data, the migration chain, entity rules and
//!   dependency health.
//! - [`settings`]: environment-driven configuration.
//! - [`outbound`]: PostgreSQL and Redis adapters.
//! - [`inbound`]: HTTP routes and the realtime WebSocket.
//! - [`server`]: application assembly.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;
pub mod telemetry;

/// Public OpenAPI surface used by Swagger UI.
pub use doc::ApiDoc;
pub use middleware::Trace;
