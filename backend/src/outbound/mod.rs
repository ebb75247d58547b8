//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL pool, session factory and migration store
//!   using Diesel.
//! - **realtime**: Redis-backed realtime backend using `bb8-redis`.

pub mod persistence;
pub mod realtime;
