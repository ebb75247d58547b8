//! HTTP inbound adapter: banner, health, CORS and uploads.

pub mod cors;
pub mod health;
pub mod uploads;

pub use cors::cors_policy;
pub use health::HealthState;
pub use uploads::{UPLOADS_MOUNT, ensure_upload_dir, uploads_service};
