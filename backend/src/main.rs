//! Backend entry point: loads settings, probes dependencies and serves HTTP.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};

use pantry_backend::domain::ports::{LocalRealtimeBackend, RealtimeBackend};
use pantry_backend::domain::{DependencyHealth, lifecycle};
use pantry_backend::inbound::http::{HealthState, ensure_upload_dir};
use pantry_backend::outbound::persistence::{DatabaseSessions, PoolConfig};
use pantry_backend::outbound::realtime::RedisRealtimeBackend;
use pantry_backend::server::{ServerConfig, create_server};
use pantry_backend::settings::Settings;
use pantry_backend::telemetry::init_tracing;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let env = DefaultEnv::new();
    init_tracing(&env);
    let settings = Arc::new(Settings::from_env(&env));
    info!(
        debug = settings.debug,
        production = settings.is_production(),
        port = settings.port,
        "starting {}",
        settings.project_name
    );

    let sessions = DatabaseSessions::connect(PoolConfig::from_settings(&settings)).await;
    let realtime: Box<dyn RealtimeBackend> = if settings.redis_url.trim().is_empty() {
        info!("REDIS_URL is empty; realtime stays process-local");
        Box::new(LocalRealtimeBackend)
    } else {
        Box::new(RedisRealtimeBackend::new(settings.redis_url.clone()))
    };
    let dependencies = Arc::new(DependencyHealth::new());
    lifecycle::startup(&sessions, realtime.as_ref(), &dependencies).await;

    if let Err(error) = ensure_upload_dir(&settings.upload_dir) {
        warn!(%error, path = %settings.upload_dir.display(), "upload directory unavailable");
    }

    let health_state = web::Data::new(HealthState::with_dependencies(dependencies));
    let config = ServerConfig::new(Arc::clone(&settings)).with_sessions(sessions);
    info!(addr = %config.bind_addr(), "binding HTTP server");
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;

    health_state.mark_unhealthy();
    lifecycle::shutdown(realtime.as_ref()).await;
    info!("shutdown complete");
    result
}
