//! Application assembly and HTTP server construction.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::doc::openapi_for;
use crate::inbound::http::health::{health, live, ready, root};
use crate::inbound::http::{HealthState, cors_policy, uploads_service};
use crate::inbound::ws::{self, ConnectionRegistry, WsState};
use crate::middleware::{Trace, TrustedHost};
use crate::outbound::persistence::DatabaseSessions;
use crate::settings::Settings;

/// Shared state cloned into every worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub settings: web::Data<Settings>,
    pub health_state: web::Data<HealthState>,
    pub ws_state: web::Data<WsState>,
    pub sessions: web::Data<DatabaseSessions>,
}

impl AppDependencies {
    pub fn new(
        settings: Arc<Settings>,
        health_state: web::Data<HealthState>,
        sessions: DatabaseSessions,
    ) -> Self {
        let heartbeat = Duration::from_secs(settings.websocket_heartbeat_interval);
        let registry = Arc::new(ConnectionRegistry::new(Arc::new(DefaultClock)));
        Self {
            settings: web::Data::from(settings),
            health_state,
            ws_state: web::Data::new(WsState::new(registry, heartbeat)),
            sessions: web::Data::new(sessions),
        }
    }
}

/// Build the application: middleware, routes, docs and uploads.
///
/// Middleware runs outermost first: request trace, trusted host, CORS.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        settings,
        health_state,
        ws_state,
        sessions,
    } = deps;

    let api_prefix = settings.api_v1_str.trim_end_matches('/').to_owned();
    let openapi = openapi_for(&settings);
    let redoc = Redoc::with_url(settings.redoc_path(), openapi.clone());
    let docs = SwaggerUi::new(format!("{}/{{_:.*}}", settings.docs_path()))
        .url(format!("{api_prefix}/openapi.json"), openapi);
    let api = web::scope(&api_prefix).service(ws::ws_entry);

    App::new()
        .app_data(web::PayloadConfig::new(settings.max_file_size_bytes()))
        .app_data(health_state)
        .app_data(ws_state)
        .app_data(sessions)
        .app_data(settings.clone())
        .wrap(cors_policy(&settings.cors_origins()))
        .wrap(TrustedHost::new(settings.allowed_hosts()))
        .wrap(Trace)
        .service(root)
        .service(health)
        .service(ready)
        .service(live)
        .service(docs)
        .service(redoc)
        .service(api)
        .service(uploads_service(&settings.upload_dir))
}

/// Bind the HTTP server and mark the service ready.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        settings,
        bind_addr,
        sessions,
    } = config;
    let deps = AppDependencies::new(settings, health_state.clone(), sessions);

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}
