//! Root banner, health report and orchestration probes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DependencyHealth, DependencyStatus, HealthSnapshot};
use crate::settings::Settings;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "pentrypal-api";
const WELCOME_MESSAGE: &str = "Welcome to PentryPal API";

/// Probe flags plus the dependency statuses recorded at startup.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    dependencies: Arc<DependencyHealth>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::with_dependencies(Arc::new(DependencyHealth::new()))
    }
}

impl HealthState {
    /// Not ready, live, all dependencies pending.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dependencies(dependencies: Arc<DependencyHealth>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            dependencies,
        }
    }

    pub fn dependencies(&self) -> &DependencyHealth {
        &self.dependencies
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so orchestrators stop routing during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Body of `GET /`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RootBanner {
    pub message: String,
    pub version: String,
    /// Location of the interactive API docs.
    pub docs: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    /// Always `healthy` while the process serves requests.
    pub status: &'static str,
    pub service: &'static str,
    /// Worst dependency status.
    pub overall: DependencyStatus,
    pub dependencies: HealthSnapshot,
}

/// Welcome banner with the API version and docs location.
#[utoipa::path(
    get,
    path = "/",
    tags = ["meta"],
    responses((status = 200, description = "Service banner", body = RootBanner))
)]
#[get("/")]
pub async fn root(settings: web::Data<Settings>) -> web::Json<RootBanner> {
    web::Json(RootBanner {
        message: WELCOME_MESSAGE.to_owned(),
        version: settings.project_version.clone(),
        docs: settings.docs_path(),
    })
}

/// Health report with per-dependency status.
///
/// Answers 200 even when a dependency is down; the process keeps serving
/// and `dependencies` says what is degraded.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    responses((status = 200, description = "Service and dependency health", body = HealthReport))
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    let snapshot = state.dependencies().snapshot();
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(HealthReport {
            status: "healthy",
            service: SERVICE_NAME,
            overall: snapshot.overall(),
            dependencies: snapshot,
        })
}

/// Readiness probe: 200 once the server is bound, 503 before.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe: 200 while alive, 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::Dependency;

    #[rstest]
    #[actix_web::test]
    async fn root_reports_version_and_docs() {
        let settings = Settings {
            project_version: "2.0.0".into(),
            ..Settings::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(settings))
                .service(root),
        )
        .await;
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(
            body,
            json!({
                "message": "Welcome to PentryPal API",
                "version": "2.0.0",
                "docs": "/api/v1/docs"
            })
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn health_surfaces_degraded_dependencies() {
        let state = HealthState::new();
        state
            .dependencies()
            .set(Dependency::Database, DependencyStatus::Unavailable);
        state
            .dependencies()
            .set(Dependency::Realtime, DependencyStatus::Healthy);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(health),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "pentrypal-api");
        assert_eq!(body["overall"], "degraded");
        assert_eq!(
            body["dependencies"],
            json!({"database": "unavailable", "realtime": "healthy"})
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn probes_follow_state_transitions() {
        let state = web::Data::new(HealthState::new());
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .service(ready)
                .service(live),
        )
        .await;
        let call = |uri: &'static str| test::TestRequest::get().uri(uri).to_request();

        let res = test::call_service(&app, call("/health/ready")).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        state.mark_ready();
        let res = test::call_service(&app, call("/health/ready")).await;
        assert_eq!(res.status(), StatusCode::OK);

        state.mark_unhealthy();
        let res = test::call_service(&app, call("/health/live")).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
