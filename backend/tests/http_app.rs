//! The assembled application: routes, middleware, docs and uploads.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{test, web};
use pantry_backend::domain::{Dependency, DependencyHealth, DependencyStatus};
use pantry_backend::inbound::http::HealthState;
use pantry_backend::outbound::persistence::DatabaseSessions;
use pantry_backend::server::{AppDependencies, build_app};
use pantry_backend::settings::Settings;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

// Example Sec-WebSocket-Key from RFC 6455 section 1.3.
const RFC6455_SAMPLE_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

struct Harness {
    deps: AppDependencies,
    uploads: TempDir,
}

#[fixture]
fn harness() -> Harness {
    let uploads = tempfile::tempdir().expect("upload dir");
    let settings = Settings {
        project_version: "1.2.3".into(),
        upload_dir: uploads.path().to_path_buf(),
        ..Settings::default()
    };
    let health = web::Data::new(HealthState::with_dependencies(Arc::new(
        DependencyHealth::new(),
    )));
    let deps = AppDependencies::new(Arc::new(settings), health, DatabaseSessions::disabled());
    Harness { deps, uploads }
}

#[rstest]
#[actix_web::test]
async fn root_banner_points_at_the_docs(harness: Harness) {
    let app = test::init_service(build_app(harness.deps)).await;
    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(
        body,
        json!({
            "message": "Welcome to PentryPal API",
            "version": "1.2.3",
            "docs": "/api/v1/docs",
        })
    );
}

#[rstest]
#[actix_web::test]
async fn health_reports_dependencies_without_failing(harness: Harness) {
    harness
        .deps
        .health_state
        .dependencies()
        .set(Dependency::Database, DependencyStatus::Unavailable);
    harness
        .deps
        .health_state
        .dependencies()
        .set(Dependency::Realtime, DependencyStatus::Healthy);
    let app = test::init_service(build_app(harness.deps)).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
        Some(&b"no-store"[..])
    );
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
async fn probes_follow_the_server_lifecycle(harness: Harness) {
    let state = harness.deps.health_state.clone();
    let app = test::init_service(build_app(harness.deps)).await;
    let ready = || test::TestRequest::get().uri("/health/ready").to_request();
    let live = || test::TestRequest::get().uri("/health/live").to_request();

    assert_eq!(
        test::call_service(&app, ready()).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(test::call_service(&app, live()).await.status(), StatusCode::OK);

    state.mark_ready();
    assert_eq!(test::call_service(&app, ready()).await.status(), StatusCode::OK);

    state.mark_unhealthy();
    assert_eq!(
        test::call_service(&app, live()).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[rstest]
#[actix_web::test]
async fn responses_carry_a_request_id(harness: Harness) {
    let app = test::init_service(build_app(harness.deps)).await;
    let incoming = "6f1c1a52-3c1b-4f7e-9a3e-2d6a3d6f0b11";
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/health/live")
            .insert_header(("x-request-id", incoming))
            .to_request(),
    )
    .await;
    assert_eq!(
        res.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(incoming.as_bytes())
    );
}

#[rstest]
#[actix_web::test]
async fn openapi_document_is_published_under_the_api_prefix(harness: Harness) {
    let app = test::init_service(build_app(harness.deps)).await;
    let doc: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/openapi.json")
            .to_request(),
    )
    .await;
    assert_eq!(doc["info"]["title"], "PentryPal API");
    assert_eq!(doc["info"]["version"], "1.2.3");
    assert!(doc["paths"].get("/health").is_some());

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/docs/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let redoc = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/redoc").to_request(),
    )
    .await;
    assert_eq!(redoc.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn uploaded_files_are_served(harness: Harness) {
    std::fs::write(harness.uploads.path().join("avatar.txt"), b"avatar").expect("write upload");
    let app = test::init_service(build_app(harness.deps)).await;
    let body = test::call_and_read_body(
        &app,
        test::TestRequest::get()
            .uri("/uploads/avatar.txt")
            .to_request(),
    )
    .await;
    assert_eq!(&body[..], b"avatar");

    let missing = test::call_service(
        &app,
        test::TestRequest::get().uri("/uploads/nope.txt").to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn cors_preflight_is_answered_with_credentials(harness: Harness) {
    let app = test::init_service(build_app(harness.deps)).await;
    let res = test::call_service(
        &app,
        test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/health")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.as_bytes()),
        Some(&b"https://app.example.com"[..])
    );
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .map(|v| v.as_bytes()),
        Some(&b"true"[..])
    );
}

#[rstest]
#[case("/api/v1/realtime/ws/token-123", StatusCode::SWITCHING_PROTOCOLS)]
#[case("/api/v1/realtime/ws/", StatusCode::UNAUTHORIZED)]
#[actix_web::test]
async fn realtime_socket_lives_under_the_api_prefix(
    harness: Harness,
    #[case] uri: &str,
    #[case] expected: StatusCode,
) {
    let app = test::init_service(build_app(harness.deps)).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(uri)
            .insert_header((header::UPGRADE, "websocket"))
            .insert_header((header::CONNECTION, "Upgrade"))
            .insert_header((header::SEC_WEBSOCKET_VERSION, "13"))
            .insert_header((header::SEC_WEBSOCKET_KEY, RFC6455_SAMPLE_KEY))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), expected);
}
