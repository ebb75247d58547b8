//! CORS policy built from the configured origin list.

use actix_cors::Cors;
use tracing::warn;
use url::Url;

/// Credentials are allowed along with any method and header. A `*` entry
/// accepts any origin; other entries must be absolute URLs and are skipped
/// with a warning otherwise.
pub fn cors_policy(origins: &[String]) -> Cors {
    let base = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(600);

    if origins.iter().any(|origin| origin == "*") {
        return base.allow_any_origin();
    }

    valid_origins(origins)
        .into_iter()
        .fold(base, |cors, origin| cors.allowed_origin(&origin))
}

fn valid_origins(origins: &[String]) -> Vec<String> {
    origins
        .iter()
        .filter_map(|origin| match Url::parse(origin) {
            Ok(url) if url.has_host() => Some(origin.trim_end_matches('/').to_owned()),
            _ => {
                warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn malformed_origins_are_dropped() {
        let origins = vec![
            "https://a.com/".to_owned(),
            "not an origin".to_owned(),
            "https://b.com".to_owned(),
        ];
        assert_eq!(valid_origins(&origins), vec!["https://a.com", "https://b.com"]);
    }

    #[rstest]
    #[case(&["https://a.com", "https://b.com"], "https://b.com", Some("https://b.com"))]
    #[case(&["https://a.com"], "https://evil.com", None)]
    #[case(&["*"], "https://anyone.dev", Some("https://anyone.dev"))]
    #[actix_web::test]
    async fn listed_origins_are_echoed(
        #[case] origins: &[&str],
        #[case] origin: &str,
        #[case] expected: Option<&str>,
    ) {
        let origins: Vec<String> = origins.iter().map(|o| (*o).to_owned()).collect();
        let app = actix_test::init_service(
            App::new()
                .wrap(cors_policy(&origins))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((ORIGIN, origin))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        let allowed = res
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok());
        assert_eq!(allowed, expected);
        if expected.is_some() {
            assert_eq!(res.status(), StatusCode::OK);
        }
    }
}
