//! Host header allow-list.
//!
//! Requests whose `Host` does not match the allow-list are answered with
//! `400 Invalid host header`. A `*` entry accepts any host; `*.example.com`
//! accepts subdomains of `example.com`. The port is ignored.

use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::HOST;
use actix_web::{Error, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::warn;

/// Middleware rejecting requests for hosts outside the allow-list.
#[derive(Clone, Debug)]
pub struct TrustedHost {
    allowed: Arc<[String]>,
}

impl TrustedHost {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|host| host.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether `host` (with or without a port) is allowed.
    pub fn allows(&self, host: &str) -> bool {
        let host = strip_port(host).to_ascii_lowercase();
        self.allowed.iter().any(|pattern| {
            if pattern == "*" {
                return true;
            }
            match pattern.strip_prefix("*.") {
                Some(suffix) => host
                    .strip_suffix(suffix)
                    .is_some_and(|prefix| prefix.ends_with('.')),
                None => *pattern == host,
            }
        })
    }

    fn allows_any(&self) -> bool {
        self.allowed.iter().any(|pattern| pattern == "*")
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.split_inclusive(']').next().unwrap_or(host);
    }
    host.split(':').next().unwrap_or(host)
}

fn request_host(req: &ServiceRequest) -> String {
    req.headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| req.connection_info().host().to_owned())
}

impl<S, B> Transform<S, ServiceRequest> for TrustedHost
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TrustedHostMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustedHostMiddleware {
            service,
            policy: self.clone(),
        }))
    }
}

/// Service produced by [`TrustedHost`].
pub struct TrustedHostMiddleware<S> {
    service: S,
    policy: TrustedHost,
}

impl<S, B> Service<ServiceRequest> for TrustedHostMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.policy.allows_any() {
            let host = request_host(&req);
            if !self.policy.allows(&host) {
                warn!(%host, "rejected request for untrusted host");
                let response = HttpResponse::BadRequest().body("Invalid host header");
                let res = req.into_response(response).map_into_right_body();
                return Box::pin(async move { Ok(res) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["*"], "anything.example:8000", true)]
    #[case(&["localhost", "127.0.0.1"], "localhost:8000", true)]
    #[case(&["localhost", "127.0.0.1"], "127.0.0.1", true)]
    #[case(&["localhost", "127.0.0.1"], "evil.example", false)]
    #[case(&["*.pantry.example"], "api.pantry.example", true)]
    #[case(&["*.pantry.example"], "pantry.example", false)]
    #[case(&["*.pantry.example"], "evilpantry.example", false)]
    #[case(&["LocalHost"], "LOCALHOST", true)]
    fn hosts_match_the_allow_list(
        #[case] allowed: &[&str],
        #[case] host: &str,
        #[case] expected: bool,
    ) {
        let policy = TrustedHost::new(allowed.iter().copied());
        assert_eq!(policy.allows(host), expected);
    }

    #[rstest]
    #[case("localhost:8000", StatusCode::OK)]
    #[case("evil.example", StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn untrusted_hosts_get_400(#[case] host: &str, #[case] expected: StatusCode) {
        let app = actix_test::init_service(
            App::new()
                .wrap(TrustedHost::new(["localhost", "127.0.0.1"]))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((HOST, host))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), expected);
    }
}
