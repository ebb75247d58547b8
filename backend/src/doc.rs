//! OpenAPI document for the HTTP surface.
//!
//! The static [`ApiDoc`] registers every documented route. [`openapi_for`]
//! stamps the runtime project name and version onto it before it is served
//! at `{API_V1_STR}/openapi.json`.

use utoipa::OpenApi;

use crate::domain::{DependencyStatus, HealthSnapshot};
use crate::inbound::http::health::{HealthReport, RootBanner};
use crate::settings::Settings;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PentryPal API",
        description = "Collaborative grocery and pantry management backend.",
        license(name = "MIT License", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Development server")
    ),
    paths(
        crate::inbound::http::health::root,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(RootBanner, HealthReport, HealthSnapshot, DependencyStatus)),
    tags(
        (name = "meta", description = "Service metadata"),
        (name = "health", description = "Health report and orchestration probes")
    )
)]
pub struct ApiDoc;

/// [`ApiDoc`] with the configured title and version.
pub fn openapi_for(settings: &Settings) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title.clone_from(&settings.project_name);
    doc.info.version.clone_from(&settings.project_version);
    doc
}
