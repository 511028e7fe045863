//! OpenAPI/Utoipa configuration.

use crate::api::health::MISC_TAG;
use crate::oauth::AUTH_TAG;
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CMS OAuth Bridge API",
        version = "1.0.0",
        description = "GitHub OAuth authorization-code bridge for the catalog's content management client."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = AUTH_TAG, description = "GitHub sign-in for the CMS client")
    )
)]
pub struct ApiDoc;
