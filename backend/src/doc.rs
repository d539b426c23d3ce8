//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every mini-program handler and the health probes,
//! plus the card and error schemas they reference. Swagger UI serves it in
//! debug builds.

use crate::domain::{CardProfile, Error, ErrorCode, ProfilePatch, UserId, UserRecord};
use utoipa::OpenApi;

/// OpenAPI document for the HTTP API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Business card mini-program API",
        description = "WeChat login, card storage and card QR codes for the mini-program."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::cards::login,
        crate::inbound::http::cards::get_id,
        crate::inbound::http::cards::get_card,
        crate::inbound::http::cards::check_card,
        crate::inbound::http::cards::set_card,
        crate::inbound::http::cards::add_card,
        crate::inbound::http::cards::update_card,
        crate::inbound::http::cards::get_code,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(UserId, CardProfile, ProfilePatch, UserRecord, Error, ErrorCode)),
    tags(
        (name = "cards", description = "Mini-program session and card operations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
