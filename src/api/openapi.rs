//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, get, web};
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OurCalendar Server",
        version = "0.1.0",
        description = "API server for shared family and group calendars"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        api::auth::google_sign_in,
        api::auth::line_sign_in,
        // User endpoints
        api::users::get_me,
        api::users::update_me,
        // Group endpoints
        api::groups::list_groups,
        api::groups::create_group,
        api::groups::get_group,
        api::groups::update_group,
        api::groups::delete_group,
        api::groups::join_group,
        api::groups::leave_group,
        api::groups::list_members,
        api::groups::remove_member,
        // Event endpoints
        api::events::list_events,
        api::events::create_event,
        api::events::get_event,
        api::events::update_event,
        api::events::delete_event,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            api::health::ReadyResponse,
            // Users
            models::User,
            models::UpdateUserRequest,
            models::AuthRequest,
            models::AuthResponse,
            // Groups
            models::MemberRole,
            models::Group,
            models::GroupMember,
            models::GroupWithRole,
            models::GroupDetail,
            models::CreateGroupRequest,
            models::UpdateGroupRequest,
            models::JoinGroupRequest,
            // Events
            models::Event,
            models::CreateEventRequest,
            models::UpdateEventRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Sign-in with Google or LINE"),
        (name = "Users", description = "The signed-in user's profile"),
        (name = "Groups", description = "Groups, invite codes and memberships"),
        (name = "Events", description = "Calendar events")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer session token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serve the OpenAPI document as JSON.
#[get("/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(openapi_json);
}
