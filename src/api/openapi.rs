//! OpenAPI document for the HTTP surface, served by the swagger UI.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::register::register,
        crate::api::handlers::login::login,
        crate::api::handlers::face::upload_face,
        crate::api::handlers::face::compare_face,
        crate::api::handlers::face::delete_face,
        crate::api::handlers::users::profile,
        crate::api::handlers::users::update_name,
        crate::api::handlers::users::logins,
        crate::api::handlers::users::list_users,
        crate::api::handlers::support::ask,
    ),
    components(schemas(
        crate::api::error::ErrorBody,
        crate::api::handlers::MessageResponse,
        crate::api::handlers::UserProfile,
        crate::api::handlers::register::RegisterRequest,
        crate::api::handlers::register::RegisterResponse,
        crate::api::handlers::login::LoginRequest,
        crate::api::handlers::login::LoginResponse,
        crate::api::handlers::face::FaceImageRequest,
        crate::api::handlers::users::UpdateNameRequest,
        crate::api::handlers::support::SupportRequest,
        crate::api::handlers::support::SupportResponse,
        crate::store::UserSummary,
        crate::store::LoginEvent,
        crate::store::LoginMethod,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and password login"),
        (name = "face", description = "Face enrollment and verification"),
        (name = "users", description = "Profile and login history"),
        (name = "support", description = "Support assistant proxy"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
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
