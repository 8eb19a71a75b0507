use utoipa::OpenApi;

use super::handlers::{auth, health, organizations, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::list_users,
        users::get_user,
        organizations::list_organizations,
        organizations::create_organization,
        organizations::get_organization,
        auth::register::register,
        auth::login::login,
        auth::session::refresh,
        auth::session::logout,
        auth::csrf::issue_csrf,
        auth::verify::verify_email,
        auth::verify::reset_password,
        auth::verify::verify_reset_password,
    ),
    components(schemas(
        health::Health,
        users::UserSummary,
        users::UserDetail,
        organizations::OrganizationRecord,
        organizations::OrganizationCreateRequest,
        auth::types::LoginRequest,
        auth::types::RegisterRequest,
        auth::types::RegisterResponse,
        auth::types::TokenResponse,
        auth::types::VerifyEmailRequest,
        auth::types::ResetPasswordRequest,
        auth::types::ResetPasswordRedeemRequest,
        auth::types::CsrfResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Credentials, sessions, and verification tokens"),
        (name = "users", description = "User views"),
        (name = "organizations", description = "Organization management")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_the_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/auth/login"));
        assert!(paths.contains_key("/auth/register"));
        assert!(paths.contains_key("/auth/token/refresh"));
        assert!(paths.contains_key("/auth/verify/reset-password"));
        assert!(paths.contains_key("/organization/{id}"));
    }

    #[test]
    fn openapi_tags_are_present() {
        let doc = ApiDoc::openapi();
        let tags = doc.tags.unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "health"));
    }
}
