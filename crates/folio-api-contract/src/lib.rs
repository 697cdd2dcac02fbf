// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Folio REST API contract types and validation
//!
//! These types are shared between the server, its tests, and any client that
//! wants typed access to the API.

pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;

/// Generate OpenAPI schema for the API contract types
#[cfg(feature = "utoipa")]
pub fn openapi_schema() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi;
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Folio REST API"),
        paths(),
        components(schemas(
            BlogPost,
            Project,
            ContactInfo,
            PersonalInfo,
            SocialLinks,
            ThemeColors,
            SiteSettings,
            Skills,
            SkillCategory,
            UserRole,
            PublicUser,
            ContactSubmission,
            BlogPostInput,
            ProjectInput,
            ContactInfoInput,
            PersonalInfoInput,
            SocialLinksInput,
            SiteSettingsInput,
            SkillsInput,
            SkillChange,
            CreateUserRequest,
            UpdateUserRequest,
            ContactMessage,
            LoginRequest,
            SessionUser,
            LoginResponse,
            SessionInfo,
            MessageResponse,
            ContactReceipt,
            BlogSummary,
            BlogArticle,
            HomePage,
            AboutPage,
            BlogIndex,
            ProjectIndex,
            ProblemDetails
        ))
    )]
    struct ApiDoc;
    ApiDoc::openapi()
}

#[cfg(all(test, feature = "utoipa"))]
mod tests {
    #[test]
    fn openapi_schema_lists_contract_types() {
        let schema = super::openapi_schema();
        let components = schema.components.expect("components");
        for name in ["BlogPost", "Project", "PublicUser", "ProblemDetails", "HomePage"] {
            assert!(components.schemas.contains_key(name), "missing {name}");
        }
        assert_eq!(schema.info.title, "Folio REST API");
    }
}
