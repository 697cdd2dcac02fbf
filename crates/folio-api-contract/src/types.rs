// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Entity, request, and response types for the Folio REST API
//!
//! Entities mirror what the store holds. Request bodies keep every field
//! optional and skip absent ones when serialized, so the same type works as
//! a full create payload and as a shallow-merge patch.

use crate::validation::{
    validate_absolute_url, validate_contact_email, validate_simple_email,
    validate_skill_category,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Collection names used by the server
pub mod collections {
    pub const BLOGS: &str = "blogs";
    pub const PROJECTS: &str = "projects";
    pub const CONTACT: &str = "contact";
    pub const PERSONAL: &str = "personal";
    pub const SOCIAL: &str = "social";
    pub const SETTINGS: &str = "settings";
    pub const SKILLS: &str = "skills";
    pub const USERS: &str = "users";
    pub const MESSAGES: &str = "messages";
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A blog post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A portfolio project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub images: Vec<String>,
    pub technologies: Vec<String>,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public contact details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The site owner's profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub id: String,
    pub name: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub skills: Vec<String>,
    pub experience: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Social profile links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Brand colours of the site theme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

/// Site-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_colors: Option<ThemeColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_page_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Skills grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct Skills {
    pub id: String,
    pub languages: Vec<String>,
    pub frameworks_and_stack: Vec<String>,
    pub tools_and_services: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Skills {
    /// Skills of one category
    pub fn category(&self, category: SkillCategory) -> &[String] {
        match category {
            SkillCategory::Languages => &self.languages,
            SkillCategory::FrameworksAndStack => &self.frameworks_and_stack,
            SkillCategory::ToolsAndServices => &self.tools_and_services,
        }
    }

    pub fn category_mut(&mut self, category: SkillCategory) -> &mut Vec<String> {
        match category {
            SkillCategory::Languages => &mut self.languages,
            SkillCategory::FrameworksAndStack => &mut self.frameworks_and_stack,
            SkillCategory::ToolsAndServices => &mut self.tools_and_services,
        }
    }
}

/// The three skill categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum SkillCategory {
    Languages,
    FrameworksAndStack,
    ToolsAndServices,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 3] = [
        SkillCategory::Languages,
        SkillCategory::FrameworksAndStack,
        SkillCategory::ToolsAndServices,
    ];

    /// Name of the field holding this category
    pub fn field_name(&self) -> &'static str {
        match self {
            SkillCategory::Languages => "languages",
            SkillCategory::FrameworksAndStack => "frameworksAndStack",
            SkillCategory::ToolsAndServices => "toolsAndServices",
        }
    }
}

impl std::str::FromStr for SkillCategory {
    type Err = crate::ApiContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillCategory::ALL
            .into_iter()
            .find(|c| c.field_name() == s)
            .ok_or_else(|| crate::ApiContractError::InvalidSkillCategory(s.to_string()))
    }
}

/// Account role; every account is an administrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// A stored account, including its password hash
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    pub public_email: String,
    pub phone_number: String,
    pub location: String,
    pub profile_picture: String,
    pub bio: String,
    pub github_url: String,
    pub linkedin_url: String,
    pub x_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An account as returned by the API, without the password hash
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub public_email: String,
    pub phone_number: String,
    pub location: String,
    pub profile_picture: String,
    pub bio: String,
    pub github_url: String,
    pub linkedin_url: String,
    pub x_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            public_email: user.public_email,
            phone_number: user.phone_number,
            location: user.location,
            profile_picture: user.profile_picture,
            bio: user.bio,
            github_url: user.github_url,
            linkedin_url: user.linkedin_url,
            x_url: user.x_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// A message left through the public contact form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSubmission {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Create or update a blog post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BlogPostInput {
    #[validate(
        required(message = "Title and content are required"),
        length(min = 1, message = "Title and content are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[validate(
        required(message = "Title and content are required"),
        length(min = 1, message = "Title and content are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Create or update a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    #[validate(
        required(message = "Title and description are required"),
        length(min = 1, message = "Title and description are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[validate(
        required(message = "Title and description are required"),
        length(min = 1, message = "Title and description are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Create or update contact details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoInput {
    #[validate(
        required(message = "Email is required"),
        length(min = 1, message = "Email is required"),
        custom(function = "validate_simple_email", message = "Invalid email format")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<String>,
}

/// Create or update the owner's profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoInput {
    #[validate(
        required(message = "Name and bio are required"),
        length(min = 1, message = "Name and bio are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(
        required(message = "Name and bio are required"),
        length(min = 1, message = "Name and bio are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
}

/// Create or update social links; empty links are allowed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SocialLinksInput {
    #[validate(custom(function = "validate_absolute_url", message = "Invalid URL format for github"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[validate(custom(
        function = "validate_absolute_url",
        message = "Invalid URL format for linkedin"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[validate(custom(
        function = "validate_absolute_url",
        message = "Invalid URL format for twitter"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[validate(custom(function = "validate_absolute_url", message = "Invalid URL format for x"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[validate(custom(
        function = "validate_absolute_url",
        message = "Invalid URL format for instagram"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

/// Create or update site settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsInput {
    #[validate(
        required(message = "Title and description are required"),
        length(min = 1, message = "Title and description are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(
        required(message = "Title and description are required"),
        length(min = 1, message = "Title and description are required")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_colors: Option<ThemeColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_page_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file: Option<String>,
}

/// Replace all skill lists at once
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SkillsInput {
    #[validate(required(
        message = "Languages, frameworks/stack, and tools/services are required"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[validate(required(
        message = "Languages, frameworks/stack, and tools/services are required"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frameworks_and_stack: Option<Vec<String>>,
    #[validate(required(
        message = "Languages, frameworks/stack, and tools/services are required"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_and_services: Option<Vec<String>>,
}

/// Add or remove one skill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct SkillChange {
    #[validate(
        length(min = 1, message = "Category and skill are required"),
        custom(function = "validate_skill_category", message = "Invalid category")
    )]
    pub category: String,
    #[validate(length(min = 1, message = "Category and skill are required"))]
    pub skill: String,
}

/// Create an account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Email, password, and full name are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email, password, and full name are required"))]
    pub password: String,
    #[validate(length(min = 1, message = "Email, password, and full name are required"))]
    pub full_name: String,
    pub role: Option<UserRole>,
    pub public_email: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub x_url: Option<String>,
}

/// Update an account; a new password is hashed before storing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_url: Option<String>,
}

/// A message from the public contact form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ContactMessage {
    pub first_name: String,
    pub last_name: String,
    #[validate(custom(
        function = "validate_contact_email",
        message = "Please enter a valid email address"
    ))]
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Labels of the fields left blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("First Name", &self.first_name),
            ("Last Name", &self.last_name),
            ("Email", &self.email),
            ("Subject", &self.subject),
            ("Message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect()
    }
}

/// Credentials for the admin login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The identity carried by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

/// Successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

/// The current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user: SessionUser,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Plain confirmation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receipt for a contact form submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub id: String,
    pub message: String,
    pub delivered: bool,
    pub received_at: DateTime<Utc>,
}

/// A blog post as listed on the public site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time_minutes: u32,
}

impl From<&BlogPost> for BlogSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            cover_image: post.cover_image.clone(),
            tags: post.tags.clone(),
            published_at: post.published_at,
            reading_time_minutes: crate::validation::reading_time_minutes(&post.content),
        }
    }
}

/// A full blog post on the public site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BlogArticle {
    #[serde(flatten)]
    pub post: BlogPost,
    pub reading_time_minutes: u32,
}

impl From<BlogPost> for BlogArticle {
    fn from(post: BlogPost) -> Self {
        let reading_time_minutes = crate::validation::reading_time_minutes(&post.content);
        Self {
            post,
            reading_time_minutes,
        }
    }
}

/// Data behind the home page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub featured_projects: Vec<Project>,
    pub latest_posts: Vec<BlogSummary>,
    pub personal: Option<PersonalInfo>,
    pub settings: Option<SiteSettings>,
    pub social: Option<SocialLinks>,
}

/// Data behind the about page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct AboutPage {
    pub personal: Option<PersonalInfo>,
    pub skills: Option<Skills>,
    pub contact: Option<ContactInfo>,
    pub settings: Option<SiteSettings>,
}

/// Published posts and every tag in use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct BlogIndex {
    pub posts: Vec<BlogSummary>,
    pub tags: Vec<String>,
}

/// Published projects and every technology in use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ProjectIndex {
    pub projects: Vec<Project>,
    pub technologies: Vec<String>,
}

/// Filters for the public blog index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::IntoParams))]
pub struct BlogIndexQuery {
    pub tag: Option<String>,
}

/// Filters for the public project index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::IntoParams))]
pub struct ProjectIndexQuery {
    pub technology: Option<String>,
    pub featured: Option<bool>,
}
