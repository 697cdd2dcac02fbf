// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! CRUD over the content collections
//!
//! Each collection is described by a [`Resource`]: its stored entity, its
//! request body, and the hooks that derive fields before a write.

use crate::error::{ServerError, ServerResult};
use crate::services::single_field;
use chrono::{DateTime, Utc};
use folio_api_contract::{
    collections,
    validation::{generate_excerpt, slugify},
    BlogPost, BlogPostInput, ContactInfo, ContactInfoInput, PersonalInfo, PersonalInfoInput,
    Project, ProjectInput, SiteSettings, SiteSettingsInput, Skills, SkillsInput, SocialLinks,
    SocialLinksInput,
};
use folio_local_db::{document::to_document, Collection, Database, Document};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::info;
use validator::Validate;

/// A content collection exposed over the API
pub trait Resource: Send + Sync + 'static {
    type Entity: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Input: Serialize + DeserializeOwned + Validate + Send + Sync + 'static;

    const COLLECTION: &'static str;

    /// Used in `<Label> not found` and `<Label> deleted successfully`
    const LABEL: &'static str;

    /// Whether a lookup by id falls back to the `slug` field
    const LOOKUP_BY_SLUG: bool = false;

    /// Derive fields of a new record
    fn prepare_create(_doc: &mut Document) {}

    /// Derive fields of an update patch
    fn prepare_update(_existing: &Self::Entity, _patch: &mut Document) {}
}

/// Generic CRUD for one [`Resource`]
pub struct ContentService<R: Resource> {
    items: Collection<R::Entity>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ContentService<R> {
    pub fn new(db: &Database) -> Self {
        Self {
            items: db.typed(R::COLLECTION),
            _resource: PhantomData,
        }
    }

    fn not_found() -> ServerError {
        ServerError::not_found(R::LABEL)
    }

    pub async fn list(&self) -> ServerResult<Vec<R::Entity>> {
        Ok(self.items.find_all().await?)
    }

    pub async fn get(&self, id: &str) -> ServerResult<R::Entity> {
        if let Some(item) = self.items.find_by_id(id).await? {
            return Ok(item);
        }
        if R::LOOKUP_BY_SLUG {
            if let Some(item) = self.items.find_one(&single_field("slug", id)).await? {
                return Ok(item);
            }
        }
        Err(Self::not_found())
    }

    pub async fn create(&self, input: &R::Input) -> ServerResult<R::Entity> {
        input.validate()?;
        let mut doc = to_document(input)?;
        R::prepare_create(&mut doc);
        let created = self.items.create_document(doc).await?;
        info!(collection = R::COLLECTION, "Record created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, input: &R::Input) -> ServerResult<R::Entity> {
        input.validate()?;
        let existing = self.items.find_by_id(id).await?.ok_or_else(Self::not_found)?;
        let mut patch = to_document(input)?;
        R::prepare_update(&existing, &mut patch);
        self.items
            .update_document(id, patch)
            .await?
            .ok_or_else(Self::not_found)
    }

    /// Delete a record, returning the confirmation message
    pub async fn delete(&self, id: &str) -> ServerResult<String> {
        if !self.items.delete(id).await? {
            return Err(Self::not_found());
        }
        info!(collection = R::COLLECTION, id, "Record deleted");
        Ok(format!("{} deleted successfully", R::LABEL))
    }
}

fn is_blank(doc: &Document, field: &str) -> bool {
    match doc.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn now_value() -> Value {
    Value::String(folio_local_db::timestamp())
}

/// Fill `slug` from `title` when no slug was given
fn derive_slug(doc: &mut Document) {
    if is_blank(doc, "slug") {
        if let Some(title) = doc.get("title").and_then(Value::as_str) {
            let slug = slugify(title);
            doc.insert("slug".to_string(), Value::String(slug));
        }
    }
}

/// Fill `excerpt` from `content` when no excerpt was given
fn derive_excerpt(doc: &mut Document) {
    if is_blank(doc, "excerpt") {
        if let Some(content) = doc.get("content").and_then(Value::as_str) {
            let excerpt = generate_excerpt(content);
            doc.insert("excerpt".to_string(), Value::String(excerpt));
        }
    }
}

/// A published record without a publication date is published now
fn stamp_publication(doc: &mut Document) {
    let published = doc.get("published").and_then(Value::as_bool).unwrap_or(false);
    if published && is_blank(doc, "publishedAt") {
        doc.insert("publishedAt".to_string(), now_value());
    }
}

/// Publication changes in an update patch
///
/// Publishing a record that was never published stamps it now; unpublishing
/// clears the date. A patch that does not mention `published` keeps both.
fn apply_publish_change(existing_published_at: Option<DateTime<Utc>>, patch: &mut Document) {
    match patch.get("published").and_then(Value::as_bool) {
        Some(true) => {
            if existing_published_at.is_none() && is_blank(patch, "publishedAt") {
                patch.insert("publishedAt".to_string(), now_value());
            }
        }
        Some(false) => {
            patch.insert("publishedAt".to_string(), Value::Null);
        }
        None => {}
    }
}

pub struct Blogs;

impl Resource for Blogs {
    type Entity = BlogPost;
    type Input = BlogPostInput;
    const COLLECTION: &'static str = collections::BLOGS;
    const LABEL: &'static str = "Blog";

    fn prepare_create(doc: &mut Document) {
        derive_slug(doc);
        derive_excerpt(doc);
        stamp_publication(doc);
    }

    fn prepare_update(existing: &BlogPost, patch: &mut Document) {
        derive_excerpt(patch);
        apply_publish_change(existing.published_at, patch);
    }
}

pub struct Projects;

impl Resource for Projects {
    type Entity = Project;
    type Input = ProjectInput;
    const COLLECTION: &'static str = collections::PROJECTS;
    const LABEL: &'static str = "Project";
    const LOOKUP_BY_SLUG: bool = true;

    fn prepare_create(doc: &mut Document) {
        derive_slug(doc);
        stamp_publication(doc);
    }

    fn prepare_update(existing: &Project, patch: &mut Document) {
        apply_publish_change(existing.published_at, patch);
    }
}

pub struct Contact;

impl Resource for Contact {
    type Entity = ContactInfo;
    type Input = ContactInfoInput;
    const COLLECTION: &'static str = collections::CONTACT;
    const LABEL: &'static str = "Contact info";
}

pub struct Personal;

impl Resource for Personal {
    type Entity = PersonalInfo;
    type Input = PersonalInfoInput;
    const COLLECTION: &'static str = collections::PERSONAL;
    const LABEL: &'static str = "Personal info";
}

pub struct Social;

impl Resource for Social {
    type Entity = SocialLinks;
    type Input = SocialLinksInput;
    const COLLECTION: &'static str = collections::SOCIAL;
    const LABEL: &'static str = "Social links";
}

pub struct Settings;

impl Resource for Settings {
    type Entity = SiteSettings;
    type Input = SiteSettingsInput;
    const COLLECTION: &'static str = collections::SETTINGS;
    const LABEL: &'static str = "Settings";
}

pub struct SkillSets;

impl Resource for SkillSets {
    type Entity = Skills;
    type Input = SkillsInput;
    const COLLECTION: &'static str = collections::SKILLS;
    const LABEL: &'static str = "Skills";
}
