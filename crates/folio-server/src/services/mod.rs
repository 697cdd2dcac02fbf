// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Business logic between the HTTP handlers and the store

pub mod contact;
pub mod content;
pub mod site;
pub mod skills;
pub mod users;

pub use contact::ContactService;
pub use content::{ContentService, Resource};
pub use site::SiteService;
pub use skills::SkillsService;
pub use users::UserService;

use folio_local_db::Document;
use serde_json::Value;

/// A document holding one field, used as an equality filter or a patch
pub fn single_field(field: &str, value: impl Into<Value>) -> Document {
    let mut doc = Document::new();
    doc.insert(field.to_string(), value.into());
    doc
}
