// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Raw documents and the bookkeeping fields every record carries

use crate::error::{Error, Result};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

/// A stored record: one JSON object
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a record id of the form `<unix-millis>-<9 base36 chars>`
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Current time as an RFC 3339 UTC timestamp with millisecond precision
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Id of a document, if it has a string id
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Serialize any value into a document
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::NotAnObject),
    }
}

/// Stamp a new record with an id and both timestamps
///
/// A caller-supplied non-empty string id is kept.
pub fn stamp_new(mut doc: Document) -> Document {
    let has_id = document_id(&doc).is_some_and(|id| !id.is_empty());
    if !has_id {
        doc.insert(ID_FIELD.to_string(), Value::String(generate_id()));
    }
    let now = timestamp();
    doc.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
    doc.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));
    doc
}

/// Shallow-merge `patch` over `existing`
///
/// `id` and `createdAt` in the patch are ignored and `updatedAt` is refreshed.
pub fn merge_update(existing: &Document, mut patch: Document) -> Document {
    patch.remove(ID_FIELD);
    patch.remove(CREATED_AT_FIELD);

    let mut merged = existing.clone();
    merged.extend(patch);
    merged.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp()));
    merged
}

/// The write a uniqueness check guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueCheck<'a> {
    /// Every present value must be unused, null and empty strings included
    Create,
    /// Null and empty values are skipped, as is the record with this id
    Update(&'a str),
}

/// Find the first unique field of `candidate` that collides with another record
pub fn find_duplicate<'a, I>(
    existing: I,
    candidate: &Document,
    unique_fields: &[String],
    check: UniqueCheck<'_>,
) -> Option<Error>
where
    I: IntoIterator<Item = &'a Document>,
    I::IntoIter: Clone,
{
    let existing = existing.into_iter();
    for field in unique_fields {
        let Some(value) = candidate.get(field) else {
            continue;
        };
        let excluded = match check {
            UniqueCheck::Create => None,
            UniqueCheck::Update(_) if !is_unique_candidate(value) => continue,
            UniqueCheck::Update(id) => Some(id),
        };

        let clash = existing.clone().any(|doc| {
            excluded.map_or(true, |excluded| document_id(doc) != Some(excluded))
                && doc.get(field) == Some(value)
        });
        if clash {
            return Some(Error::Duplicate {
                field: field.clone(),
                value: display_value(value),
            });
        }
    }
    None
}

fn is_unique_candidate(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
