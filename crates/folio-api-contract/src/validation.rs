// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Validation helpers and content derivations shared by server and clients

use crate::types::SkillCategory;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use validator::{ValidationError, ValidationErrors};

/// Excerpts longer than this many characters are truncated
pub const EXCERPT_LENGTH: usize = 160;

/// Reading speed used for reading-time estimates
pub const WORDS_PER_MINUTE: usize = 200;

fn simple_email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn contact_email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("valid email regex")
    })
}

/// Loose `local@domain.tld` check used for stored contact details
pub fn is_simple_email(email: &str) -> bool {
    simple_email_regex().is_match(email)
}

/// Stricter check for addresses typed into the contact form
///
/// Surrounding whitespace is ignored.
pub fn is_valid_contact_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && contact_email_regex().is_match(email)
}

pub fn validate_simple_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || is_simple_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

pub fn validate_contact_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_contact_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Empty strings pass; anything else must parse as an absolute URL
pub fn validate_absolute_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || url::Url::parse(value).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

/// Empty strings pass so that the required-field message wins
pub fn validate_skill_category(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.parse::<SkillCategory>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("category"))
    }
}

/// Messages per field, sorted by field name
pub fn field_messages(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// A single human-readable message
///
/// Fields are visited in name order so the result is stable.
pub fn first_message(errors: &ValidationErrors) -> String {
    let messages = field_messages(errors);
    let mut fields: Vec<&String> = messages.keys().collect();
    fields.sort();
    fields
        .into_iter()
        .find_map(|field| messages[field].first().cloned())
        .unwrap_or_else(|| "Invalid request".to_string())
}

/// Plain-text excerpt of markdown content
///
/// Heading, emphasis, and code markers become spaces; the result is cut at
/// [`EXCERPT_LENGTH`] characters with `...` appended when cut.
pub fn generate_excerpt(content: &str) -> String {
    let plain: String = content
        .chars()
        .map(|c| match c {
            '#' | '*' | '`' | '\n' => ' ',
            other => other,
        })
        .collect();
    let plain = plain.trim();

    if plain.chars().count() > EXCERPT_LENGTH {
        let cut: String = plain.chars().take(EXCERPT_LENGTH).collect();
        format!("{}...", cut)
    } else {
        plain.to_string()
    }
}

/// URL slug derived from a title
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let mapped = match c {
            'a'..='z' | '0'..='9' => c,
            '-' => '-',
            c if c.is_whitespace() => '-',
            _ => continue,
        };
        if mapped == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(mapped);
    }
    slug
}

/// Estimated minutes to read `content`, never less than one
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
