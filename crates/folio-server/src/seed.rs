// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Default content for a fresh installation

use crate::config::AdminAccount;
use crate::services::UserService;
use anyhow::Context;
use folio_api_contract::{collections, PublicUser};
use folio_local_db::{timestamp, Database};
use serde_json::{json, Value};
use tracing::info;

/// Which collections `init_database` filled and which it left alone
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub seeded: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

fn default_records() -> Vec<(&'static str, Value)> {
    let now = timestamp();
    vec![
        (
            collections::CONTACT,
            json!({
                "email": "hello@example.com",
                "phone": "+1 (555) 123-4567",
                "location": "Your City, Country",
                "businessHours": "Monday - Friday, 9 AM - 6 PM",
            }),
        ),
        (
            collections::PERSONAL,
            json!({
                "name": "Your Name",
                "bio": "Full-stack developer who enjoys building fast, reliable web applications.",
                "profilePicture": "/images/profile.jpg",
                "skills": ["Rust", "TypeScript", "React", "PostgreSQL", "Docker"],
                "experience": "Several years of building and running web services.",
            }),
        ),
        (
            collections::SOCIAL,
            json!({
                "github": "https://github.com/yourusername",
                "linkedin": "https://linkedin.com/in/yourusername",
                "x": "https://x.com/yourusername",
                "instagram": "https://instagram.com/yourusername",
            }),
        ),
        (
            collections::SETTINGS,
            json!({
                "title": "Portfolio",
                "description": "Personal portfolio and blog.",
                "favicon": "/favicon.ico",
                "themeColors": {
                    "primary": "#3b82f6",
                    "secondary": "#64748b",
                    "accent": "#06b6d4",
                },
                "aboutPageContent": "Welcome to my portfolio!",
                "resumeFile": "/files/resume.pdf",
            }),
        ),
        (
            collections::BLOGS,
            json!({
                "title": "Welcome to My Blog",
                "slug": "welcome-to-my-blog",
                "content": "# Welcome to My Blog\n\nThis is the first post. More notes on software, tools, and projects will follow.",
                "excerpt": "The first post on this blog.",
                "coverImage": "/images/blog/welcome-cover.jpg",
                "tags": ["welcome", "introduction"],
                "published": true,
                "publishedAt": now,
            }),
        ),
        (
            collections::SKILLS,
            json!({
                "languages": ["Rust", "TypeScript", "Python"],
                "frameworksAndStack": ["Axum", "React", "Next.js"],
                "toolsAndServices": ["Docker", "Git", "PostgreSQL"],
            }),
        ),
        (
            collections::PROJECTS,
            json!({
                "title": "Portfolio Website",
                "slug": "portfolio-website",
                "description": "This site: a portfolio with a blog and an admin panel.",
                "content": "# Portfolio Website\n\nA portfolio backed by a small document store.",
                "coverImage": "/images/projects/portfolio-cover.jpg",
                "images": [],
                "technologies": ["Rust", "Axum", "React"],
                "featured": true,
                "githubUrl": "https://github.com/yourusername/portfolio",
                "published": true,
                "publishedAt": now,
            }),
        ),
    ]
}

/// Write the default record into every empty content collection
pub async fn init_database(db: &Database) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for (name, record) in default_records() {
        let store = db.collection(name);
        if store.count(None).await? > 0 {
            info!(collection = name, "Skipping collection that already has data");
            report.skipped.push(name);
            continue;
        }

        let Value::Object(doc) = record else {
            anyhow::bail!("Default record for {} is not an object", name);
        };
        store
            .create(doc)
            .await
            .with_context(|| format!("Failed to seed {}", name))?;
        info!(collection = name, "Seeded collection");
        report.seeded.push(name);
    }

    Ok(report)
}

/// Create the configured administrator account if it does not exist yet
pub async fn setup_admin(db: &Database, admin: &AdminAccount) -> anyhow::Result<Option<PublicUser>> {
    UserService::new(db)
        .ensure_admin(admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin user: {}", e))
}
