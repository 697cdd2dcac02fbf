// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Read models behind the public pages
//!
//! Only published posts and projects are visible here. Singleton collections
//! (personal, settings, social, skills, contact) contribute their first record.

use crate::error::{ServerError, ServerResult};
use chrono::{DateTime, Utc};
use folio_api_contract::{
    collections, AboutPage, BlogArticle, BlogIndex, BlogIndexQuery, BlogPost, BlogSummary,
    ContactInfo, HomePage, PersonalInfo, Project, ProjectIndex, ProjectIndexQuery, SiteSettings,
    Skills, SocialLinks,
};
use folio_local_db::{Collection, Database, Query};
use std::collections::BTreeSet;

/// Posts shown on the home page
pub const LATEST_POSTS: usize = 3;

pub struct SiteService {
    blogs: Collection<BlogPost>,
    projects: Collection<Project>,
    personal: Collection<PersonalInfo>,
    settings: Collection<SiteSettings>,
    social: Collection<SocialLinks>,
    skills: Collection<Skills>,
    contact: Collection<ContactInfo>,
}

fn newest_first(published_at: Option<DateTime<Utc>>, created_at: DateTime<Utc>) -> std::cmp::Reverse<DateTime<Utc>> {
    std::cmp::Reverse(published_at.unwrap_or(created_at))
}

impl SiteService {
    pub fn new(db: &Database) -> Self {
        Self {
            blogs: db.typed(collections::BLOGS),
            projects: db.typed(collections::PROJECTS),
            personal: db.typed(collections::PERSONAL),
            settings: db.typed(collections::SETTINGS),
            social: db.typed(collections::SOCIAL),
            skills: db.typed(collections::SKILLS),
            contact: db.typed(collections::CONTACT),
        }
    }

    /// Published posts, most recently published first
    async fn published_posts(&self) -> ServerResult<Vec<BlogPost>> {
        let mut posts = self.blogs.find(&Query::new().filter("published", true)).await?;
        posts.sort_by_key(|p| newest_first(p.published_at, p.created_at));
        Ok(posts)
    }

    async fn published_projects(&self) -> ServerResult<Vec<Project>> {
        let mut projects = self
            .projects
            .find(&Query::new().filter("published", true))
            .await?;
        projects.sort_by_key(|p| newest_first(p.published_at, p.created_at));
        Ok(projects)
    }

    pub async fn home(&self) -> ServerResult<HomePage> {
        let featured_projects = self
            .published_projects()
            .await?
            .into_iter()
            .filter(|p| p.featured)
            .collect();
        let latest_posts = self
            .published_posts()
            .await?
            .iter()
            .take(LATEST_POSTS)
            .map(BlogSummary::from)
            .collect();

        Ok(HomePage {
            featured_projects,
            latest_posts,
            personal: self.personal.first().await?,
            settings: self.settings.first().await?,
            social: self.social.first().await?,
        })
    }

    pub async fn about(&self) -> ServerResult<AboutPage> {
        Ok(AboutPage {
            personal: self.personal.first().await?,
            skills: self.skills.first().await?,
            contact: self.contact.first().await?,
            settings: self.settings.first().await?,
        })
    }

    /// Published posts, optionally with one tag, plus every tag in use
    pub async fn blog_index(&self, query: &BlogIndexQuery) -> ServerResult<BlogIndex> {
        let all = self.published_posts().await?;
        let tags: BTreeSet<String> = all.iter().flat_map(|p| p.tags.iter().cloned()).collect();

        let posts = match query.tag.as_deref().filter(|t| !t.is_empty()) {
            Some(tag) => all
                .iter()
                .filter(|p| p.tags.iter().any(|t| t == tag))
                .map(BlogSummary::from)
                .collect(),
            None => all.iter().map(BlogSummary::from).collect(),
        };

        Ok(BlogIndex {
            posts,
            tags: tags.into_iter().collect(),
        })
    }

    pub async fn blog_post(&self, slug: &str) -> ServerResult<BlogArticle> {
        let query = Query::new().filter("slug", slug).filter("published", true);
        self.blogs
            .find(&query)
            .await?
            .into_iter()
            .next()
            .map(BlogArticle::from)
            .ok_or_else(|| ServerError::not_found("Blog post"))
    }

    /// Published projects with optional filters, plus every technology in use
    pub async fn project_index(&self, query: &ProjectIndexQuery) -> ServerResult<ProjectIndex> {
        let all = self.published_projects().await?;
        let technologies: BTreeSet<String> = all
            .iter()
            .flat_map(|p| p.technologies.iter().cloned())
            .collect();

        let technology = query.technology.as_deref().filter(|t| !t.is_empty());
        let projects = all
            .into_iter()
            .filter(|p| technology.map_or(true, |tech| p.technologies.iter().any(|t| t == tech)))
            .filter(|p| query.featured.map_or(true, |featured| p.featured == featured))
            .collect();

        Ok(ProjectIndex {
            projects,
            technologies: technologies.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_local_db::CollectionOptions;
    use serde_json::json;

    async fn seeded() -> Database {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let blogs = db.typed::<BlogPost>(collections::BLOGS);
        for (slug, published_at, tags) in [
            ("oldest", Some("2024-01-01T00:00:00.000Z"), vec!["rust"]),
            ("newest", Some("2024-06-01T00:00:00.000Z"), vec!["rust", "web"]),
            ("middle", Some("2024-03-01T00:00:00.000Z"), vec!["web"]),
            ("later", Some("2024-04-01T00:00:00.000Z"), vec![]),
            ("draft", None, vec!["secret"]),
        ] {
            blogs
                .create(&json!({
                    "title": slug,
                    "slug": slug,
                    "content": "word ".repeat(450),
                    "tags": tags,
                    "published": published_at.is_some(),
                    "publishedAt": published_at,
                }))
                .await
                .unwrap();
        }

        let projects = db.typed::<Project>(collections::PROJECTS);
        for (slug, featured, published, tech) in [
            ("cli", true, true, vec!["Rust"]),
            ("site", false, true, vec!["TypeScript", "Rust"]),
            ("wip", true, false, vec!["Go"]),
        ] {
            projects
                .create(&json!({
                    "title": slug,
                    "slug": slug,
                    "description": "d",
                    "featured": featured,
                    "published": published,
                    "technologies": tech,
                }))
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn home_shows_latest_published_posts_and_featured_projects() {
        let db = seeded().await;
        let home = SiteService::new(&db).home().await.unwrap();

        let slugs: Vec<_> = home.latest_posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["newest", "later", "middle"]);
        assert_eq!(home.latest_posts[0].reading_time_minutes, 3);

        let featured: Vec<_> = home.featured_projects.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(featured, vec!["cli"]);
        assert!(home.personal.is_none());
    }

    #[tokio::test]
    async fn blog_index_filters_by_tag() {
        let db = seeded().await;
        let site = SiteService::new(&db);

        let index = site.blog_index(&BlogIndexQuery::default()).await.unwrap();
        assert_eq!(index.posts.len(), 4);
        assert_eq!(index.tags, vec!["rust", "web"]);

        let rust = site
            .blog_index(&BlogIndexQuery {
                tag: Some("rust".into()),
            })
            .await
            .unwrap();
        let slugs: Vec<_> = rust.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["newest", "oldest"]);
    }

    #[tokio::test]
    async fn drafts_are_not_served_by_slug() {
        let db = seeded().await;
        let site = SiteService::new(&db);

        assert_eq!(site.blog_post("middle").await.unwrap().post.slug, "middle");
        let err = site.blog_post("draft").await.unwrap_err();
        assert_eq!(err.to_string(), "Blog post not found");
    }

    #[tokio::test]
    async fn project_index_filters() {
        let db = seeded().await;
        let site = SiteService::new(&db);

        let all = site.project_index(&ProjectIndexQuery::default()).await.unwrap();
        assert_eq!(all.projects.len(), 2);
        assert_eq!(all.technologies, vec!["Rust", "TypeScript"]);

        let ts = site
            .project_index(&ProjectIndexQuery {
                technology: Some("TypeScript".into()),
                featured: None,
            })
            .await
            .unwrap();
        assert_eq!(ts.projects.len(), 1);
        assert_eq!(ts.projects[0].slug, "site");

        let featured = site
            .project_index(&ProjectIndexQuery {
                technology: None,
                featured: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(featured.projects.len(), 1);
    }
}
