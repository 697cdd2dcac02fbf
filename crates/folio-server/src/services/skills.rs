// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Adding and removing single skills
//!
//! The site shows the first skills record only, so both operations work on
//! that record. Each holds the collection's write lock from read to write.

use crate::error::{ServerError, ServerResult};
use crate::services::single_field;
use folio_api_contract::{collections, SkillCategory, SkillChange, Skills};
use folio_local_db::{Collection, Database};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use validator::Validate;

pub struct SkillsService {
    skills: Collection<Skills>,
    write_lock: Arc<Mutex<()>>,
}

impl SkillsService {
    pub fn new(db: &Database) -> Self {
        Self {
            skills: db.typed(collections::SKILLS),
            write_lock: db.write_lock(collections::SKILLS),
        }
    }

    fn parse(change: &SkillChange) -> ServerResult<SkillCategory> {
        change.validate()?;
        Ok(change.category.parse::<SkillCategory>()?)
    }

    /// Add a skill, creating an empty record first when none exists
    ///
    /// A skill already in the category is left alone.
    pub async fn add(&self, change: &SkillChange) -> ServerResult<Skills> {
        let category = Self::parse(change)?;
        let _guard = self.write_lock.lock().await;

        let mut record = match self.skills.first().await? {
            Some(record) => record,
            None => {
                self.skills
                    .create(&json!({
                        "languages": [],
                        "frameworksAndStack": [],
                        "toolsAndServices": [],
                    }))
                    .await?
            }
        };

        if record.category(category).contains(&change.skill) {
            debug!(skill = %change.skill, "Skill already present");
            return Ok(record);
        }
        record.category_mut(category).push(change.skill.clone());
        self.store_category(&record, category).await
    }

    /// Remove a skill from its category
    pub async fn remove(&self, change: &SkillChange) -> ServerResult<Skills> {
        let category = Self::parse(change)?;
        let _guard = self.write_lock.lock().await;

        let mut record = self
            .skills
            .first()
            .await?
            .ok_or_else(|| ServerError::NotFound("No skills found".to_string()))?;

        let list = record.category_mut(category);
        let Some(index) = list.iter().position(|s| s == &change.skill) else {
            return Ok(record);
        };
        list.remove(index);
        self.store_category(&record, category).await
    }

    async fn store_category(&self, record: &Skills, category: SkillCategory) -> ServerResult<Skills> {
        let patch = single_field(category.field_name(), json!(record.category(category)));
        self.skills
            .update_document(&record.id, patch)
            .await?
            .ok_or_else(|| ServerError::NotFound("No skills found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_local_db::CollectionOptions;

    fn change(category: &str, skill: &str) -> SkillChange {
        SkillChange {
            category: category.into(),
            skill: skill.into(),
        }
    }

    #[tokio::test]
    async fn add_creates_record_and_ignores_duplicates() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let service = SkillsService::new(&db);

        let skills = service.add(&change("languages", "Rust")).await.unwrap();
        assert_eq!(skills.languages, vec!["Rust"]);
        assert!(skills.tools_and_services.is_empty());

        let skills = service.add(&change("languages", "Rust")).await.unwrap();
        assert_eq!(skills.languages, vec!["Rust"]);

        let skills = service.add(&change("toolsAndServices", "Docker")).await.unwrap();
        assert_eq!(skills.tools_and_services, vec!["Docker"]);
        assert_eq!(skills.languages, vec!["Rust"]);
    }

    #[tokio::test]
    async fn remove_requires_a_record() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let service = SkillsService::new(&db);

        let err = service.remove(&change("languages", "Rust")).await.unwrap_err();
        assert_eq!(err.to_string(), "No skills found");

        service.add(&change("languages", "Rust")).await.unwrap();
        service.add(&change("languages", "Go")).await.unwrap();
        let skills = service.remove(&change("languages", "Rust")).await.unwrap();
        assert_eq!(skills.languages, vec!["Go"]);

        let unchanged = service.remove(&change("languages", "Perl")).await.unwrap();
        assert_eq!(unchanged.languages, vec!["Go"]);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let err = SkillsService::new(&db)
            .add(&change("hobbies", "Chess"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
        assert_eq!(err.to_problem().detail, "Invalid category");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_keep_every_skill() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_json_dir(dir.path(), CollectionOptions::default());

        let mut tasks = Vec::new();
        for i in 0..20 {
            let service = SkillsService::new(&db);
            tasks.push(tokio::spawn(async move {
                service.add(&change("languages", &format!("lang-{i}"))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let records = db.typed::<Skills>(collections::SKILLS).find_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].languages.len(), 20);

        let service = SkillsService::new(&db);
        let mut removals = Vec::new();
        for i in 0..10 {
            let service = SkillsService::new(&db);
            removals.push(tokio::spawn(async move {
                service.remove(&change("languages", &format!("lang-{i}"))).await
            }));
        }
        for task in removals {
            task.await.unwrap().unwrap();
        }
        let left = service.add(&change("languages", "lang-19")).await.unwrap();
        assert_eq!(left.languages.len(), 10);
    }
}
