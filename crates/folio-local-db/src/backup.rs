// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Timestamped copies of JSON data files
//!
//! A backup of `blogs.json` is `blogs.json.backup-<unix-millis>` in the same
//! directory. Only the newest few are kept.

use crate::error::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const BACKUP_MARKER: &str = ".backup-";

/// Copy `path` to a fresh backup and prune old ones
///
/// Returns `None` when there is nothing to back up or backups are disabled.
pub async fn create_backup(path: &Path, keep: usize) -> Result<Option<PathBuf>> {
    if keep == 0 || !fs::try_exists(path).await? {
        return Ok(None);
    }

    let backup = backup_path(path, Utc::now().timestamp_millis());
    fs::copy(path, &backup).await?;
    debug!(file = %path.display(), backup = %backup.display(), "Created backup");

    prune_backups(path, keep).await?;
    Ok(Some(backup))
}

/// Backups of `path`, newest first
pub async fn list_backups(path: &Path) -> Result<Vec<PathBuf>> {
    let Some(dir) = path.parent() else {
        return Ok(Vec::new());
    };
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{}{}", file_name, BACKUP_MARKER);

    let mut backups: Vec<(i64, PathBuf)> = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(stamp) = name
            .to_str()
            .and_then(|n| n.strip_prefix(&prefix))
            .and_then(|s| s.parse::<i64>().ok())
        else {
            continue;
        };
        backups.push((stamp, entry.path()));
    }

    backups.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Delete all but the newest `keep` backups of `path`
pub async fn prune_backups(path: &Path, keep: usize) -> Result<usize> {
    let stale: Vec<PathBuf> = list_backups(path).await?.into_iter().skip(keep).collect();
    for backup in &stale {
        fs::remove_file(backup).await?;
    }
    Ok(stale.len())
}

fn backup_path(path: &Path, millis: i64) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!("{}{}", BACKUP_MARKER, millis));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_only_newest_backups() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blogs.json");
        fs::write(&file, "[]").await.unwrap();

        for millis in [1_000, 3_000, 2_000, 5_000, 4_000] {
            fs::write(backup_path(&file, millis), "[]").await.unwrap();
        }
        fs::write(dir.path().join("projects.json.backup-9000"), "[]").await.unwrap();

        let removed = prune_backups(&file, 3).await.unwrap();
        assert_eq!(removed, 2);

        let remaining = list_backups(&file).await.unwrap();
        assert_eq!(
            remaining,
            vec![
                backup_path(&file, 5_000),
                backup_path(&file, 4_000),
                backup_path(&file, 3_000)
            ]
        );
        assert!(dir.path().join("projects.json.backup-9000").exists());
    }

    #[tokio::test]
    async fn missing_file_is_not_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("skills.json");
        assert!(create_backup(&file, 5).await.unwrap().is_none());

        fs::write(&file, "[]").await.unwrap();
        assert!(create_backup(&file, 0).await.unwrap().is_none());

        let backup = create_backup(&file, 5).await.unwrap().unwrap();
        assert_eq!(fs::read_to_string(backup).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn missing_directory_has_no_backups() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("absent").join("blogs.json");
        assert!(list_backups(&file).await.unwrap().is_empty());
        assert_eq!(prune_backups(&file, 1).await.unwrap(), 0);
    }
}
