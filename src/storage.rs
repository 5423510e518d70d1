//! Identity-addressed article storage.
//!
//! # Layout
//!
//! ```text
//! storage/
//! ├── raw_articles/
//! │   └── <key>.json
//! └── processed_articles/
//!     └── <key>.json
//! ```
//!
//! `<key>` is [`ArticleId::key`](crate::models::ArticleId::key). Writes go to
//! a hidden temp file next to the target and are renamed into place, so a
//! write either replaces the previous version completely or not at all, and
//! writers of distinct keys never touch the same file.

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::models::{ProcessedArticle, RawArticle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

const PROBE_FILE: &str = ".__probe_write__";

#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

/// Raw article as stored, with its storage key alongside.
#[derive(Serialize)]
struct RawRecord<'a> {
    id: String,
    #[serde(flatten)]
    article: &'a RawArticle,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Self {
        Storage { config }
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.config.processed_dir()
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.config.raw_dir()
    }

    /// Create the directory tree and check the processed directory is writable.
    ///
    /// Any failure here is fatal for the run.
    #[instrument(level = "info", skip_all, fields(root = %self.config.root.display()))]
    pub async fn prepare(&self) -> Result<(), StorageError> {
        let mut dirs = vec![self.processed_dir()];
        if self.config.write_raw {
            dirs.push(self.raw_dir());
        }
        for dir in &dirs {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| StorageError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
        }

        let processed = self.processed_dir();
        let probe = processed.join(PROBE_FILE);
        fs::write(&probe, b"")
            .await
            .map_err(|source| StorageError::NotWritable {
                path: processed.clone(),
                source,
            })?;
        let _ = fs::remove_file(&probe).await;

        info!("Storage directories are writable");
        Ok(())
    }

    /// Create or replace the processed record for this article.
    #[instrument(level = "debug", skip_all, fields(key = %article.id))]
    pub async fn write_processed(&self, article: &ProcessedArticle) -> Result<PathBuf, StorageError> {
        write_json(&self.processed_dir(), &article.id, article).await
    }

    /// Create or replace the raw record; `None` when raw storage is disabled.
    #[instrument(level = "debug", skip_all, fields(link = %article.link))]
    pub async fn write_raw(&self, article: &RawArticle) -> Result<Option<PathBuf>, StorageError> {
        if !self.config.write_raw {
            return Ok(None);
        }
        let id = article.id().key();
        let record = RawRecord { id, article };
        let path = write_json(&self.raw_dir(), &record.id, &record).await?;
        Ok(Some(path))
    }

    /// Whether the processed directory holds any article.
    ///
    /// The scheduler publishes an artifact based on this directory alone, so
    /// this is the authoritative "did the run produce output" signal.
    pub async fn has_output(&self) -> Result<bool, StorageError> {
        Ok(!list_json(&self.processed_dir()).await?.is_empty())
    }

    /// Stored processed files, sorted by name.
    pub async fn processed_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        list_json(&self.processed_dir()).await
    }
}

async fn write_json<T: Serialize>(dir: &Path, key: &str, value: &T) -> Result<PathBuf, StorageError> {
    let mut json = serde_json::to_vec_pretty(value)?;
    json.push(b'\n');

    let path = dir.join(format!("{key}.json"));
    let tmp = dir.join(format!(".{key}.json.tmp"));
    fs::write(&tmp, &json)
        .await
        .map_err(|source| StorageError::Write {
            path: tmp.clone(),
            source,
        })?;
    fs::rename(&tmp, &path)
        .await
        .map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;

    debug!(path = %path.display(), bytes = json.len(), "Wrote article");
    Ok(path)
}

/// Visible `*.json` files directly under `dir`; a missing directory is empty.
async fn list_json(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let read_err = |source: std::io::Error| StorageError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if !hidden && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
