use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::FilterState;

/// On-disk contents of the local store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
struct StoredData {
    token: Option<String>,
    saved_filters: BTreeMap<String, FilterState>,
}

/// Small JSON file holding the auth token and the user's named filters
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
    data: StoredData,
}

impl LocalStorage {
    /// Load from `path`. A missing file is an empty store.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(json) => serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No local storage at {}, starting empty", path.display());
                StoredData::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        Ok(Self { path, data })
    }

    /// Write the store back to its file
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!("💾 Saved local storage to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> Option<&str> {
        self.data.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.data.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.data.token = None;
    }

    /// Store `filters` under `name`, replacing any filter of that name
    pub fn save_filter(&mut self, name: &str, filters: FilterState) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Saved filter name cannot be empty");
        }
        info!("Saved filter \"{}\"", name);
        self.data.saved_filters.insert(name.to_string(), filters);
        Ok(())
    }

    /// Remove a saved filter; returns whether it existed
    pub fn delete_filter(&mut self, name: &str) -> bool {
        self.data.saved_filters.remove(name.trim()).is_some()
    }

    pub fn saved_filter(&self, name: &str) -> Option<&FilterState> {
        self.data.saved_filters.get(name.trim())
    }

    /// Saved filter names in alphabetical order
    pub fn saved_filter_names(&self) -> Vec<&str> {
        self.data.saved_filters.keys().map(String::as_str).collect()
    }
}
