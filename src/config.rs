use crate::error::{BrowserError, Result};
use crate::sort::SortKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPO_MASTER: &str =
    "https://raw.githubusercontent.com/UnknownX7/DalamudRepoBrowser/master/repomaster.json";

/// How a repository's plugin list is obtained once its descriptor is known.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ManifestStrategy {
    /// Use the embedded plugin list when present, otherwise fetch the manifest.
    #[default]
    Auto,
    Embedded,
    Remote,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BrowserConfig {
    pub repo_masters: Vec<String>,
    pub manifest_strategy: ManifestStrategy,
    pub sort_key: SortKey,
    pub sort_descending: bool,
    pub seen_repos: BTreeSet<String>,
    pub registry_path: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            repo_masters: vec![DEFAULT_REPO_MASTER.to_string()],
            manifest_strategy: ManifestStrategy::Auto,
            sort_key: SortKey::Stars,
            sort_descending: true,
            seen_repos: BTreeSet::new(),
            registry_path: None,
        }
    }
}

impl BrowserConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| BrowserError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|source| BrowserError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BrowserError::io(parent, e))?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(|source| BrowserError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, contents).map_err(|e| BrowserError::io(path, e))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.json"))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.cache_dir().join("masters"))
    }

    pub fn registry_path(&self) -> Result<PathBuf> {
        match &self.registry_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.config_dir().join("repos.json")),
        }
    }

    /// Master URLs with blanks and duplicates dropped, in configured order.
    pub fn masters(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.repo_masters
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty() && seen.insert(*url))
            .map(str::to_string)
            .collect()
    }

    pub fn mark_seen<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.seen_repos.extend(urls);
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "repobrowser").ok_or_else(|| BrowserError::Io {
        path: PathBuf::from("~"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory"),
    })
}
