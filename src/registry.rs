//! Bridge to the host application's own list of plugin sources.
//!
//! The browser reads enabled state from the host and forwards enable/disable
//! intents to it; it never owns that list.

use crate::error::{BrowserError, Result};
use crate::types::{normalize_raw_url, RepositoryEntry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Interface level assumed for a freshly created host registry.
pub const DEFAULT_INTERFACE_LEVEL: u32 = 9;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RepoSetting {
    pub url: String,
    pub enabled: bool,
}

pub trait RepoRegistry {
    fn list(&self) -> Vec<RepoSetting>;
    /// Appends `url` as an enabled source.
    fn add(&mut self, url: &str);
    fn set_enabled(&mut self, url: &str, enabled: bool);
    fn save(&mut self) -> Result<()>;
    /// Has the host re-apply the registry to its active plugin sources.
    fn reload_from_config(&mut self) -> Result<()>;
    fn interface_level(&self) -> u32;
}

fn persist<R: RepoRegistry + ?Sized>(registry: &mut R) -> Result<()> {
    registry.save()?;
    registry.reload_from_config()
}

/// Whether `candidate` names the same repository as `url`, directly or
/// through its raw-content alias.
pub fn same_repository(url: &str, candidate: &str) -> bool {
    candidate == url || normalize_raw_url(candidate) == normalize_raw_url(url)
}

/// Registry rows naming `url` under any alias.
fn aliases_of<R: RepoRegistry + ?Sized>(registry: &R, url: &str) -> Vec<RepoSetting> {
    registry
        .list()
        .into_iter()
        .filter(|s| same_repository(url, &s.url))
        .collect()
}

/// Enabled under `url` or any of its aliases.
pub fn is_enabled<R: RepoRegistry + ?Sized>(registry: &R, url: &str) -> bool {
    aliases_of(registry, url).iter().any(|s| s.enabled)
}

pub fn entry_enabled<R: RepoRegistry + ?Sized>(registry: &R, entry: &RepositoryEntry) -> bool {
    is_enabled(registry, &entry.url)
}

fn set_all<R: RepoRegistry + ?Sized>(registry: &mut R, rows: &[RepoSetting], enabled: bool) {
    for row in rows {
        registry.set_enabled(&row.url, enabled);
    }
}

/// Adds `url` enabled. A repository the host already knows, under any
/// alias, is enabled in place instead of gaining a second row.
pub fn add_repo<R: RepoRegistry + ?Sized>(registry: &mut R, url: &str) -> Result<()> {
    let rows = aliases_of(registry, url);
    if rows.is_empty() {
        registry.add(url);
        info!("Added repository {}", url);
    } else {
        set_all(registry, &rows, true);
        info!("Enabled repository {}", url);
    }
    persist(registry)
}

/// Flips the repository's enabled state, or adds `url` enabled when the
/// host does not know it under any alias. Every aliased row ends up in the
/// new state. Returns that state.
pub fn toggle_repo<R: RepoRegistry + ?Sized>(registry: &mut R, url: &str) -> Result<bool> {
    let rows = aliases_of(registry, url);
    if rows.is_empty() {
        add_repo(registry, url)?;
        return Ok(true);
    }

    let enabled = !rows.iter().any(|s| s.enabled);
    set_all(registry, &rows, enabled);
    info!("{} repository {}", if enabled { "Enabled" } else { "Disabled" }, url);
    persist(registry)?;
    Ok(enabled)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct RegistryFile {
    interface_level: u32,
    repos: Vec<RepoSetting>,
}

impl Default for RegistryFile {
    fn default() -> Self {
        Self {
            interface_level: DEFAULT_INTERFACE_LEVEL,
            repos: Vec::new(),
        }
    }
}

fn read_registry(path: &Path) -> Result<RegistryFile> {
    let contents = fs::read_to_string(path).map_err(|e| BrowserError::io(path, e))?;
    serde_json::from_str(&contents)
        .map_err(|e| BrowserError::Registry(format!("{}: {}", path.display(), e)))
}

/// File-backed host registry used by the command-line host.
#[derive(Debug)]
pub struct JsonRegistry {
    path: PathBuf,
    file: RegistryFile,
    active: Vec<String>,
}

impl JsonRegistry {
    /// Opens the registry at `path`, creating an empty one if absent. An
    /// unreadable or malformed file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = if path.exists() {
            read_registry(&path)?
        } else {
            RegistryFile::default()
        };
        let active = active_urls(&file);
        Ok(Self { path, file, active })
    }

    /// Sources the host currently fetches plugins from.
    pub fn active_sources(&self) -> &[String] {
        &self.active
    }
}

fn active_urls(file: &RegistryFile) -> Vec<String> {
    file.repos
        .iter()
        .filter(|s| s.enabled)
        .map(|s| s.url.clone())
        .collect()
}

impl RepoRegistry for JsonRegistry {
    fn list(&self) -> Vec<RepoSetting> {
        self.file.repos.clone()
    }

    fn add(&mut self, url: &str) {
        self.file.repos.push(RepoSetting {
            url: url.to_string(),
            enabled: true,
        });
    }

    fn set_enabled(&mut self, url: &str, enabled: bool) {
        for setting in self.file.repos.iter_mut().filter(|s| s.url == url) {
            setting.enabled = enabled;
        }
    }

    fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| BrowserError::io(parent, e))?;
        }
        let contents = serde_json::to_string_pretty(&self.file)
            .map_err(|e| BrowserError::Registry(e.to_string()))?;
        fs::write(&self.path, contents).map_err(|e| BrowserError::io(&self.path, e))
    }

    fn reload_from_config(&mut self) -> Result<()> {
        let file = read_registry(&self.path)?;
        self.active = active_urls(&file);
        self.file = file;
        Ok(())
    }

    fn interface_level(&self) -> u32 {
        self.file.interface_level
    }
}
