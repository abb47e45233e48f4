use crate::catalog::Generation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One repository as listed by a master directory.
///
/// The legacy master format is a bare array of manifest URLs; those entries
/// deserialize through [`MasterListing`] into a descriptor with only
/// `plugin_master_url` set.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RepoDescriptor {
    pub owner: String,
    pub full_name: String,
    /// Epoch milliseconds.
    pub last_updated: i64,
    pub stargazers_count: u32,
    #[serde(alias = "DalamudApiLevel")]
    pub dalamud_api_level: u32,
    pub plugin_master_url: String,
    pub git_repo_url: String,
    pub is_default_branch: bool,
    pub branch_name: String,
    /// Present only in the embedded-manifest protocol.
    pub plugins: Option<Vec<ManifestPlugin>>,
}

/// A plugin record as it appears on the wire, either embedded in a master
/// directory or in a repository's own manifest.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestPlugin {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Description")]
    pub description: Option<String>,
    #[serde(alias = "Punchline")]
    pub punchline: Option<String>,
    #[serde(alias = "RepoUrl")]
    pub repo_url: Option<String>,
    #[serde(alias = "DalamudApiLevel")]
    pub dalamud_api_level: u32,
    #[serde(alias = "Tags")]
    pub tags: Option<Vec<String>>,
    #[serde(alias = "CategoryTags")]
    pub category_tags: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum MasterItem {
    Descriptor(RepoDescriptor),
    Url(String),
}

/// The body of a master directory response.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
pub struct MasterListing(pub Vec<MasterItem>);

impl MasterListing {
    pub fn into_descriptors(self) -> Vec<RepoDescriptor> {
        self.0
            .into_iter()
            .map(|item| match item {
                MasterItem::Descriptor(descriptor) => descriptor,
                MasterItem::Url(url) => RepoDescriptor {
                    full_name: url.clone(),
                    plugin_master_url: url,
                    ..Default::default()
                },
            })
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub name: String,
    pub description: String,
    pub punchline: String,
    pub repo_url: String,
    pub api_level: u32,
    pub tags: BTreeSet<String>,
    pub category_tags: BTreeSet<String>,
}

impl From<ManifestPlugin> for PluginEntry {
    fn from(plugin: ManifestPlugin) -> Self {
        Self {
            name: plugin.name,
            description: plugin.description.unwrap_or_default(),
            punchline: plugin.punchline.unwrap_or_default(),
            repo_url: plugin.repo_url.unwrap_or_default(),
            api_level: plugin.dalamud_api_level,
            tags: plugin.tags.unwrap_or_default().into_iter().collect(),
            category_tags: plugin.category_tags.unwrap_or_default().into_iter().collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RepositoryEntry {
    pub owner: String,
    pub full_name: String,
    pub last_updated: i64,
    pub stars: u32,
    pub api_level: u32,
    pub url: String,
    pub raw_url: String,
    pub git_repo_url: String,
    pub is_default_branch: bool,
    pub branch_name: String,
    pub plugins: Vec<PluginEntry>,
    /// Refresh cycle that produced this entry.
    #[serde(skip)]
    pub generation: Generation,
}

impl RepositoryEntry {
    /// Builds the entry shell for a descriptor; plugins are filled in once
    /// the manifest has been retrieved.
    pub fn shell(descriptor: &RepoDescriptor, generation: Generation) -> Self {
        Self {
            owner: descriptor.owner.clone(),
            full_name: descriptor.full_name.clone(),
            last_updated: descriptor.last_updated,
            stars: descriptor.stargazers_count,
            api_level: descriptor.dalamud_api_level,
            url: descriptor.plugin_master_url.clone(),
            raw_url: normalize_raw_url(&descriptor.plugin_master_url),
            git_repo_url: descriptor.git_repo_url.clone(),
            is_default_branch: descriptor.is_default_branch,
            branch_name: descriptor.branch_name.clone(),
            plugins: Vec::new(),
            generation,
        }
    }

    /// Case-insensitive search over the repository and its plugins.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let hit = |text: &str| text.to_lowercase().contains(&query);

        hit(&self.owner)
            || hit(&self.full_name)
            || self.plugins.iter().any(|p| {
                hit(&p.name)
                    || hit(&p.description)
                    || hit(&p.punchline)
                    || p.tags.iter().chain(&p.category_tags).any(|t| hit(t))
            })
    }
}

/// Rewrites GitHub `raw`/`blob` page URLs to their raw.githubusercontent.com
/// form. Anything else is returned unchanged.
pub fn normalize_raw_url(url: &str) -> String {
    let Some(rest) = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
    else {
        return url.to_string();
    };

    let parts: Vec<&str> = rest.splitn(4, '/').collect();
    match parts.as_slice() {
        [owner, repo, kind, tail] if (*kind == "raw" || *kind == "blob") && !tail.is_empty() => {
            format!("https://raw.githubusercontent.com/{}/{}/{}", owner, repo, tail)
        }
        _ => url.to_string(),
    }
}
