//! Manifest retrieval strategies.
//!
//! Master directories have shipped in two shapes: one embeds each
//! repository's plugin list, the other only points at the repository's own
//! manifest and requires a second request. Both are supported.

use crate::config::ManifestStrategy;
use crate::error::{BrowserError, Result};
use crate::http::Transport;
use crate::types::{ManifestPlugin, PluginEntry, RepoDescriptor};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn plugins(&self, descriptor: &RepoDescriptor) -> Result<Vec<ManifestPlugin>>;
}

/// Reads the plugin list carried inside the descriptor.
pub struct EmbeddedManifest;

#[async_trait]
impl ManifestSource for EmbeddedManifest {
    async fn plugins(&self, descriptor: &RepoDescriptor) -> Result<Vec<ManifestPlugin>> {
        Ok(descriptor.plugins.clone().unwrap_or_default())
    }
}

/// Downloads the repository's manifest from `pluginMasterUrl`.
pub struct RemoteManifest {
    transport: Arc<dyn Transport>,
}

impl RemoteManifest {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ManifestSource for RemoteManifest {
    async fn plugins(&self, descriptor: &RepoDescriptor) -> Result<Vec<ManifestPlugin>> {
        let url = &descriptor.plugin_master_url;
        let text = self.transport.get_text(url).await?;
        serde_json::from_str(&text).map_err(|e| BrowserError::parse(url.as_str(), e))
    }
}

/// Embedded list when present, remote manifest otherwise.
pub struct AutoManifest {
    remote: RemoteManifest,
}

#[async_trait]
impl ManifestSource for AutoManifest {
    async fn plugins(&self, descriptor: &RepoDescriptor) -> Result<Vec<ManifestPlugin>> {
        match &descriptor.plugins {
            Some(plugins) => Ok(plugins.clone()),
            None => self.remote.plugins(descriptor).await,
        }
    }
}

pub fn manifest_source(
    strategy: ManifestStrategy,
    transport: Arc<dyn Transport>,
) -> Arc<dyn ManifestSource> {
    match strategy {
        ManifestStrategy::Auto => Arc::new(AutoManifest {
            remote: RemoteManifest::new(transport),
        }),
        ManifestStrategy::Embedded => Arc::new(EmbeddedManifest),
        ManifestStrategy::Remote => Arc::new(RemoteManifest::new(transport)),
    }
}

/// Keeps the plugins built for `interface_level`.
pub fn usable_plugins(plugins: Vec<ManifestPlugin>, interface_level: u32) -> Vec<PluginEntry> {
    plugins
        .into_iter()
        .filter(|p| p.dalamud_api_level == interface_level)
        .map(PluginEntry::from)
        .collect()
}

/// What became of one repository fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Inserted { plugins: usize },
    Duplicate,
    /// The descriptor names no manifest URL, so it has no catalog identity.
    NoManifestUrl,
    NoUsablePlugins,
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingTransport {
        body: String,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.requested.lock().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn plugin(name: &str, level: u32) -> ManifestPlugin {
        ManifestPlugin {
            name: name.to_string(),
            dalamud_api_level: level,
            ..Default::default()
        }
    }

    fn remote_transport() -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport {
            body: r#"[{"Name": "Remote", "DalamudApiLevel": 9}]"#.to_string(),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn descriptor(embedded: Option<Vec<ManifestPlugin>>) -> RepoDescriptor {
        RepoDescriptor {
            plugin_master_url: "https://a.example/pluginmaster.json".to_string(),
            plugins: embedded,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn auto_prefers_embedded_list() {
        let transport = remote_transport();
        let source = manifest_source(ManifestStrategy::Auto, transport.clone());
        let plugins = source
            .plugins(&descriptor(Some(vec![plugin("Embedded", 9)])))
            .await
            .unwrap();
        assert_eq!(plugins[0].name, "Embedded");
        assert!(transport.requested.lock().is_empty());
    }

    #[tokio::test]
    async fn auto_falls_back_to_remote_manifest() {
        let transport = remote_transport();
        let source = manifest_source(ManifestStrategy::Auto, transport.clone());
        let plugins = source.plugins(&descriptor(None)).await.unwrap();
        assert_eq!(plugins[0].name, "Remote");
        assert_eq!(
            *transport.requested.lock(),
            vec!["https://a.example/pluginmaster.json".to_string()]
        );
    }

    #[tokio::test]
    async fn remote_strategy_always_downloads() {
        let transport = remote_transport();
        let source = manifest_source(ManifestStrategy::Remote, transport.clone());
        let plugins = source
            .plugins(&descriptor(Some(vec![plugin("Embedded", 9)])))
            .await
            .unwrap();
        assert_eq!(plugins[0].name, "Remote");
    }

    #[tokio::test]
    async fn embedded_strategy_without_list_is_empty() {
        let source = manifest_source(ManifestStrategy::Embedded, remote_transport());
        assert!(source.plugins(&descriptor(None)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_manifest_is_a_parse_error() {
        let transport = Arc::new(RecordingTransport {
            body: "{}".to_string(),
            requested: Mutex::new(Vec::new()),
        });
        let source = RemoteManifest::new(transport);
        let err = source.plugins(&descriptor(None)).await.unwrap_err();
        assert!(matches!(err, BrowserError::Parse { .. }));
    }

    #[test]
    fn only_matching_interface_level_is_usable() {
        let usable = usable_plugins(vec![plugin("old", 8), plugin("cur", 9), plugin("next", 10)], 9);
        assert_eq!(usable.len(), 1);
        assert_eq!(usable[0].name, "cur");
    }
}
