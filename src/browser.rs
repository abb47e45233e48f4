//! The refresh service: owns the catalog, the dedup guard and the sort
//! debouncer, and runs refresh cycles against them.
//!
//! A cycle never cancels the work of an earlier one. Earlier tasks run to
//! completion and their results are dropped when their generation is no
//! longer current.

use crate::cache::MasterListCache;
use crate::catalog::{Catalog, Generation};
use crate::config::BrowserConfig;
use crate::debounce::{SortDebouncer, TICK_PERIOD};
use crate::dedup::DedupGuard;
use crate::error::Result;
use crate::fetcher::{manifest_source, usable_plugins, FetchOutcome, ManifestSource};
use crate::http::Transport;
use crate::sort::SortKey;
use crate::types::{RepoDescriptor, RepositoryEntry};
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
struct SortView {
    key: SortKey,
    descending: bool,
    /// Repositories seen in earlier sessions. Fixed for this session so new
    /// arrivals stay at the front across re-sorts.
    seen: BTreeSet<String>,
    newly_seen: BTreeSet<String>,
}

pub struct RepoBrowser {
    transport: Arc<dyn Transport>,
    manifests: Arc<dyn ManifestSource>,
    cache: MasterListCache,
    masters: Vec<String>,
    interface_level: u32,
    catalog: Catalog,
    dedup: DedupGuard,
    debouncer: SortDebouncer,
    view: Mutex<SortView>,
}

impl RepoBrowser {
    pub fn new(
        config: &BrowserConfig,
        transport: Arc<dyn Transport>,
        cache: MasterListCache,
        interface_level: u32,
    ) -> Arc<Self> {
        Arc::new(Self {
            manifests: manifest_source(config.manifest_strategy, Arc::clone(&transport)),
            transport,
            cache,
            masters: config.masters(),
            interface_level,
            catalog: Catalog::new(),
            dedup: DedupGuard::new(),
            debouncer: SortDebouncer::default(),
            view: Mutex::new(SortView {
                key: config.sort_key,
                descending: config.sort_descending,
                seen: config.seen_repos.clone(),
                newly_seen: BTreeSet::new(),
            }),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn debouncer(&self) -> &SortDebouncer {
        &self.debouncer
    }

    pub fn interface_level(&self) -> u32 {
        self.interface_level
    }

    /// Starts a new cycle using cached master lists where allowed.
    pub fn refresh(self: &Arc<Self>) -> RefreshCycle {
        self.refresh_with(false)
    }

    /// Starts a new cycle. Calling this while an earlier cycle is still in
    /// flight is how the earlier one is superseded.
    pub fn refresh_with(self: &Arc<Self>, refetch: bool) -> RefreshCycle {
        let generation = self.catalog.begin_cycle();
        self.dedup.reset(generation);
        info!(%generation, masters = self.masters.len(), "Starting refresh");

        let tasks = self
            .masters
            .iter()
            .cloned()
            .map(|master| {
                let this = Arc::clone(self);
                tokio::spawn(async move { this.load_master(master, generation, refetch).await })
            })
            .collect();

        RefreshCycle { generation, tasks }
    }

    async fn load_master(self: Arc<Self>, master_url: String, generation: Generation, refetch: bool) {
        let descriptors = match self
            .cache
            .load(self.transport.as_ref(), &master_url, refetch)
            .await
        {
            Ok(descriptors) => descriptors,
            Err(e) => {
                error!("Failed loading repository list {}: {}", master_url, e);
                return;
            }
        };

        if !self.catalog.is_current(generation) {
            debug!(%generation, "Discarding repository list from superseded refresh");
            return;
        }

        let fetches = descriptors.into_iter().map(|descriptor| {
            let this = Arc::clone(&self);
            tokio::spawn(async move { this.run_fetch(descriptor, generation).await })
        });
        let fetches: Vec<_> = fetches.collect();

        for result in join_all(fetches).await {
            if let Err(e) = result {
                error!("Repository fetch task failed: {}", e);
            }
        }
    }

    async fn run_fetch(&self, descriptor: RepoDescriptor, generation: Generation) {
        let url = descriptor.plugin_master_url.clone();
        match self.fetch_repository(&descriptor, generation).await {
            Ok(FetchOutcome::Inserted { plugins }) => {
                debug!("Added {} with {} plugins", url, plugins);
            }
            Ok(outcome) => debug!("{}: {:?}", url, outcome),
            Err(e) => error!("Failed loading plugins from {}: {}", url, e),
        }
    }

    /// Fetches one repository's manifest and, if it still belongs to the
    /// live cycle and offers usable plugins, inserts it into the catalog.
    pub async fn fetch_repository(
        &self,
        descriptor: &RepoDescriptor,
        generation: Generation,
    ) -> Result<FetchOutcome> {
        let mut entry = RepositoryEntry::shell(descriptor, generation);
        if entry.url.is_empty() {
            warn!("Skipping {} without a manifest URL", descriptor.full_name);
            return Ok(FetchOutcome::NoManifestUrl);
        }
        if !self.catalog.is_current(generation) {
            return Ok(FetchOutcome::Stale);
        }
        if !self.dedup.claim(generation, &entry.url) {
            info!("{} has already been fetched", entry.url);
            return Ok(FetchOutcome::Duplicate);
        }

        info!("Fetching plugin list from {}", entry.url);
        let plugins = self.manifests.plugins(descriptor).await?;
        entry.plugins = usable_plugins(plugins, self.interface_level);
        if entry.plugins.is_empty() {
            info!("{} contains no usable plugins", entry.url);
            return Ok(FetchOutcome::NoUsablePlugins);
        }

        let plugins = entry.plugins.len();
        if !self.catalog.insert_if_current(generation, entry) {
            debug!(%generation, "Discarding result from superseded refresh");
            return Ok(FetchOutcome::Stale);
        }
        self.debouncer.arm();
        Ok(FetchOutcome::Inserted { plugins })
    }

    /// Sorts the catalog with the current key and records its entries as seen.
    pub fn sort_catalog(&self) {
        let mut view = self.view.lock();
        self.catalog.sort(view.key, view.descending, &view.seen);
        let urls = self
            .catalog
            .read(|entries| entries.iter().map(|e| e.url.clone()).collect::<Vec<_>>());
        view.newly_seen.extend(urls);
    }

    /// Not seen in any earlier session.
    pub fn is_new(&self, entry: &RepositoryEntry) -> bool {
        !self.view.lock().seen.contains(&entry.url)
    }

    /// Everything seen so far, including this session, for persisting.
    pub fn seen_repos(&self) -> BTreeSet<String> {
        let view = self.view.lock();
        view.seen.union(&view.newly_seen).cloned().collect()
    }

    /// Waits until no debounced sort is pending.
    pub async fn sorted(&self) {
        while !self.debouncer.is_idle() {
            tokio::time::sleep(TICK_PERIOD).await;
        }
    }
}

/// Handle to the tasks of one refresh cycle.
pub struct RefreshCycle {
    generation: Generation,
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshCycle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Resolves once every master load and repository fetch of this cycle
    /// has finished, whether or not its results were kept.
    pub async fn settled(self) {
        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                error!("Refresh task failed: {}", e);
            }
        }
    }
}

/// Drives the sort debouncer: one tick per [`TICK_PERIOD`], sorting the
/// catalog when the countdown expires. Stops once the browser is dropped.
pub fn spawn_sort_timer(browser: &Arc<RepoBrowser>) -> JoinHandle<()> {
    let browser: Weak<RepoBrowser> = Arc::downgrade(browser);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_PERIOD);
        loop {
            interval.tick().await;
            let Some(browser) = browser.upgrade() else {
                break;
            };
            if browser.debouncer.tick() {
                debug!("Sorting catalog");
                browser.sort_catalog();
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ManifestPlugin;
    use async_trait::async_trait;

    struct NoNetwork;

    #[async_trait]
    impl Transport for NoNetwork {
        async fn get_text(&self, url: &str) -> Result<String> {
            Err(crate::error::BrowserError::Status {
                url: url.to_string(),
                status: 503,
            })
        }
    }

    fn browser() -> Arc<RepoBrowser> {
        let config = BrowserConfig {
            repo_masters: Vec::new(),
            ..Default::default()
        };
        RepoBrowser::new(&config, Arc::new(NoNetwork), MasterListCache::new("/nonexistent"), 9)
    }

    fn embedded(url: &str, levels: &[u32]) -> RepoDescriptor {
        RepoDescriptor {
            plugin_master_url: url.to_string(),
            plugins: Some(
                levels
                    .iter()
                    .map(|level| ManifestPlugin {
                        name: format!("p{}", level),
                        dalamud_api_level: *level,
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn inserted_entry_arms_the_debouncer() {
        let browser = browser();
        let cycle = browser.refresh().generation();
        let outcome = browser
            .fetch_repository(&embedded("a", &[9, 9, 8]), cycle)
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Inserted { plugins: 2 });
        assert!(!browser.debouncer().is_idle());
        assert_eq!(browser.catalog().snapshot()[0].generation, cycle);
    }

    #[tokio::test]
    async fn duplicate_claim_short_circuits() {
        let browser = browser();
        let cycle = browser.refresh().generation();
        browser.fetch_repository(&embedded("a", &[9]), cycle).await.unwrap();
        let outcome = browser.fetch_repository(&embedded("a", &[9]), cycle).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Duplicate);
        assert_eq!(browser.catalog().len(), 1);
    }

    #[tokio::test]
    async fn stale_generation_is_discarded() {
        let browser = browser();
        let old = browser.refresh().generation();
        browser.refresh();
        let outcome = browser.fetch_repository(&embedded("a", &[9]), old).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(browser.catalog().is_empty());
        assert!(browser.debouncer().is_idle());
    }

    #[tokio::test]
    async fn empty_manifest_is_not_an_error() {
        let browser = browser();
        let cycle = browser.refresh().generation();
        let outcome = browser.fetch_repository(&embedded("a", &[8]), cycle).await.unwrap();
        assert_eq!(outcome, FetchOutcome::NoUsablePlugins);
        assert!(browser.catalog().is_empty());
    }

    #[tokio::test]
    async fn descriptor_without_manifest_url_is_skipped() {
        let browser = browser();
        let cycle = browser.refresh().generation();
        let outcome = browser.fetch_repository(&embedded("", &[9]), cycle).await.unwrap();
        assert_eq!(outcome, FetchOutcome::NoManifestUrl);
        assert!(browser.catalog().is_empty());
        assert_eq!(browser.dedup.claimed(), 0);
    }

    #[tokio::test]
    async fn network_failure_is_returned_to_caller() {
        let browser = browser();
        let cycle = browser.refresh().generation();
        let remote = RepoDescriptor {
            plugin_master_url: "https://down.example/repo.json".to_string(),
            ..Default::default()
        };
        assert!(browser.fetch_repository(&remote, cycle).await.is_err());
    }

    #[test]
    fn unseen_entries_are_new_until_next_session() {
        let config = BrowserConfig {
            repo_masters: Vec::new(),
            seen_repos: ["old".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let browser = RepoBrowser::new(&config, Arc::new(NoNetwork), MasterListCache::new("/nonexistent"), 9);
        let cycle = browser.catalog().begin_cycle();
        for url in ["old", "fresh"] {
            let entry = RepositoryEntry::shell(&embedded(url, &[9]), cycle);
            browser.catalog().insert_if_current(cycle, entry);
        }
        browser.sort_catalog();

        let entries = browser.catalog().snapshot();
        assert_eq!(entries[0].url, "fresh");
        assert!(browser.is_new(&entries[0]));
        assert!(!browser.is_new(&entries[1]));
        assert_eq!(browser.seen_repos().len(), 2);
    }
}
