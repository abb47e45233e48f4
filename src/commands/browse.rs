use anyhow::{Context, Result};
use repobrowser::cache::MasterListCache;
use repobrowser::http::HttpTransport;
use repobrowser::registry::{self, JsonRegistry, RepoRegistry};
use repobrowser::sort::SortKey;
use repobrowser::{spawn_sort_timer, BrowserConfig, RepoBrowser, RepositoryEntry};
use std::sync::Arc;

pub struct BrowseArgs {
    pub sort: Option<SortKey>,
    pub descending: Option<bool>,
    pub search: Option<String>,
    pub refetch: bool,
}

pub async fn browse(args: BrowseArgs) -> Result<()> {
    let mut config = BrowserConfig::load().context("Failed to load config")?;
    if let Some(key) = args.sort {
        config.sort_key = key;
    }
    if let Some(descending) = args.descending {
        config.sort_descending = descending;
    }

    let registry = JsonRegistry::open(config.registry_path()?)
        .context("Can't reach the plugin repository registry")?;
    let transport = Arc::new(HttpTransport::new()?);
    let cache = MasterListCache::new(BrowserConfig::cache_dir()?);
    let browser = RepoBrowser::new(&config, transport, cache, registry.interface_level());

    let timer = spawn_sort_timer(&browser);
    browser.refresh_with(args.refetch).settled().await;
    browser.sorted().await;
    timer.abort();

    let query = args.search.unwrap_or_default();
    let entries = browser.catalog().snapshot();
    let matching: Vec<&RepositoryEntry> =
        entries.iter().filter(|e| e.matches_query(&query)).collect();

    if entries.is_empty() {
        println!("No repositories found.");
    } else if matching.is_empty() {
        println!("No repositories match '{}'.", query);
    } else {
        println!("DO NOT INSTALL FROM REPOSITORIES YOU DO NOT TRUST.\n");
        for entry in &matching {
            print_entry(&browser, &registry, entry);
        }
    }
    println!(
        "{} of {} repositories shown (interface level {})",
        matching.len(),
        entries.len(),
        browser.interface_level()
    );

    config.seen_repos = browser.seen_repos();
    config.save().context("Failed to save config")?;
    Ok(())
}

fn print_entry(browser: &RepoBrowser, registry: &JsonRegistry, entry: &RepositoryEntry) {
    let marker = if registry::entry_enabled(registry, entry) { "✓" } else { " " };
    let new = if browser.is_new(entry) { " (new)" } else { "" };
    println!("  [{}] {}{}", marker, entry.full_name, new);
    println!("    {}", entry.url);
    if !entry.git_repo_url.is_empty() {
        println!("    {}", entry.git_repo_url);
    }
    println!("    ⭐ {} | {} plugins", entry.stars, entry.plugins.len());
    for plugin in &entry.plugins {
        let blurb = if plugin.punchline.is_empty() {
            &plugin.description
        } else {
            &plugin.punchline
        };
        if blurb.is_empty() {
            println!("      - {}", plugin.name);
        } else {
            println!("      - {}: {}", plugin.name, blurb);
        }
    }
    println!();
}
