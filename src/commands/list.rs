use anyhow::{Context, Result};
use repobrowser::registry::{JsonRegistry, RepoRegistry};
use repobrowser::BrowserConfig;

pub fn list_repos() -> Result<()> {
    let config = BrowserConfig::load().context("Failed to load config")?;
    let registry = JsonRegistry::open(config.registry_path()?)
        .context("Can't reach the plugin repository registry")?;
    let repos = registry.list();

    if repos.is_empty() {
        println!("No plugin repositories added yet.");
        return Ok(());
    }

    println!("Plugin repositories (interface level {}):\n", registry.interface_level());
    for repo in &repos {
        let marker = if repo.enabled { "✓" } else { "✗" };
        println!("  {} {}", marker, repo.url);
    }
    println!("\n{} of {} enabled", registry.active_sources().len(), repos.len());
    Ok(())
}
