use anyhow::{Context, Result};
use repobrowser::registry::{self, JsonRegistry};
use repobrowser::BrowserConfig;

fn open_registry() -> Result<JsonRegistry> {
    let config = BrowserConfig::load().context("Failed to load config")?;
    JsonRegistry::open(config.registry_path()?).context("Can't reach the plugin repository registry")
}

pub fn toggle_repo(url: &str) -> Result<()> {
    let mut registry = open_registry()?;
    let enabled = registry::toggle_repo(&mut registry, url)?;
    println!("{} {}", if enabled { "✓ Enabled" } else { "✗ Disabled" }, url);
    Ok(())
}

pub fn add_repo(url: &str) -> Result<()> {
    let mut registry = open_registry()?;
    if registry::is_enabled(&registry, url) {
        println!("{} is already enabled", url);
        return Ok(());
    }
    registry::add_repo(&mut registry, url)?;
    println!("✓ Enabled {}", url);
    Ok(())
}
