//! Disk cache for master directory responses.
//!
//! A cached copy is reused only while it is younger than 24 hours and no
//! 08:00 local rollover has passed since it was written.

use crate::error::{BrowserError, Result};
use crate::http::Transport;
use crate::types::{MasterListing, RepoDescriptor};
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

const MAX_AGE_HOURS: i64 = 24;
const ROLLOVER_HOUR: u32 = 8;

/// Most recent 08:00 at or before `now`, in `now`'s timezone.
fn rollover_before<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let rollover = NaiveTime::from_hms_opt(ROLLOVER_HOUR, 0, 0)?;
    let mut day = now.date_naive();
    if now.time() < rollover {
        day = day.pred_opt()?;
    }
    now.timezone()
        .from_local_datetime(&day.and_time(rollover))
        .earliest()
}

/// Whether a copy written at `written` may still be served at `now`.
pub fn is_fresh<Tz: TimeZone>(written: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
    let age = now.clone().signed_duration_since(written.clone());
    if age < Duration::zero() || age >= Duration::hours(MAX_AGE_HOURS) {
        return false;
    }
    match rollover_before(now) {
        Some(boundary) => *written >= boundary,
        None => false,
    }
}

fn parse_listing(master_url: &str, text: &str) -> Result<Vec<RepoDescriptor>> {
    let listing: MasterListing =
        serde_json::from_str(text).map_err(|e| BrowserError::parse(master_url, e))?;
    Ok(listing.into_descriptors())
}

#[derive(Debug, Clone)]
pub struct MasterListCache {
    dir: PathBuf,
}

impl MasterListCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Raw response file for a master URL.
    pub fn cache_file(&self, master_url: &str) -> PathBuf {
        let digest = format!("{:x}", Sha256::digest(master_url.as_bytes()));
        self.dir.join(format!("{}.json", &digest[..16]))
    }

    fn stamp_file(cache_file: &Path) -> PathBuf {
        cache_file.with_extension("updated")
    }

    pub async fn load(
        &self,
        transport: &dyn Transport,
        master_url: &str,
        refetch: bool,
    ) -> Result<Vec<RepoDescriptor>> {
        self.load_at(transport, master_url, Local::now(), refetch).await
    }

    pub async fn load_at(
        &self,
        transport: &dyn Transport,
        master_url: &str,
        now: DateTime<Local>,
        refetch: bool,
    ) -> Result<Vec<RepoDescriptor>> {
        let path = self.cache_file(master_url);

        if !refetch {
            if let Some(text) = self.read_if_fresh(&path, &now).await {
                match parse_listing(master_url, &text) {
                    Ok(descriptors) => {
                        info!("Using cached repository list for {}", master_url);
                        return Ok(descriptors);
                    }
                    Err(e) => warn!("Ignoring unreadable cached copy: {}", e),
                }
            }
        }

        info!("Fetching repositories from {}", master_url);
        let text = transport.get_text(master_url).await?;
        // Persist before parsing; the parse below may still fail.
        if let Err(e) = self.store(&path, &text, now.timestamp_millis()).await {
            warn!("Failed to cache repository list: {}", e);
        }
        let descriptors = parse_listing(master_url, &text)?;
        info!("Fetched {} repositories from {}", descriptors.len(), master_url);
        Ok(descriptors)
    }

    async fn read_if_fresh(&self, path: &Path, now: &DateTime<Local>) -> Option<String> {
        let stamp = fs::read_to_string(Self::stamp_file(path)).await.ok()?;
        let millis: i64 = stamp.trim().parse().ok()?;
        let written = Local.timestamp_millis_opt(millis).single()?;
        if !is_fresh(&written, now) {
            return None;
        }
        fs::read_to_string(path).await.ok()
    }

    async fn store(&self, path: &Path, text: &str, millis: i64) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| BrowserError::io(&self.dir, e))?;
        fs::write(path, text)
            .await
            .map_err(|e| BrowserError::io(path, e))?;
        let stamp = Self::stamp_file(path);
        fs::write(&stamp, millis.to_string())
            .await
            .map_err(|e| BrowserError::io(&stamp, e))
    }
}
