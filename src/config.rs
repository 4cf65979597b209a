//! Scrape configuration
//!
//! Everything that used to be a module-level constant (URL templates,
//! page size, timeouts, delays, storage root) lives here and is passed to
//! the sources and the orchestrator at construction time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::portal::{Portal, PORTAL_PLACEHOLDER};
use crate::store::read_text;

pub const DEFAULT_SEARCH_URL_TEMPLATE: &str =
    "https://jobs.toronto.ca/{portal}/tile-search-results/";
pub const DEFAULT_DETAIL_URL_TEMPLATE: &str = "https://jobs.toronto.ca/{portal}/";
pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const DEFAULT_STORAGE_ROOT: &str = "downloaded";
pub const DEFAULT_USER_AGENT: &str = concat!("city_jobs/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Search endpoint, `{portal}` is replaced with the portal slug
    pub search_url_template: String,
    /// Base URL detail-page paths are resolved against
    pub detail_url_template: String,
    /// Tiles per search page; `startrow` advances by this much
    pub page_size: u32,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    /// Pause after every search page fetched from the network
    #[serde(with = "secs")]
    pub inter_request_delay: Duration,
    /// Pause between two portals
    #[serde(with = "secs")]
    pub inter_portal_delay: Duration,
    pub storage_root: PathBuf,
    pub user_agent: String,
    /// Portals to scrape, in order
    pub portals: Vec<Portal>,
    /// Detail pages fetched back to back before `detail_delay` is slept
    pub detail_batch_size: usize,
    #[serde(with = "secs")]
    pub detail_delay: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            search_url_template: DEFAULT_SEARCH_URL_TEMPLATE.to_string(),
            detail_url_template: DEFAULT_DETAIL_URL_TEMPLATE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
            inter_request_delay: Duration::from_secs(2),
            inter_portal_delay: Duration::from_secs(2),
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            portals: Portal::all(),
            detail_batch_size: 1,
            detail_delay: Duration::from_secs(2),
        }
    }
}

impl ScrapeConfig {
    /// Load a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = read_text(path)?;
        let mut config: ScrapeConfig = serde_json::from_str(&text)?;
        let portals = std::mem::take(&mut config.portals);
        config.set_portals(portals);
        config.validate()?;
        Ok(config)
    }

    /// Replace the portal list, keeping the first occurrence of each portal
    pub fn set_portals(&mut self, portals: impl IntoIterator<Item = Portal>) {
        let mut seen = HashSet::new();
        self.portals = portals.into_iter().filter(|p| seen.insert(*p)).collect();
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".into()));
        }
        if self.detail_batch_size == 0 {
            return Err(Error::Config("detail_batch_size must be at least 1".into()));
        }
        if self.portals.is_empty() {
            return Err(Error::Config("no portals configured".into()));
        }
        let mut seen = HashSet::new();
        if let Some(portal) = self.portals.iter().find(|p| !seen.insert(**p)) {
            return Err(Error::Config(format!("portal {} listed twice", portal)));
        }
        for (name, template) in [
            ("search_url_template", &self.search_url_template),
            ("detail_url_template", &self.detail_url_template),
        ] {
            if !template.contains(PORTAL_PLACEHOLDER) {
                return Err(Error::Config(format!(
                    "{} must contain {}",
                    name, PORTAL_PLACEHOLDER
                )));
            }
            url::Url::parse(&Portal::JobsAtCity.expand(template))?;
        }
        Ok(())
    }

    pub fn search_url(&self, portal: Portal) -> String {
        portal.expand(&self.search_url_template)
    }

    pub fn detail_base_url(&self, portal: Portal) -> String {
        portal.expand(&self.detail_url_template)
    }

    /// `startrow` offset of a search page
    pub fn start_row(&self, page_index: u32) -> u64 {
        u64::from(page_index) * u64::from(self.page_size)
    }
}

/// Durations as (fractional) seconds in config files
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
