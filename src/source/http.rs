//! Pages fetched live from the job board

use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use url::Url;

use super::{PageFetch, PageSource};
use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::models::ListingRecord;
use crate::portal::Portal;

/// Blocking HTTP source. Does not sleep; pacing is the caller's job.
pub struct HttpPageSource {
    agent: ureq::Agent,
    config: ScrapeConfig,
}

impl HttpPageSource {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            agent: build_agent(&config.user_agent, config.request_timeout),
            config: config.clone(),
        }
    }

    /// URL of a listing's detail page
    pub fn job_url(&self, portal: Portal, listing: &ListingRecord) -> Result<Url> {
        let base = Url::parse(&self.config.detail_base_url(portal))?;
        Ok(base.join(listing.relative_url.trim())?)
    }

    fn get_html(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(*key, value);
        }

        let response = request.call().map_err(|e| Error::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") {
            return Err(Error::fetch(
                url,
                format!("expected HTML content but received '{}'", content_type),
            ));
        }

        response
            .into_body()
            .read_to_string()
            .map_err(|e| Error::fetch(url, e))
    }
}

impl PageSource for HttpPageSource {
    fn search_page(&self, portal: Portal, page_index: u32) -> Result<PageFetch> {
        let url = self.config.search_url(portal);
        let start_row = self.config.start_row(page_index);
        debug!(portal = %portal, page_index, start_row, "fetching search page");

        let query = [
            ("q", String::new()),
            ("startrow", start_row.to_string()),
            // cache buster
            ("_", Utc::now().timestamp_millis().to_string()),
        ];
        self.get_html(&url, &query).map(PageFetch::Page)
    }

    fn job_page(&self, portal: Portal, listing: &ListingRecord) -> Result<String> {
        let url = self.job_url(portal, listing)?;
        debug!(portal = %portal, job_id = %listing.job_id, url = %url, "fetching job page");
        self.get_html(url.as_str(), &[])
    }

    fn is_remote(&self) -> bool {
        true
    }
}

fn build_agent(user_agent: &str, timeout: Duration) -> ureq::Agent {
    ureq::Agent::new_with_config(
        ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(user_agent)
            // non-2xx is reported with the URL by get_html
            .http_status_as_error(false)
            .build(),
    )
}
