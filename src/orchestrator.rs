//! Multi-portal scrape runs
//!
//! Portals are processed one after the other in the order given. Within a
//! portal all search pages are collected first, then extracted page by page,
//! before the next portal is fetched.
//! Any error aborts the whole run: a run yields complete listings for every
//! requested portal or nothing.

use std::collections::{BTreeMap, HashSet};
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::extractors::{extract_details, extract_listings, DetailOutcome};
use crate::models::{DetailsByPortal, ListingRecord, ListingsByPortal, PagesByPortal};
use crate::pagination::PaginationDriver;
use crate::portal::Portal;
use crate::source::PageSource;
use crate::store::PageStore;

/// Result of a detail run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DetailReport {
    pub details: DetailsByPortal,
    /// Postings whose page says they have ended
    pub closed: Vec<(Portal, String)>,
    /// Postings whose page could not be extracted, with the reason
    pub failed: Vec<(Portal, String, String)>,
}

pub struct PortalOrchestrator {
    source: Box<dyn PageSource>,
    config: ScrapeConfig,
    store: Option<PageStore>,
}

impl PortalOrchestrator {
    pub fn new(source: Box<dyn PageSource>, config: ScrapeConfig) -> Self {
        Self {
            source,
            config,
            store: None,
        }
    }

    /// Archive every fetched page under `store`
    pub fn with_store(mut self, store: PageStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Collect and extract the listings of every portal in `portals`.
    ///
    /// Each portal is paginated and extracted before the next one is
    /// touched, so a bad page stops the run without fetching later portals.
    pub fn run(&self, portals: &[Portal]) -> Result<ListingsByPortal> {
        let driver = self.driver();
        let mut listings = ListingsByPortal::new();

        for (i, &portal) in portals.iter().enumerate() {
            if i > 0 {
                self.pause(self.config.inter_portal_delay);
            }
            let pages = self.collect_portal(&driver, portal)?;
            listings.insert(portal, extract_portal(portal, &pages)?);
        }

        Ok(listings)
    }

    /// Search pages of every portal, archived when a store is attached.
    pub fn collect_pages(&self, portals: &[Portal]) -> Result<PagesByPortal> {
        let driver = self.driver();
        let mut collected = PagesByPortal::new();

        for (i, &portal) in portals.iter().enumerate() {
            if i > 0 {
                self.pause(self.config.inter_portal_delay);
            }
            let pages = self.collect_portal(&driver, portal)?;
            collected.insert(portal, pages);
        }

        Ok(collected)
    }

    /// Listings of already collected pages, in page-then-document order.
    pub fn extract_pages(&self, pages: &PagesByPortal) -> Result<ListingsByPortal> {
        let mut listings = ListingsByPortal::new();
        for (&portal, portal_pages) in pages {
            listings.insert(portal, extract_portal(portal, portal_pages)?);
        }
        Ok(listings)
    }

    /// Fetch and extract detail pages for the first `limit` listings of
    /// each portal (all of them when `None`).
    ///
    /// Closed postings and pages that fail extraction are reported rather
    /// than aborting the run. Fetch errors are still fatal.
    pub fn collect_details(
        &self,
        listings: &ListingsByPortal,
        limit: Option<usize>,
    ) -> Result<DetailReport> {
        let mut report = DetailReport::default();
        let batch_size = self.config.detail_batch_size.max(1);
        let mut fetched = 0usize;

        for (&portal, records) in listings {
            let selected = &records[..limit.map_or(records.len(), |n| n.min(records.len()))];
            info!(portal = %portal, jobs = selected.len(), "collecting job details");

            let mut portal_details = BTreeMap::new();
            for listing in selected {
                if fetched > 0 && fetched % batch_size == 0 {
                    self.pause(self.config.detail_delay);
                }
                fetched += 1;

                let page = self.fetch_job_page(portal, listing)?;
                match extract_details(&page) {
                    Ok(DetailOutcome::Details(details)) => {
                        portal_details.insert(listing.job_id.clone(), details);
                    }
                    Ok(DetailOutcome::Closed) => {
                        warn!(portal = %portal, job_id = %listing.job_id, "posting has ended");
                        report.closed.push((portal, listing.job_id.clone()));
                    }
                    Err(e) => {
                        error!(portal = %portal, job_id = %listing.job_id, error = %e, "detail extraction failed");
                        report
                            .failed
                            .push((portal, listing.job_id.clone(), e.to_string()));
                    }
                }
            }

            report.details.insert(portal, portal_details);
        }

        Ok(report)
    }

    fn driver(&self) -> PaginationDriver<'_, dyn PageSource> {
        PaginationDriver::new(self.source.as_ref(), self.config.inter_request_delay)
    }

    fn collect_portal(
        &self,
        driver: &PaginationDriver<'_, dyn PageSource>,
        portal: Portal,
    ) -> Result<Vec<String>> {
        info!(portal = %portal, label = portal.label(), "collecting search pages");
        let pages = driver.collect_all_pages(portal)?;

        if let Some(store) = &self.store {
            store.write_search_pages(portal, &pages)?;
        }
        Ok(pages)
    }

    fn fetch_job_page(&self, portal: Portal, listing: &ListingRecord) -> Result<String> {
        let page = self.source.job_page(portal, listing)?;
        if let Some(store) = &self.store {
            store.write_job_page(portal, &listing.job_id, &page)?;
        }
        Ok(page)
    }

    fn pause(&self, delay: Duration) {
        if self.source.is_remote() && !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Listings of one portal's pages. A job id seen twice means a page was
/// served twice and fails the run.
fn extract_portal(portal: Portal, pages: &[String]) -> Result<Vec<ListingRecord>> {
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (page_index, page) in pages.iter().enumerate() {
        for record in extract_listings(page, portal)? {
            if !seen.insert(record.job_id.clone()) {
                return Err(Error::extraction(format!(
                    "{} page {}: duplicate job id {}",
                    portal, page_index, record.job_id
                )));
            }
            records.push(record);
        }
    }

    info!(portal = %portal, listings = records.len(), "extracted listings");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use chrono::NaiveDate;

    use super::*;
    use crate::source::{DirectoryPageSource, PageFetch};

    const MARKER: &str = "<!DOCTYPE HTML>";

    fn tile(id: &str) -> String {
        format!(
            r#"<li class="job-tile job-id-{id}" data-url="/jobsatcity/job/{id}/">
                <div class="sub-section-desktop">
                    <a class="jobTitle-link">Job {id}</a>
                    <div id="job-{id}-desktop-section-shifttype-value">Full Time</div>
                    <div id="job-{id}-desktop-section-date-value">Jan 05, 2024</div>
                </div>
            </li>"#,
            id = id
        )
    }

    fn search_page(ids: &[&str]) -> String {
        let tiles: Vec<String> = ids.iter().map(|id| tile(id)).collect();
        format!("<html><body><ul>{}</ul></body></html>", tiles.join(""))
    }

    fn detail_page(items: &[&str]) -> String {
        let items: String = items.iter().map(|i| format!("<li>{}</li>", i)).collect();
        format!(
            "<html><body><div class=\"jobdescription\"><ul>{}</ul></div></body></html>",
            items
        )
    }

    fn listing(portal: Portal, id: &str) -> ListingRecord {
        ListingRecord::new(
            portal,
            id,
            format!("/{}/job/{}/", portal.slug(), id),
            format!("Job {}", id),
            None,
            "Full Time",
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .unwrap()
    }

    /// In-memory source; search pages per portal, job pages per job id.
    #[derive(Default)]
    struct MemorySource {
        search: HashMap<Portal, Vec<String>>,
        jobs: HashMap<String, String>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl PageSource for MemorySource {
        fn search_page(&self, portal: Portal, page_index: u32) -> Result<PageFetch> {
            self.calls
                .borrow_mut()
                .push(format!("search {} {}", portal, page_index));
            let pages = self
                .search
                .get(&portal)
                .ok_or_else(|| Error::fetch(portal.slug(), "no such portal"))?;
            Ok(pages
                .get(page_index as usize)
                .cloned()
                .map_or(PageFetch::Exhausted, PageFetch::Page))
        }

        fn job_page(&self, portal: Portal, listing: &ListingRecord) -> Result<String> {
            self.calls
                .borrow_mut()
                .push(format!("job {} {}", portal, listing.job_id));
            self.jobs
                .get(&listing.job_id)
                .cloned()
                .ok_or_else(|| Error::fetch(&listing.relative_url, "HTTP 404"))
        }
    }

    #[test]
    fn test_run_in_portal_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut source = MemorySource {
            calls: calls.clone(),
            ..Default::default()
        };
        source.search.insert(
            Portal::JobsAtCity,
            vec![search_page(&["1", "2"]), search_page(&["3"]), MARKER.to_string()],
        );
        source
            .search
            .insert(Portal::Recreation, vec![MARKER.to_string()]);

        let orchestrator = PortalOrchestrator::new(Box::new(source), ScrapeConfig::default());
        let listings = orchestrator
            .run(&[Portal::Recreation, Portal::JobsAtCity])
            .unwrap();

        let ids: Vec<&str> = listings[&Portal::JobsAtCity]
            .iter()
            .map(|r| r.job_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(listings[&Portal::Recreation].is_empty());

        assert_eq!(
            *calls.borrow(),
            vec![
                "search recreation 0",
                "search jobsatcity 0",
                "search jobsatcity 1",
                "search jobsatcity 2",
            ]
        );
    }

    #[test]
    fn test_duplicate_job_id_fails() {
        let mut source = MemorySource::default();
        source.search.insert(
            Portal::JobsAtCity,
            vec![search_page(&["1", "2"]), search_page(&["2"]), MARKER.to_string()],
        );

        let orchestrator = PortalOrchestrator::new(Box::new(source), ScrapeConfig::default());
        match orchestrator.run(&[Portal::JobsAtCity]) {
            Err(Error::Extraction(msg)) => assert!(msg.contains("duplicate job id 2"), "{msg}"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn test_same_id_on_two_portals_is_fine() {
        let mut source = MemorySource::default();
        source.search.insert(
            Portal::JobsAtCity,
            vec![search_page(&["1"]), MARKER.to_string()],
        );
        source.search.insert(
            Portal::Recreation,
            vec![search_page(&["1"]), MARKER.to_string()],
        );

        let orchestrator = PortalOrchestrator::new(Box::new(source), ScrapeConfig::default());
        let listings = orchestrator.run(&Portal::all()).unwrap();
        assert_eq!(listings.values().map(Vec::len).sum::<usize>(), 2);
    }

    #[test]
    fn test_error_aborts_run() {
        let mut source = MemorySource::default();
        source.search.insert(
            Portal::JobsAtCity,
            vec![search_page(&["1"]), MARKER.to_string()],
        );

        let orchestrator = PortalOrchestrator::new(Box::new(source), ScrapeConfig::default());
        assert!(matches!(
            orchestrator.run(&[Portal::JobsAtCity, Portal::Recreation]),
            Err(Error::Fetch { .. })
        ));
    }

    #[test]
    fn test_bad_tile_stops_before_next_portal() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut source = MemorySource {
            calls: calls.clone(),
            ..Default::default()
        };
        source.search.insert(
            Portal::JobsAtCity,
            vec![
                search_page(&["1"]).replace("Jan 05, 2024", "05/01/2024"),
                MARKER.to_string(),
            ],
        );
        source.search.insert(
            Portal::Recreation,
            vec![search_page(&["2"]), MARKER.to_string()],
        );

        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::new(dir.path());
        let orchestrator =
            PortalOrchestrator::new(Box::new(source), ScrapeConfig::default()).with_store(store.clone());

        assert!(matches!(
            orchestrator.run(&[Portal::JobsAtCity, Portal::Recreation]),
            Err(Error::Extraction(_))
        ));
        assert_eq!(
            *calls.borrow(),
            vec!["search jobsatcity 0", "search jobsatcity 1"]
        );
        assert!(!store.search_dir(Portal::Recreation).exists());
    }

    #[test]
    fn test_pages_are_archived_and_replayable() {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::new(dir.path());

        let mut source = MemorySource::default();
        source.search.insert(
            Portal::Recreation,
            vec![search_page(&["10"]), search_page(&["11"]), MARKER.to_string()],
        );
        let live = PortalOrchestrator::new(Box::new(source), ScrapeConfig::default())
            .with_store(store.clone());
        let pages = live.collect_pages(&[Portal::Recreation]).unwrap();
        assert_eq!(pages[&Portal::Recreation].len(), 2);
        assert!(store.search_page_path(Portal::Recreation, 1).is_file());
        assert!(!store.search_page_path(Portal::Recreation, 2).exists());

        let replay = PortalOrchestrator::new(
            Box::new(DirectoryPageSource::new(store)),
            ScrapeConfig::default(),
        );
        let listings = replay.run(&[Portal::Recreation]).unwrap();
        assert_eq!(listings, live.extract_pages(&pages).unwrap());
    }

    #[test]
    fn test_collect_details_reports_closed_and_failed() {
        let mut source = MemorySource::default();
        source.jobs.insert(
            "1".into(),
            detail_page(&["Job Type: Permanent", "Job Summary", "Hours: 35"]),
        );
        source.jobs.insert(
            "2".into(),
            "<html><body>Sorry, this job posting has ended</body></html>".into(),
        );
        source
            .jobs
            .insert("3".into(), "<html><body>maintenance</body></html>".into());

        let mut listings = ListingsByPortal::new();
        listings.insert(
            Portal::JobsAtCity,
            vec![
                listing(Portal::JobsAtCity, "1"),
                listing(Portal::JobsAtCity, "2"),
                listing(Portal::JobsAtCity, "3"),
            ],
        );

        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::new(dir.path());
        let orchestrator =
            PortalOrchestrator::new(Box::new(source), ScrapeConfig::default()).with_store(store.clone());
        let report = orchestrator.collect_details(&listings, None).unwrap();

        let details = &report.details[&Portal::JobsAtCity];
        assert_eq!(details.len(), 1);
        assert_eq!(details["1"].get("job type"), Some("Permanent"));
        assert_eq!(details["1"].get("hours"), None);

        assert_eq!(report.closed, vec![(Portal::JobsAtCity, "2".to_string())]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].1, "3");

        assert!(store.job_page_path(Portal::JobsAtCity, "3").is_file());
    }

    #[test]
    fn test_collect_details_limit_and_fetch_error() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut source = MemorySource {
            calls: calls.clone(),
            ..Default::default()
        };
        source.jobs.insert("a".into(), detail_page(&["Hours: 35"]));

        let mut listings = ListingsByPortal::new();
        listings.insert(
            Portal::JobsAtCity,
            vec![listing(Portal::JobsAtCity, "a"), listing(Portal::JobsAtCity, "b")],
        );
        listings.insert(Portal::Recreation, vec![listing(Portal::Recreation, "a")]);

        let orchestrator = PortalOrchestrator::new(Box::new(source), ScrapeConfig::default());

        let report = orchestrator.collect_details(&listings, Some(1)).unwrap();
        assert_eq!(*calls.borrow(), vec!["job jobsatcity a", "job recreation a"]);
        assert_eq!(report.details[&Portal::Recreation]["a"].get("hours"), Some("35"));

        assert!(matches!(
            orchestrator.collect_details(&listings, None),
            Err(Error::Fetch { .. })
        ));
    }

    #[test]
    fn test_local_source_is_not_paced() {
        let mut source = MemorySource::default();
        source.search.insert(Portal::JobsAtCity, vec![MARKER.to_string()]);
        source.search.insert(Portal::Recreation, vec![MARKER.to_string()]);
        source.jobs.insert("a".into(), detail_page(&[]));

        let config = ScrapeConfig {
            inter_portal_delay: Duration::from_secs(60),
            detail_delay: Duration::from_secs(60),
            ..ScrapeConfig::default()
        };
        let orchestrator = PortalOrchestrator::new(Box::new(source), config);

        let started = std::time::Instant::now();
        orchestrator.run(&Portal::all()).unwrap();
        let mut listings = ListingsByPortal::new();
        listings.insert(
            Portal::JobsAtCity,
            vec![listing(Portal::JobsAtCity, "a"), listing(Portal::JobsAtCity, "a")],
        );
        orchestrator.collect_details(&listings, None).unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
