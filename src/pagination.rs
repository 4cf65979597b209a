//! Walking the search pages of one portal
//!
//! Past the last page of results the board answers with a bare doctype
//! instead of an empty list. That page ends the walk and is dropped, as
//! does [`PageFetch::Exhausted`] from sources that know their own end.

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Result;
use crate::portal::Portal;
use crate::source::{PageFetch, PageSource};

/// Body of the page served past the last page of results
pub const END_MARKER: &str = "<!DOCTYPE HTML>";

/// Whether `page` is the end-of-results marker
pub fn is_end_marker(page: &str) -> bool {
    page.trim().to_lowercase() == END_MARKER.to_lowercase()
}

pub struct PaginationDriver<'a, S: PageSource + ?Sized> {
    source: &'a S,
    inter_request_delay: Duration,
}

impl<'a, S: PageSource + ?Sized> PaginationDriver<'a, S> {
    pub fn new(source: &'a S, inter_request_delay: Duration) -> Self {
        Self {
            source,
            inter_request_delay,
        }
    }

    /// Every search page of `portal` in index order, marker excluded.
    ///
    /// There is no page cap; a board that never serves the marker keeps
    /// the walk going. Fetch errors propagate as-is.
    pub fn collect_all_pages(&self, portal: Portal) -> Result<Vec<String>> {
        let mut pages = Vec::new();
        let mut page_index = 0u32;

        loop {
            let page = match self.source.search_page(portal, page_index)? {
                PageFetch::Exhausted => break,
                PageFetch::Page(page) if is_end_marker(&page) => {
                    debug!(portal = %portal, page_index, "end marker");
                    break;
                }
                PageFetch::Page(page) => page,
            };

            pages.push(page);
            page_index += 1;

            if self.source.is_remote() && !self.inter_request_delay.is_zero() {
                thread::sleep(self.inter_request_delay);
            }
        }

        info!(portal = %portal, pages = pages.len(), "collected search pages");
        Ok(pages)
    }
}
