//! Where raw HTML comes from
//!
//! A [`PageSource`] hands out search pages by `(portal, page index)` and
//! job-detail pages by `(portal, listing)`. The orchestrator does not care
//! whether the text comes off the network or out of the archive; it only
//! asks [`PageSource::is_remote`] to decide whether to pace itself.

mod directory;
mod http;

pub use directory::DirectoryPageSource;
pub use http::HttpPageSource;

use crate::error::Result;
use crate::models::ListingRecord;
use crate::portal::Portal;

/// Outcome of asking for one search page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    Page(String),
    /// No page at this index; pagination is over
    Exhausted,
}

pub trait PageSource {
    fn search_page(&self, portal: Portal, page_index: u32) -> Result<PageFetch>;

    fn job_page(&self, portal: Portal, listing: &ListingRecord) -> Result<String>;

    /// Whether calls hit a remote server and callers should sleep between them
    fn is_remote(&self) -> bool {
        false
    }
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn search_page(&self, portal: Portal, page_index: u32) -> Result<PageFetch> {
        (**self).search_page(portal, page_index)
    }

    fn job_page(&self, portal: Portal, listing: &ListingRecord) -> Result<String> {
        (**self).job_page(portal, listing)
    }

    fn is_remote(&self) -> bool {
        (**self).is_remote()
    }
}
