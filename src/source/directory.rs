//! Pages read back from a previous download

use tracing::debug;

use super::{PageFetch, PageSource};
use crate::error::{Error, Result};
use crate::models::ListingRecord;
use crate::portal::Portal;
use crate::store::{read_text, PageStore};

#[derive(Debug, Clone)]
pub struct DirectoryPageSource {
    store: PageStore,
}

impl DirectoryPageSource {
    pub fn new(store: PageStore) -> Self {
        Self { store }
    }
}

impl PageSource for DirectoryPageSource {
    /// A missing portal directory is an error (nothing was ever downloaded);
    /// a missing page inside it marks the end of the archived set.
    fn search_page(&self, portal: Portal, page_index: u32) -> Result<PageFetch> {
        let dir = self.store.search_dir(portal);
        if !dir.is_dir() {
            return Err(Error::NotFound { path: dir });
        }

        let path = self.store.search_page_path(portal, page_index);
        match read_text(&path) {
            Ok(page) => Ok(PageFetch::Page(page)),
            Err(Error::NotFound { .. }) => {
                debug!(portal = %portal, page_index, "no archived page, end of set");
                Ok(PageFetch::Exhausted)
            }
            Err(e) => Err(e),
        }
    }

    fn job_page(&self, portal: Portal, listing: &ListingRecord) -> Result<String> {
        read_text(&self.store.job_page_path(portal, &listing.job_id))
    }
}
