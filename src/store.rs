//! On-disk archive of raw pages and parsed records
//!
//! Layout under the storage root:
//!
//! ```text
//! search/<portal>/<page index>.html
//! job/<portal>/<job id>.html
//! parsed_jobs.json
//! parsed_job_details.json
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{DetailsByPortal, ListingsByPortal};
use crate::portal::Portal;

const SEARCH_DIR: &str = "search";
const JOB_DIR: &str = "job";
pub const LISTINGS_FILE: &str = "parsed_jobs.json";
pub const DETAILS_FILE: &str = "parsed_job_details.json";

#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn search_dir(&self, portal: Portal) -> PathBuf {
        self.root.join(SEARCH_DIR).join(portal.slug())
    }

    pub fn search_page_path(&self, portal: Portal, page_index: u32) -> PathBuf {
        self.search_dir(portal).join(format!("{}.html", page_index))
    }

    pub fn job_dir(&self, portal: Portal) -> PathBuf {
        self.root.join(JOB_DIR).join(portal.slug())
    }

    pub fn job_page_path(&self, portal: Portal, job_id: &str) -> PathBuf {
        self.job_dir(portal).join(format!("{}.html", job_id))
    }

    pub fn listings_path(&self) -> PathBuf {
        self.root.join(LISTINGS_FILE)
    }

    pub fn details_path(&self) -> PathBuf {
        self.root.join(DETAILS_FILE)
    }

    /// Write one portal's search pages as `0.html`, `1.html`, ...
    pub fn write_search_pages(&self, portal: Portal, pages: &[String]) -> Result<()> {
        let dir = self.search_dir(portal);
        fs::create_dir_all(&dir)?;
        for (index, page) in pages.iter().enumerate() {
            fs::write(dir.join(format!("{}.html", index)), page)?;
        }
        debug!(portal = %portal, pages = pages.len(), dir = %dir.display(), "archived search pages");
        Ok(())
    }

    pub fn write_job_page(&self, portal: Portal, job_id: &str, page: &str) -> Result<()> {
        let dir = self.job_dir(portal);
        fs::create_dir_all(&dir)?;
        fs::write(self.job_page_path(portal, job_id), page)?;
        Ok(())
    }

    pub fn save_listings(&self, listings: &ListingsByPortal) -> Result<PathBuf> {
        let path = self.listings_path();
        write_json(&path, listings)?;
        Ok(path)
    }

    pub fn load_listings(&self) -> Result<ListingsByPortal> {
        read_json(&self.listings_path())
    }

    pub fn save_details(&self, details: &DetailsByPortal) -> Result<PathBuf> {
        let path = self.details_path();
        write_json(&path, details)?;
        Ok(path)
    }

    pub fn load_details(&self) -> Result<DetailsByPortal> {
        read_json(&self.details_path())
    }
}

/// Read a file, mapping a missing file to [`Error::NotFound`]
pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    Ok(serde_json::from_str(&text)?)
}
