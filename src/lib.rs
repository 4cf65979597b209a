//! Scraper for the City of Toronto job boards
//!
//! Walks the paginated search results of each job portal, extracts one
//! [`ListingRecord`] per job tile and, optionally, the key/value header of
//! each posting's detail page:
//! - [`source`]: where raw HTML comes from (network or a local archive)
//! - [`pagination`]: walking a portal's search pages up to the end marker
//! - [`extractors`]: search-page tiles and detail-page headers
//! - [`orchestrator`]: multi-portal runs and the detail flow
//! - [`store`]: on-disk archive and JSON output

pub mod config;
pub mod error;
pub mod extractors;
pub mod models;
pub mod orchestrator;
pub mod pagination;
pub mod portal;
pub mod source;
pub mod store;

pub use config::ScrapeConfig;
pub use error::{Error, Result};
pub use extractors::{extract_details, extract_listings, DetailOutcome};
pub use models::{DetailRecord, DetailsByPortal, ListingRecord, ListingsByPortal, PagesByPortal};
pub use orchestrator::{DetailReport, PortalOrchestrator};
pub use pagination::PaginationDriver;
pub use portal::Portal;
pub use source::{DirectoryPageSource, HttpPageSource, PageFetch, PageSource};
pub use store::PageStore;
