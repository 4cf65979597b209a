//! HTML extraction
//!
//! Each module reads one kind of page:
//! - `listing`: job tiles on a search-results page
//! - `detail`: the labelled header of a job-detail page
//!
//! `css_extractor` holds the small selector helpers both share.

mod css_extractor;
mod detail;
mod listing;

pub use detail::*;
pub use listing::*;
