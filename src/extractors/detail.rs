//! Job-detail page header
//!
//! The description body opens with a list of `Label: value` items (job id,
//! division, hours, salary, ...) before the prose sections start. We keep
//! that list and stop at the first section heading.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::css_extractor::{compile, document_text, element_text, first_match};
use crate::error::{Error, Result};
use crate::models::DetailRecord;

/// Text shown in place of the description once a posting is closed
pub const CLOSED_POSTING_PHRASE: &str = "Sorry, this job posting has ended";

/// List items containing any of these end the header
pub const SECTION_BOUNDARIES: [&str; 2] = ["Job Summary", "Major Responsibilities"];

static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| compile(".jobdescription"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| compile("li"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Details(DetailRecord),
    /// The posting has ended; not an error, callers skip it
    Closed,
}

pub fn extract_details(html: &str) -> Result<DetailOutcome> {
    let document = Html::parse_document(html);

    if document_text(&document).contains(CLOSED_POSTING_PHRASE) {
        return Ok(DetailOutcome::Closed);
    }

    let description = first_match(document.root_element(), &DESCRIPTION)
        .ok_or_else(|| Error::extraction("job description section not found"))?;

    let mut details = DetailRecord::default();
    for item in description.select(&LIST_ITEM) {
        let text = element_text(item);

        if SECTION_BOUNDARIES.iter().any(|b| text.contains(b)) {
            break;
        }

        if let Some((key, value)) = text.split_once(':') {
            details.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Ok(DetailOutcome::Details(details))
}
