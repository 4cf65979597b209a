//! Job tiles on a search-results page
//!
//! Every tile is an `li.job-tile` whose class list carries a `job-id-<id>`
//! token and whose `data-url` points at the detail page. The fields we keep
//! live in the tile's desktop sub-section; the mobile copy is ignored.
//!
//! Only the department/stream is optional. Any other missing piece means
//! the markup changed, so the whole page fails instead of quietly losing
//! postings.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::css_extractor::{compile, first_match, first_text};
use crate::error::{Error, Result};
use crate::models::{parse_posting_date, ListingRecord};
use crate::portal::Portal;

pub const JOB_ID_CLASS_PREFIX: &str = "job-id-";
pub const DETAIL_URL_ATTR: &str = "data-url";

static TILE: LazyLock<Selector> = LazyLock::new(|| compile("li.job-tile"));
static DESKTOP_SECTION: LazyLock<Selector> = LazyLock::new(|| compile("div.sub-section-desktop"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| compile("a.jobTitle-link"));
static DEPARTMENT: LazyLock<Selector> =
    LazyLock::new(|| compile(r#"div[id*="desktop-section-department-value"]"#));
static SHIFT_TYPE: LazyLock<Selector> =
    LazyLock::new(|| compile(r#"div[id*="desktop-section-shifttype-value"]"#));
static POSTING_DATE: LazyLock<Selector> =
    LazyLock::new(|| compile(r#"div[id*="desktop-section-date-value"]"#));

/// Extract every listing tile of one search page, in document order.
pub fn extract_listings(html: &str, portal: Portal) -> Result<Vec<ListingRecord>> {
    let document = Html::parse_document(html);

    document
        .select(&TILE)
        .enumerate()
        .map(|(index, tile)| extract_tile(tile, index, portal))
        .collect()
}

fn extract_tile(tile: ElementRef<'_>, index: usize, portal: Portal) -> Result<ListingRecord> {
    let job_id = job_id_from_classes(tile).map_err(|msg| tile_error(portal, index, None, &msg))?;
    let fail = |what: &str| tile_error(portal, index, Some(job_id.as_str()), what);

    let desktop = first_match(tile, &DESKTOP_SECTION)
        .ok_or_else(|| fail("missing desktop sub-section"))?;

    let relative_url = tile
        .value()
        .attr(DETAIL_URL_ATTR)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| fail("missing data-url attribute"))?;

    let title = first_text(desktop, &TITLE).ok_or_else(|| fail("missing job title link"))?;

    let job_stream = first_text(desktop, &DEPARTMENT).filter(|s| !s.is_empty());

    let position_type =
        first_text(desktop, &SHIFT_TYPE).ok_or_else(|| fail("missing position type"))?;

    let date_text =
        first_text(desktop, &POSTING_DATE).ok_or_else(|| fail("missing posting date"))?;
    let posting_date = parse_posting_date(&date_text).map_err(|e| match e {
        Error::Extraction(msg) => fail(&msg),
        other => other,
    })?;

    ListingRecord::new(
        portal,
        job_id.as_str(),
        relative_url,
        title,
        job_stream,
        position_type,
        posting_date,
    )
    .map_err(|e| match e {
        Error::Extraction(msg) => fail(&msg),
        other => other,
    })
}

/// The id carried by the tile's `job-id-` class token.
fn job_id_from_classes(tile: ElementRef<'_>) -> std::result::Result<String, String> {
    let mut ids = tile
        .value()
        .classes()
        .filter_map(|class| class.strip_prefix(JOB_ID_CLASS_PREFIX));

    let id = ids
        .next()
        .ok_or_else(|| format!("no {}* class", JOB_ID_CLASS_PREFIX))?;
    if id.is_empty() {
        return Err(format!("empty {}* class", JOB_ID_CLASS_PREFIX));
    }
    // the id names the archived job page on disk
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!("job id '{}' is not a plain token", id));
    }
    if let Some(other) = ids.find(|other| *other != id) {
        return Err(format!("conflicting job ids '{}' and '{}'", id, other));
    }

    Ok(id.to_string())
}

fn tile_error(portal: Portal, index: usize, job_id: Option<&str>, what: &str) -> Error {
    match job_id {
        Some(id) => Error::extraction(format!(
            "{} tile #{} (job {}): {}",
            portal, index, id, what
        )),
        None => Error::extraction(format!("{} tile #{}: {}", portal, index, what)),
    }
}
