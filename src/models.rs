//! Records produced by the extractors

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::portal::Portal;

/// Format of posting dates on search pages and in persisted JSON
pub const POSTING_DATE_FORMAT: &str = "%b %d, %Y";

/// Raw search pages of each portal, in page order
pub type PagesByPortal = BTreeMap<Portal, Vec<String>>;

/// Listings of each portal, in page-then-document order
pub type ListingsByPortal = BTreeMap<Portal, Vec<ListingRecord>>;

/// Detail records of each portal, keyed by job id
pub type DetailsByPortal = BTreeMap<Portal, BTreeMap<String, DetailRecord>>;

/// One job tile from a search-results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub job_id: String,
    pub relative_url: String,
    pub title: String,
    pub job_stream: Option<String>,
    pub position_type: String,
    #[serde(with = "posting_date")]
    pub posting_date: NaiveDate,
    pub portal: Portal,
}

impl ListingRecord {
    /// Build a record, rejecting blank required fields.
    pub fn new(
        portal: Portal,
        job_id: impl Into<String>,
        relative_url: impl Into<String>,
        title: impl Into<String>,
        job_stream: Option<String>,
        position_type: impl Into<String>,
        posting_date: NaiveDate,
    ) -> Result<Self> {
        let record = ListingRecord {
            job_id: job_id.into(),
            relative_url: relative_url.into(),
            title: title.into(),
            job_stream,
            position_type: position_type.into(),
            posting_date,
            portal,
        };

        for (field, value) in [
            ("job_id", &record.job_id),
            ("relative_url", &record.relative_url),
            ("title", &record.title),
            ("position_type", &record.position_type),
        ] {
            if value.trim().is_empty() {
                return Err(Error::extraction(format!(
                    "{} listing has an empty {}",
                    portal, field
                )));
            }
        }

        Ok(record)
    }
}

/// Parse a posting date such as `"Jan 05, 2024"`
pub fn parse_posting_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), POSTING_DATE_FORMAT).map_err(|e| {
        Error::extraction(format!(
            "posting date '{}' does not match \"{}\": {}",
            text, POSTING_DATE_FORMAT, e
        ))
    })
}

mod posting_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::POSTING_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(POSTING_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_posting_date(&text).map_err(serde::de::Error::custom)
    }
}

/// Labelled fields from the header of a job-detail page.
///
/// Keys are lower-cased labels; the set of keys varies per posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailRecord(BTreeMap<String, String>);

impl DetailRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        self.0.insert(key, value);
    }
}

impl FromIterator<(String, String)> for DetailRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        DetailRecord(iter.into_iter().collect())
    }
}
