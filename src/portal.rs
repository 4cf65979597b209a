//! Job board portals
//!
//! Both portals live on the same host and share one page structure; they
//! differ only in the path slug, which the URL templates in
//! [`ScrapeConfig`](crate::config::ScrapeConfig) are expanded with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder replaced with the portal slug in URL templates
pub const PORTAL_PLACEHOLDER: &str = "{portal}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Portal {
    #[serde(rename = "jobsatcity")]
    JobsAtCity,
    #[serde(rename = "recreation")]
    Recreation,
}

struct PortalEntry {
    portal: Portal,
    slug: &'static str,
    label: &'static str,
}

/// Declared order is the order portals are scraped in.
const PORTALS: &[PortalEntry] = &[
    PortalEntry {
        portal: Portal::JobsAtCity,
        slug: "jobsatcity",
        label: "Jobs at the City",
    },
    PortalEntry {
        portal: Portal::Recreation,
        slug: "recreation",
        label: "Recreation",
    },
];

impl Portal {
    pub fn all() -> Vec<Portal> {
        PORTALS.iter().map(|e| e.portal).collect()
    }

    fn entry(self) -> &'static PortalEntry {
        // rows are in discriminant order
        &PORTALS[self as usize]
    }

    pub fn slug(self) -> &'static str {
        self.entry().slug
    }

    pub fn label(self) -> &'static str {
        self.entry().label
    }

    /// Expand a `{portal}` URL template for this portal
    pub fn expand(self, template: &str) -> String {
        template.replace(PORTAL_PLACEHOLDER, self.slug())
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Portal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        PORTALS
            .iter()
            .find(|e| e.slug == wanted)
            .map(|e| e.portal)
            .ok_or_else(|| {
                let known: Vec<&str> = PORTALS.iter().map(|e| e.slug).collect();
                Error::Config(format!(
                    "unknown portal '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}
