//! Hosted resources for Stowage.
//!
//! This module provides the resource store the policy engine aggregates over:
//! - Uploaded files (which consume storage)
//! - Short links (counted, but weightless)
//!
//! Callers persist a resource only after the policy engine has admitted it.

mod file;
mod short_link;

pub use file::{FileRecord, FileRecordRepository, NewFileRecord};
pub use short_link::{NewShortLink, ShortLink, ShortLinkRepository};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A count-limited resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// Uploaded files.
    Files,
    /// Shortened links.
    ShortLink,
}

impl ResourceKind {
    /// Every resource kind, in reporting order.
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Files, ResourceKind::ShortLink];

    /// Identifier used in messages and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Files => "files",
            ResourceKind::ShortLink => "shortLink",
        }
    }

    /// Human-readable plural.
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Files => "files",
            ResourceKind::ShortLink => "short links",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" | "file" => Ok(ResourceKind::Files),
            "shortLink" | "shortLinks" | "short_link" | "short_links" => {
                Ok(ResourceKind::ShortLink)
            }
            _ => Err(format!("unknown resource kind: {s}")),
        }
    }
}
