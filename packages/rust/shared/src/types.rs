//! Core domain types: the CMS manifest and the page model derived from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SiteMetadata;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The `manifest.json` document published by the content API for one comic.
///
/// Chapter and page order in this document is significant and is preserved
/// by everything downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Site-level metadata (title, author, ...). Opaque to sitepress.
    #[serde(default)]
    pub meta: Value,
    /// Ordered chapters.
    pub chapters: Vec<Chapter>,
    /// Social links shown by the templates.
    #[serde(default)]
    pub social_links: Vec<Value>,
    /// Extra navigation links shown by the templates.
    #[serde(default)]
    pub nav_links: Vec<Value>,
}

impl Manifest {
    /// Total number of pages across all chapters.
    pub fn page_count(&self) -> usize {
        self.chapters.iter().map(|c| c.pages.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Chapter
// ---------------------------------------------------------------------------

/// Chapter identifier. The CMS emits either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChapterId {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ChapterId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<u64> for ChapterId {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// An ordered group of pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub pages: Vec<Page>,
    /// Any other chapter fields, passed through to the templates untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// A single comic page as published in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Identity key. Assumed unique across the whole manifest.
    pub slug: String,
    /// Content fields (image, title, publish date, ...). Opaque to sitepress.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A page enriched with its owning chapter, as emitted in the page index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub slug: String,
    pub chapter_id: ChapterId,
    pub chapter_title: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PageRecord {
    /// Look up one of the page's own content fields.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

// ---------------------------------------------------------------------------
// SiteData
// ---------------------------------------------------------------------------

/// Whole-site navigation helpers handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSummary {
    pub first_page: Option<PageRecord>,
    pub last_page: Option<PageRecord>,
    pub total_pages: usize,
}

/// The document the site renderer consumes (`site-data.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteData {
    pub meta: Value,
    pub chapters: Vec<Chapter>,
    /// Flattened, order-preserving page index.
    pub all_pages: Vec<PageRecord>,
    pub navigation: NavigationSummary,
    pub social_links: Vec<Value>,
    pub nav_links: Vec<Value>,
    /// Content API base the data was fetched from.
    pub api_base: String,
    pub site: SiteMetadata,
}
