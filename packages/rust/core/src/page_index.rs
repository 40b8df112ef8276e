//! Page index builder.
//!
//! Flattens the manifest's chapters into one ordered sequence of pages, each
//! enriched with its owning chapter's id and title. The index is the single
//! source of truth for navigation.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument};

use sitepress_shared::{Chapter, Manifest, Page, PageRecord};

/// Page fields that are overwritten by chapter enrichment.
const ENRICHMENT_KEYS: [&str; 2] = ["chapterId", "chapterTitle"];

/// Ordered, flattened sequence of every page in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageIndex {
    records: Vec<PageRecord>,
}

impl PageIndex {
    /// Wrap an already ordered list of records.
    pub fn new(records: Vec<PageRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&PageRecord> {
        self.records.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PageRecord> {
        self.records
    }

    /// Position of the first record with this slug (linear scan).
    pub fn position(&self, slug: &str) -> Option<usize> {
        self.records.iter().position(|r| r.slug == slug)
    }

    /// Slugs that occur more than once, in first-seen order.
    ///
    /// The index itself never rejects duplicates; this is an opt-in
    /// data-quality check for callers that want one.
    pub fn duplicate_slugs(&self) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for record in &self.records {
            let count = counts.entry(record.slug.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                order.push(record.slug.as_str());
            }
        }

        order
    }
}

impl<'a> IntoIterator for &'a PageIndex {
    type Item = &'a PageRecord;
    type IntoIter = std::slice::Iter<'a, PageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Flatten a manifest into its page index.
///
/// Chapters are visited in manifest order and pages in chapter order. No
/// sorting, filtering or deduplication happens; an empty manifest yields an
/// empty index.
#[instrument(skip_all, fields(chapters = manifest.chapters.len()))]
pub fn build_page_index(manifest: &Manifest) -> PageIndex {
    let records: Vec<PageRecord> = manifest
        .chapters
        .iter()
        .flat_map(|chapter| chapter.pages.iter().map(move |page| enrich(page, chapter)))
        .collect();

    debug!(pages = records.len(), "page index built");

    PageIndex { records }
}

/// Merge a page's fields with its chapter's identity.
fn enrich(page: &Page, chapter: &Chapter) -> PageRecord {
    let mut fields = page.fields.clone();
    for key in ENRICHMENT_KEYS {
        fields.remove(key);
    }

    PageRecord {
        slug: page.slug.clone(),
        chapter_id: chapter.id.clone(),
        chapter_title: chapter.title.clone(),
        fields,
    }
}
