//! Previous/next/first/last resolution over a [`PageIndex`].
//!
//! Everything here is a pure function of the index and a slug. Unknown slugs
//! are not an error: they simply have no neighbours.

use serde::Serialize;

use sitepress_shared::PageRecord;

use crate::page_index::PageIndex;

/// Navigation view for one page. Borrowed from the index, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavigationLinks<'a> {
    pub previous: Option<&'a PageRecord>,
    pub next: Option<&'a PageRecord>,
    pub first: Option<&'a PageRecord>,
    pub last: Option<&'a PageRecord>,
}

/// Resolve all four links for `slug`.
pub fn resolve<'a>(index: &'a PageIndex, slug: &str) -> NavigationLinks<'a> {
    let position = index.position(slug);

    NavigationLinks {
        previous: position.and_then(|p| before(index, p)),
        next: position.and_then(|p| after(index, p)),
        first: first_page(index),
        last: last_page(index),
    }
}

/// The page before `slug`, if `slug` is in the index and not first.
pub fn previous_page<'a>(index: &'a PageIndex, slug: &str) -> Option<&'a PageRecord> {
    index.position(slug).and_then(|p| before(index, p))
}

/// The page after `slug`, if `slug` is in the index and not last.
pub fn next_page<'a>(index: &'a PageIndex, slug: &str) -> Option<&'a PageRecord> {
    index.position(slug).and_then(|p| after(index, p))
}

pub fn first_page(index: &PageIndex) -> Option<&PageRecord> {
    index.get(0)
}

pub fn last_page(index: &PageIndex) -> Option<&PageRecord> {
    index.len().checked_sub(1).and_then(|p| index.get(p))
}

fn before(index: &PageIndex, position: usize) -> Option<&PageRecord> {
    position.checked_sub(1).and_then(|p| index.get(p))
}

fn after(index: &PageIndex, position: usize) -> Option<&PageRecord> {
    index.get(position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Map;
    use sitepress_shared::ChapterId;

    fn index_of(slugs: &[&str]) -> PageIndex {
        PageIndex::new(
            slugs
                .iter()
                .map(|s| PageRecord {
                    slug: (*s).to_string(),
                    chapter_id: ChapterId::from(1_u64),
                    chapter_title: "Prologue".into(),
                    fields: Map::new(),
                })
                .collect(),
        )
    }

    fn slug_of(record: Option<&PageRecord>) -> Option<&str> {
        record.map(|r| r.slug.as_str())
    }

    #[test]
    fn middle_page_has_both_neighbours() {
        let index = index_of(&["a", "b", "c"]);
        let links = resolve(&index, "b");

        assert_eq!(slug_of(links.previous), Some("a"));
        assert_eq!(slug_of(links.next), Some("c"));
        assert_eq!(slug_of(links.first), Some("a"));
        assert_eq!(slug_of(links.last), Some("c"));
    }

    #[test]
    fn ends_have_one_neighbour() {
        let index = index_of(&["a", "b", "c"]);

        let first = resolve(&index, "a");
        assert_eq!(first.previous, None);
        assert_eq!(slug_of(first.next), Some("b"));

        let last = resolve(&index, "c");
        assert_eq!(slug_of(last.previous), Some("b"));
        assert_eq!(last.next, None);
    }

    #[test]
    fn single_page_has_no_neighbours() {
        let index = index_of(&["only"]);
        let links = resolve(&index, "only");

        assert_eq!(links.previous, None);
        assert_eq!(links.next, None);
        assert_eq!(slug_of(links.first), Some("only"));
        assert_eq!(slug_of(links.last), Some("only"));
    }

    #[test]
    fn unknown_slug_is_permissive() {
        let index = index_of(&["a", "b"]);
        let links = resolve(&index, "nope");

        assert_eq!(links.previous, None);
        assert_eq!(links.next, None);
        assert_eq!(slug_of(links.first), Some("a"));
        assert_eq!(slug_of(links.last), Some("b"));
    }

    #[test]
    fn empty_index_has_nothing() {
        let index = PageIndex::default();
        for slug in ["", "a", "cover"] {
            let links = resolve(&index, slug);
            assert_eq!(links.previous, None);
            assert_eq!(links.next, None);
            assert_eq!(links.first, None);
            assert_eq!(links.last, None);
        }
    }

    #[test]
    fn single_link_helpers_agree_with_resolve() {
        let index = index_of(&["a", "b", "c"]);
        assert_eq!(slug_of(previous_page(&index, "c")), Some("b"));
        assert_eq!(slug_of(next_page(&index, "a")), Some("b"));
        assert_eq!(next_page(&index, "missing"), None);
    }

    #[test]
    fn links_serialize_with_nulls() {
        let index = index_of(&["a", "b"]);
        let value = serde_json::to_value(resolve(&index, "a")).unwrap();
        assert!(value["previous"].is_null());
        assert_eq!(value["next"]["slug"], "b");
    }

    proptest! {
        #[test]
        fn neighbours_are_inverse(len in 1usize..40, pick in any::<prop::sample::Index>()) {
            let owned: Vec<String> = (0..len).map(|i| format!("page-{i}")).collect();
            let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
            let index = index_of(&refs);

            let position = pick.index(len);
            let slug = &owned[position];

            if let Some(prev) = previous_page(&index, slug) {
                prop_assert_eq!(slug_of(next_page(&index, &prev.slug)), Some(slug.as_str()));
            }
            if let Some(next) = next_page(&index, slug) {
                prop_assert_eq!(slug_of(previous_page(&index, &next.slug)), Some(slug.as_str()));
            }

            prop_assert_eq!(slug_of(first_page(&index)), Some(owned[0].as_str()));
            prop_assert_eq!(slug_of(last_page(&index)), Some(owned[len - 1].as_str()));

            // Pure: resolving twice gives the same answer.
            prop_assert_eq!(resolve(&index, slug), resolve(&index, slug));
        }
    }
}
