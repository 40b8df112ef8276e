//! Content model derivation for sitepress.
//!
//! Turns a fetched [`Manifest`](sitepress_shared::Manifest) into what the site
//! renderer consumes: an ordered page index, per-page navigation, and the
//! `site-data.json` document.

pub mod navigation;
pub mod page_index;
pub mod site_data;

pub use navigation::{NavigationLinks, first_page, last_page, next_page, previous_page, resolve};
pub use page_index::{PageIndex, build_page_index};
pub use site_data::{assemble_site_data, write_site_data};
