//! `site-data.json` assembly.
//!
//! The renderer is an external collaborator. Its whole contract with sitepress
//! is this document: the manifest's own data, the ordered page index and a
//! whole-site navigation summary.

use std::path::Path;

use tracing::{debug, info, instrument};

use sitepress_shared::{
    Manifest, NavigationSummary, Result, SiteData, SiteMetadata, SitepressError,
};

use crate::navigation::{first_page, last_page};
use crate::page_index::PageIndex;

/// Build the renderer document from a manifest and its page index.
#[instrument(skip_all, fields(pages = index.len()))]
pub fn assemble_site_data(
    manifest: &Manifest,
    index: &PageIndex,
    api_base: &str,
    site: &SiteMetadata,
) -> SiteData {
    let navigation = NavigationSummary {
        first_page: first_page(index).cloned(),
        last_page: last_page(index).cloned(),
        total_pages: index.len(),
    };

    SiteData {
        meta: manifest.meta.clone(),
        chapters: manifest.chapters.clone(),
        all_pages: index.as_slice().to_vec(),
        navigation,
        social_links: manifest.social_links.clone(),
        nav_links: manifest.nav_links.clone(),
        api_base: api_base.to_string(),
        site: site.clone(),
    }
}

/// Write the document as pretty JSON. Written to a temp file first, then
/// renamed into place, so the renderer never sees a half-written file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_site_data(path: &Path, data: &SiteData) -> Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(|e| {
        SitepressError::validation(format!("JSON serialization failed: {e}"))
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SitepressError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SitepressError::config(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| SitepressError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| SitepressError::io(path, e))?;

    debug!(temp = %temp.display(), "renamed temp file into place");
    info!(
        pages = data.navigation.total_pages,
        chapters = data.chapters.len(),
        "site data written"
    );

    Ok(())
}
