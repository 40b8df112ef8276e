//! Deploy bundle builder.
//!
//! Zips the *contents* of a build directory: entry names are relative to the
//! directory and never carry its own name as a prefix.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use sitepress_shared::{Result, SitepressError};

/// Deflate level used for bundles (maximum).
const COMPRESSION_LEVEL: i64 = 9;

/// Outcome of a successful archive build.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Where the bundle was written.
    pub path: PathBuf,
    /// Number of regular files stored.
    pub files: usize,
    /// Sum of the source file sizes.
    pub uncompressed_bytes: u64,
    /// Size of the bundle on disk.
    pub compressed_bytes: u64,
    /// Hex SHA-256 of the bundle.
    pub sha256: String,
}

impl ArchiveSummary {
    /// Bundle size in MiB, for display.
    pub fn size_mb(&self) -> f64 {
        self.compressed_bytes as f64 / 1024.0 / 1024.0
    }
}

/// Running totals while entries are written.
#[derive(Debug, Default)]
struct EntryStats {
    files: usize,
    directories: usize,
    uncompressed_bytes: u64,
}

/// Zip every file under `source_dir` into `archive_path`.
///
/// Entries are written in sorted walk order so the file set and names are
/// the same for the same tree. Empty directories get an explicit `dir/`
/// entry; other directories are implied by their files. If `archive_path`
/// lies inside `source_dir` it is left out of its own bundle.
///
/// On failure the partially written bundle is removed before returning.
#[instrument(skip_all, fields(source = %source_dir.display(), archive = %archive_path.display()))]
pub fn build_archive(source_dir: &Path, archive_path: &Path) -> Result<ArchiveSummary> {
    if !source_dir.is_dir() {
        return Err(SitepressError::SourceNotFound {
            path: source_dir.to_path_buf(),
        });
    }

    info!("creating ZIP bundle");

    let root = source_dir
        .canonicalize()
        .map_err(|e| SitepressError::archive(source_dir, e.to_string()))?;

    if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| SitepressError::archive(parent, e.to_string()))?;
    }

    let file = File::create(archive_path)
        .map_err(|e| SitepressError::archive(archive_path, e.to_string()))?;
    // Exists now, so it can be resolved and compared against walk entries.
    let archive_abs = archive_path
        .canonicalize()
        .unwrap_or_else(|_| archive_path.to_path_buf());

    let stats = match write_entries(&root, &archive_abs, file) {
        Ok(stats) => stats,
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(archive_path) {
                debug!(error = %rm, "could not remove partial bundle");
            }
            return Err(e);
        }
    };

    let (compressed_bytes, sha256) = digest_file(archive_path)?;

    let summary = ArchiveSummary {
        path: archive_path.to_path_buf(),
        files: stats.files,
        uncompressed_bytes: stats.uncompressed_bytes,
        compressed_bytes,
        sha256,
    };

    info!(
        files = summary.files,
        empty_dirs = stats.directories,
        uncompressed_bytes = summary.uncompressed_bytes,
        size_mb = %format!("{:.2}", summary.size_mb()),
        "ZIP created"
    );

    Ok(summary)
}

/// Stream every entry under `root` into a zip written to `file`.
fn write_entries(root: &Path, archive_abs: &Path, file: File) -> Result<EntryStats> {
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    let mut stats = EntryStats::default();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            SitepressError::archive(path, e.to_string())
        })?;
        let path = entry.path();

        if path == archive_abs {
            debug!(path = %path.display(), "skipping the bundle itself");
            continue;
        }

        let name = entry_name(root, path)?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if is_empty_dir(path)? {
                zip.add_directory(format!("{name}/"), options)
                    .map_err(|e| SitepressError::archive(path, e.to_string()))?;
                stats.directories += 1;
            }
            continue;
        }

        if !file_type.is_file() {
            warn!(path = %path.display(), "skipping non-regular file");
            continue;
        }

        zip.start_file(name, options)
            .map_err(|e| SitepressError::archive(path, e.to_string()))?;

        let mut source =
            File::open(path).map_err(|e| SitepressError::archive(path, e.to_string()))?;
        let copied = std::io::copy(&mut source, &mut zip)
            .map_err(|e| SitepressError::archive(path, e.to_string()))?;

        stats.files += 1;
        stats.uncompressed_bytes += copied;
        debug!(path = %path.display(), bytes = copied, "added file");
    }

    let mut writer = zip
        .finish()
        .map_err(|e| SitepressError::archive(archive_abs, e.to_string()))?;
    writer
        .flush()
        .map_err(|e| SitepressError::archive(archive_abs, e.to_string()))?;

    Ok(stats)
}

/// Archive entry name for `path`: relative to `root`, `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        SitepressError::archive(path, format!("entry is outside {}", root.display()))
    })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries =
        std::fs::read_dir(path).map_err(|e| SitepressError::archive(path, e.to_string()))?;
    Ok(entries.next().is_none())
}

/// Size and SHA-256 of a finished bundle.
fn digest_file(path: &Path) -> Result<(u64, String)> {
    let mut file = File::open(path).map_err(|e| SitepressError::archive(path, e.to_string()))?;
    let mut hasher = Sha256::new();
    let size = std::io::copy(&mut file, &mut hasher)
        .map_err(|e| SitepressError::archive(path, e.to_string()))?;
    Ok((size, format!("{:x}", hasher.finalize())))
}
