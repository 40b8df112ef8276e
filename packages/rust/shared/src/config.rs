//! Application configuration for sitepress.
//!
//! User config lives at `~/.sitepress/sitepress.toml` (or `--config <path>`).
//! Flags and environment variables override config file values, which
//! override defaults. The resolved [`FetchConfig`] and [`DeployConfig`] are
//! built once at the process boundary and passed by value from there on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SitepressError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitepress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitepress";

/// Public content API used when `CMS_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.chimeracomics.org";

/// Generated site directory used when `BUILD_DIR` is not set.
pub const DEFAULT_BUILD_DIR: &str = "_site";

/// Where the deploy bundle is written for the duration of a run.
pub const DEFAULT_ARCHIVE_PATH: &str = "site-bundle.zip";

// ---------------------------------------------------------------------------
// Config structs (matching sitepress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
///
/// Has no field for the deploy secret, which is only read from
/// `DEPLOY_SECRET` / `--secret`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content source settings.
    #[serde(default)]
    pub manifest: ManifestSection,

    /// Deployment target settings.
    #[serde(default)]
    pub deploy: DeploySection,

    /// Site metadata for feeds and SEO.
    #[serde(default)]
    pub site: SiteMetadata,
}

/// `[manifest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSection {
    /// Content API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Comic to publish. No default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comic_slug: Option<String>,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            comic_slug: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

/// `[deploy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySection {
    /// Deployer endpoint URL. No default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Directory holding the generated site.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Temporary bundle location.
    #[serde(default = "default_archive_path")]
    pub archive_path: String,
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            url: None,
            build_dir: default_build_dir(),
            archive_path: default_archive_path(),
        }
    }
}

fn default_build_dir() -> String {
    DEFAULT_BUILD_DIR.into()
}
fn default_archive_path() -> String {
    DEFAULT_ARCHIVE_PATH.into()
}

/// `[site]` section. Also emitted verbatim into `site-data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMetadata {
    /// Public URL of the generated site.
    #[serde(default = "default_site_url")]
    pub url: String,

    /// Content language.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for SiteMetadata {
    fn default() -> Self {
        Self {
            url: default_site_url(),
            language: default_language(),
        }
    }
}

fn default_site_url() -> String {
    "https://example.com".into()
}
fn default_language() -> String {
    "en".into()
}

// ---------------------------------------------------------------------------
// FetchConfig
// ---------------------------------------------------------------------------

/// Resolved content-source settings. Always holds a valid base URL and a
/// non-empty comic slug.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    api_base: Url,
    comic_slug: String,
}

impl FetchConfig {
    /// Validate and build a fetch config.
    pub fn new(api_base: &str, comic_slug: Option<&str>) -> Result<Self> {
        let comic_slug = match comic_slug.map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => {
                return Err(SitepressError::config(
                    "COMIC_SLUG environment variable is required",
                ));
            }
        };

        let api_base = parse_http_url("CMS_API_URL", api_base)?;

        Ok(Self {
            api_base,
            comic_slug,
        })
    }

    /// Merge flag/env values over the config file.
    pub fn resolve(
        config: &AppConfig,
        api_url: Option<String>,
        comic_slug: Option<String>,
    ) -> Result<Self> {
        let api_url = api_url.unwrap_or_else(|| config.manifest.api_url.clone());
        let comic_slug = comic_slug.or_else(|| config.manifest.comic_slug.clone());
        Self::new(&api_url, comic_slug.as_deref())
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn comic_slug(&self) -> &str {
        &self.comic_slug
    }
}

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

/// Everything one deployment run needs. Never mutated after construction.
#[derive(Clone)]
pub struct DeployConfig {
    /// Deployer endpoint receiving the multipart upload.
    pub endpoint_url: String,
    /// Shared secret sent alongside the bundle.
    pub shared_secret: String,
    /// Generated site directory to package.
    pub source_dir: PathBuf,
    /// Where the bundle is written while the run is in flight.
    pub archive_path: PathBuf,
}

impl DeployConfig {
    /// Merge flag/env values over the config file and validate the result.
    pub fn resolve(
        config: &AppConfig,
        endpoint_url: Option<String>,
        shared_secret: Option<String>,
        source_dir: Option<PathBuf>,
        archive_path: Option<PathBuf>,
    ) -> Result<Self> {
        let resolved = Self {
            endpoint_url: endpoint_url
                .or_else(|| config.deploy.url.clone())
                .unwrap_or_default(),
            shared_secret: shared_secret.unwrap_or_default(),
            source_dir: source_dir.unwrap_or_else(|| PathBuf::from(&config.deploy.build_dir)),
            archive_path: archive_path
                .unwrap_or_else(|| PathBuf::from(&config.deploy.archive_path)),
        };
        resolved.validate()?;
        Ok(resolved)
    }

    /// Check that the required settings are present and return the parsed
    /// endpoint URL.
    pub fn validate(&self) -> Result<Url> {
        if self.endpoint_url.trim().is_empty() {
            return Err(SitepressError::config(
                "DEPLOY_URL environment variable is required",
            ));
        }
        if self.shared_secret.is_empty() {
            return Err(SitepressError::config(
                "DEPLOY_SECRET environment variable is required",
            ));
        }
        parse_http_url("DEPLOY_URL", self.endpoint_url.trim())
    }
}

impl std::fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("shared_secret", &"<redacted>")
            .field("source_dir", &self.source_dir)
            .field("archive_path", &self.archive_path)
            .finish()
    }
}

/// Parse an absolute http(s) URL, naming the setting on failure.
fn parse_http_url(setting: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| SitepressError::config(format!("{setting} is not a valid URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SitepressError::config(format!(
            "{setting} must use http or https, got '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitepress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SitepressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitepress/sitepress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SitepressError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SitepressError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SitepressError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SitepressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SitepressError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("api_url"));
        assert!(toml_str.contains("build_dir = \"_site\""));
        assert!(!toml_str.contains("secret"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.manifest.api_url, DEFAULT_API_URL);
        assert_eq!(parsed.deploy.archive_path, DEFAULT_ARCHIVE_PATH);
        assert_eq!(parsed.site.language, "en");
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[manifest]
comic_slug = "moth-and-lantern"

[deploy]
url = "https://mothlantern.example/deployer.php"
build_dir = "dist"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.manifest.comic_slug.as_deref(), Some("moth-and-lantern"));
        assert_eq!(config.manifest.api_url, DEFAULT_API_URL);
        assert_eq!(config.deploy.build_dir, "dist");
        assert_eq!(config.deploy.archive_path, DEFAULT_ARCHIVE_PATH);
    }

    #[test]
    fn fetch_config_requires_slug() {
        let err = FetchConfig::new(DEFAULT_API_URL, None).unwrap_err();
        assert!(matches!(err, SitepressError::Config { .. }));
        assert!(err.to_string().contains("COMIC_SLUG"));

        let err = FetchConfig::new(DEFAULT_API_URL, Some("   ")).unwrap_err();
        assert!(matches!(err, SitepressError::Config { .. }));
    }

    #[test]
    fn fetch_config_rejects_non_http_base() {
        let err = FetchConfig::new("ftp://cms.example", Some("comic")).unwrap_err();
        assert!(err.to_string().contains("http or https"));

        let err = FetchConfig::new("not a url", Some("comic")).unwrap_err();
        assert!(err.to_string().contains("CMS_API_URL"));
    }

    #[test]
    fn fetch_config_flag_beats_file() {
        let mut app = AppConfig::default();
        app.manifest.comic_slug = Some("from-file".into());

        let from_file = FetchConfig::resolve(&app, None, None).expect("resolve");
        assert_eq!(from_file.comic_slug(), "from-file");
        assert_eq!(from_file.api_base().as_str(), "https://api.chimeracomics.org/");

        let from_flag = FetchConfig::resolve(
            &app,
            Some("http://localhost:8787".into()),
            Some("from-env".into()),
        )
        .expect("resolve");
        assert_eq!(from_flag.comic_slug(), "from-env");
        assert_eq!(from_flag.api_base().port(), Some(8787));
    }

    #[test]
    fn deploy_config_requires_url_and_secret() {
        let app = AppConfig::default();

        let err = DeployConfig::resolve(&app, None, Some("s3cret".into()), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("DEPLOY_URL"));

        let err = DeployConfig::resolve(
            &app,
            Some("https://host.example/deployer.php".into()),
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("DEPLOY_SECRET"));
    }

    #[test]
    fn deploy_config_applies_defaults() {
        let app = AppConfig::default();
        let config = DeployConfig::resolve(
            &app,
            Some("https://host.example/deployer.php".into()),
            Some("s3cret".into()),
            None,
            None,
        )
        .expect("resolve");

        assert_eq!(config.source_dir, PathBuf::from("_site"));
        assert_eq!(config.archive_path, PathBuf::from("site-bundle.zip"));
    }

    #[test]
    fn deploy_config_debug_redacts_secret() {
        let config = DeployConfig {
            endpoint_url: "https://host.example/deployer.php".into(),
            shared_secret: "hunter2".into(),
            source_dir: PathBuf::from("_site"),
            archive_path: PathBuf::from("site-bundle.zip"),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
