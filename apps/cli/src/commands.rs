//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use sitepress_core::{PageIndex, assemble_site_data, build_page_index, write_site_data};
use sitepress_deploy::{
    ArchiveSummary, DeployProgress, DeployState, DeploymentOrchestrator, UploadOptions,
};
use sitepress_manifest::{FetchOptions, fetch_manifest};
use sitepress_shared::{
    AppConfig, DeployConfig, FetchConfig, Manifest, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// sitepress: publish a web comic from its content manifest.
#[derive(Parser)]
#[command(
    name = "sitepress",
    version,
    about = "Fetch a comic manifest, emit site data for the renderer, and deploy the built site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.sitepress/sitepress.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch the manifest and write the renderer's site data document.
    Data {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file.
        #[arg(short, long, default_value = "site-data.json")]
        out: PathBuf,

        /// Public URL of the generated site.
        #[arg(long, env = "SITE_URL")]
        site_url: Option<String>,
    },

    /// Print previous/next/first/last links for one page as JSON.
    Nav {
        #[command(flatten)]
        source: SourceArgs,

        /// Page slug to resolve.
        slug: String,
    },

    /// Bundle the generated site and upload it to the deployer.
    Deploy {
        #[command(flatten)]
        target: DeployArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where the manifest comes from.
#[derive(Args, Debug)]
pub(crate) struct SourceArgs {
    /// Content API base URL.
    #[arg(long, env = "CMS_API_URL")]
    pub api_url: Option<String>,

    /// Comic to publish.
    #[arg(long, env = "COMIC_SLUG")]
    pub comic_slug: Option<String>,
}

/// Where the site goes.
#[derive(Args, Debug)]
pub(crate) struct DeployArgs {
    /// Deployer endpoint URL.
    #[arg(long, env = "DEPLOY_URL")]
    pub url: Option<String>,

    /// Shared secret sent with the bundle.
    #[arg(long, env = "DEPLOY_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Generated site directory.
    #[arg(long, env = "BUILD_DIR")]
    pub build_dir: Option<PathBuf>,

    /// Temporary bundle location.
    #[arg(long, env = "ARCHIVE_PATH")]
    pub archive_path: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize ~/.sitepress/sitepress.toml with defaults.
    Init,
    /// Show the loaded configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so stdout carries only command output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::util::SubscriberInitExt;

    log_subscriber(cli.verbose, &cli.log_format, std::io::stderr).init();
}

/// Build the log subscriber for the given verbosity and format.
fn log_subscriber<W>(
    verbose: u8,
    format: &LogFormat,
    writer: W,
) -> Box<dyn tracing::Subscriber + Send + Sync>
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "sitepress=info",
        1 => "sitepress=debug",
        _ => "sitepress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => Box::new(
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(writer)
                .finish(),
        ),
        LogFormat::Json => Box::new(
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .finish(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Data {
            source,
            out,
            site_url,
        } => {
            let config = app_config(config_path.as_deref())?;
            cmd_data(&config, source, &out, site_url).await
        }
        Command::Nav { source, slug } => {
            let config = app_config(config_path.as_deref())?;
            cmd_nav(&config, source, &slug, &mut std::io::stdout()).await
        }
        Command::Deploy { target } => {
            let config = app_config(config_path.as_deref())?;
            cmd_deploy(&config, target).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// Load `--config` if given, else the default file (or defaults).
fn app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn load_index(
    config: &AppConfig,
    source: SourceArgs,
) -> Result<(FetchConfig, Manifest, PageIndex)> {
    // Resolved before any network activity.
    let fetch = FetchConfig::resolve(config, source.api_url, source.comic_slug)?;

    info!(comic = fetch.comic_slug(), api = %fetch.api_base(), "fetching manifest");
    let manifest = fetch_manifest(&fetch, &FetchOptions::default()).await?;
    let index = build_page_index(&manifest);

    for slug in index.duplicate_slugs() {
        warn!(slug, "slug appears more than once; navigation will use the first occurrence");
    }

    Ok((fetch, manifest, index))
}

async fn cmd_data(
    config: &AppConfig,
    source: SourceArgs,
    out: &Path,
    site_url: Option<String>,
) -> Result<()> {
    let (fetch, manifest, index) = load_index(config, source).await?;

    let mut site = config.site.clone();
    if let Some(url) = site_url {
        site.url = url;
    }

    let api_base = fetch.api_base().as_str().trim_end_matches('/');
    let data = assemble_site_data(&manifest, &index, api_base, &site);
    write_site_data(out, &data)?;

    println!();
    println!("  Site data written!");
    println!("  Comic:    {}", fetch.comic_slug());
    println!("  Chapters: {}", data.chapters.len());
    println!("  Pages:    {}", data.navigation.total_pages);
    println!("  Path:     {}", out.display());
    println!();

    Ok(())
}

async fn cmd_nav(
    config: &AppConfig,
    source: SourceArgs,
    slug: &str,
    out: &mut impl Write,
) -> Result<()> {
    let (_, _, index) = load_index(config, source).await?;

    if index.position(slug).is_none() {
        warn!(slug, "slug not found in manifest");
    }

    let links = sitepress_core::resolve(&index, slug);
    writeln!(out, "{}", serde_json::to_string_pretty(&links)?)?;
    Ok(())
}

async fn cmd_deploy(config: &AppConfig, target: DeployArgs) -> Result<()> {
    let deploy = DeployConfig::resolve(
        config,
        target.url,
        target.secret,
        target.build_dir,
        target.archive_path,
    )?;

    let reporter = CliProgress::new();
    let run = DeploymentOrchestrator::new(deploy, UploadOptions::default())
        .run(&reporter)
        .await;
    reporter.spinner.finish_and_clear();

    let elapsed = run.elapsed;
    let report = run.into_result().wrap_err("deployment failed")?;

    println!();
    println!("  Deployment successful!");
    println!("  Run:      {}", report.run_id);
    println!("  Files:    {}", report.archive.files);
    println!("  Bundle:   {:.2} MB", report.archive.size_mb());
    println!("  SHA-256:  {}", report.archive.sha256);
    println!("  Server:   {}", report.response.trim());
    println!("  Time:     {:.1}s", elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = app_config(path)?;
    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| eyre!("failed to render config: {e}"))?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Deploy progress as an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl DeployProgress for CliProgress {
    fn state_changed(&self, state: DeployState) {
        let message = match state {
            DeployState::Building => "Creating ZIP bundle",
            DeployState::Uploading => "Uploading bundle",
            DeployState::CleaningUp => "Cleaning up",
            _ => return,
        };
        self.spinner.set_message(message);
    }

    fn archive_built(&self, summary: &ArchiveSummary) {
        self.spinner.println(format!(
            "  Bundled {} files ({:.2} MB)",
            summary.files,
            summary.size_mb()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn data_defaults_to_site_data_json() {
        let cli = Cli::try_parse_from([
            "sitepress",
            "data",
            "--comic-slug",
            "moth-and-lantern",
        ])
        .unwrap();

        match cli.command {
            Command::Data { source, out, .. } => {
                assert_eq!(source.comic_slug.as_deref(), Some("moth-and-lantern"));
                assert_eq!(out, PathBuf::from("site-data.json"));
            }
            _ => panic!("expected data command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sitepress",
            "nav",
            "wings-1",
            "-vv",
            "--log-format",
            "json",
            "--config",
            "/tmp/sitepress.toml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/sitepress.toml")));
        match cli.command {
            Command::Nav { slug, .. } => assert_eq!(slug, "wings-1"),
            _ => panic!("expected nav command"),
        }
    }

    #[test]
    fn deploy_flags_feed_deploy_config() {
        let cli = Cli::try_parse_from([
            "sitepress",
            "deploy",
            "--url",
            "https://mothlantern.example/deployer.php",
            "--secret",
            "hunter2",
            "--build-dir",
            "dist",
        ])
        .unwrap();

        let Command::Deploy { target } = cli.command else {
            panic!("expected deploy command");
        };
        let config = DeployConfig::resolve(
            &AppConfig::default(),
            target.url,
            target.secret,
            target.build_dir,
            target.archive_path,
        )
        .unwrap();

        assert_eq!(config.source_dir, PathBuf::from("dist"));
        assert_eq!(config.shared_secret, "hunter2");
        assert_eq!(config.archive_path, PathBuf::from("site-bundle.zip"));
    }

    #[test]
    fn nav_requires_a_slug() {
        assert!(Cli::try_parse_from(["sitepress", "nav"]).is_err());
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let path =
            std::env::temp_dir().join(format!("sp-cli-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            concat!(
                "[manifest]\ncomic_slug = \"moth-and-lantern\"\n\n",
                "[site]\nurl = \"https://mothlantern.example\"\n",
            ),
        )
        .unwrap();

        let config = app_config(Some(&path)).unwrap();
        assert_eq!(config.manifest.comic_slug.as_deref(), Some("moth-and-lantern"));
        assert_eq!(config.site.url, "https://mothlantern.example");
        assert_eq!(config.site.language, "en");

        let _ = std::fs::remove_file(&path);
    }

    /// Shared in-memory log sink.
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn fixture_server() -> wiremock::MockServer {
        let fixture = std::fs::read_to_string("../../fixtures/json/manifest.fixture.json")
            .expect("read fixture");
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/pub/v1/comics/moth/manifest.json"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_raw(fixture, "application/json"),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn nav_output_is_pure_json_while_logs_go_elsewhere() {
        let server = fixture_server().await;
        let logs = Captured::default();
        let sink = logs.clone();
        let subscriber = log_subscriber(0, &LogFormat::Text, move || sink.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = SourceArgs {
            api_url: Some(server.uri()),
            comic_slug: Some("moth".into()),
        };
        let mut out = Vec::new();
        cmd_nav(&AppConfig::default(), source, "wings-1", &mut out)
            .await
            .unwrap();

        let links: serde_json::Value = serde_json::from_slice(&out).expect("stdout is JSON");
        assert_eq!(links["previous"]["slug"], "the-lamp");
        assert_eq!(links["next"]["slug"], "wings-2");
        assert_eq!(links["first"]["slug"], "cover");
        assert_eq!(links["last"]["slug"], "tide-1");

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("fetching manifest"));
    }

    #[tokio::test]
    async fn nav_for_unknown_slug_still_prints_json() {
        let server = fixture_server().await;
        let source = SourceArgs {
            api_url: Some(server.uri()),
            comic_slug: Some("moth".into()),
        };

        let mut out = Vec::new();
        cmd_nav(&AppConfig::default(), source, "missing", &mut out)
            .await
            .unwrap();

        let links: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(links["previous"].is_null());
        assert!(links["next"].is_null());
        assert_eq!(links["first"]["slug"], "cover");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(app_config(Some(Path::new("/definitely/not/here/sitepress.toml"))).is_err());
    }
}
