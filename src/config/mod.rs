//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroUsize, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, ContentOverrides, RenderArticleArgs, ServeArgs, ServeOverrides};

use crate::application::archive::{DEFAULT_DEBOUNCE_MS, DEFAULT_PAGE_SIZE};
use crate::application::render::DEFAULT_PRIMARY_MARKET_HEADING;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "findaily";
const ENV_PREFIX: &str = "FINDAILY";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SITE_NAME: &str = "FinDaily";
const DEFAULT_SITE_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_SITE_DESCRIPTION: &str = "毎朝の相場ハイライトを1枚で。";
const DEFAULT_OG_IMAGE: &str = "/assets/images/XCard.png";
const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub feed: FeedSettings,
    pub archive: ArchiveSettings,
    pub article: ArticleSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub name: String,
    /// Public site root without a trailing slash.
    pub base_url: String,
    pub description: String,
    pub og_image: String,
    pub timezone: Tz,
    pub footer_copy: String,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Root the `data/` directory is served from.
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub page_size: NonZeroUsize,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ArticleSettings {
    pub primary_market_heading: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::RenderArticle(args)) => raw.apply_content_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    feed: RawFeedSettings,
    archive: RawArchiveSettings,
    article: RawArticleSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(size) = overrides.archive_page_size {
            self.archive.page_size = Some(size);
        }
        if let Some(millis) = overrides.archive_debounce_ms {
            self.archive.debounce_ms = Some(millis);
        }

        self.apply_content_overrides(&overrides.content);
    }

    fn apply_content_overrides(&mut self, overrides: &ContentOverrides) {
        if let Some(url) = overrides.site_base_url.as_ref() {
            self.site.base_url = Some(url.clone());
        }
        if let Some(url) = overrides.feed_base_url.as_ref() {
            self.feed.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.feed_timeout_seconds {
            self.feed.timeout_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            feed,
            archive,
            article,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let site = build_site_settings(site)?;
        let feed = build_feed_settings(feed, &site)?;
        let archive = build_archive_settings(archive)?;
        let article = build_article_settings(article);

        Ok(Self {
            server,
            logging,
            site,
            feed,
            archive,
            article,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let name = non_blank(site.name).unwrap_or_else(|| DEFAULT_SITE_NAME.to_string());
    let base_url = normalize_base_url(
        non_blank(site.base_url).as_deref().unwrap_or(DEFAULT_SITE_BASE_URL),
        "site.base_url",
    )?;

    let timezone_name = non_blank(site.timezone).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone = Tz::from_str(&timezone_name).map_err(|err| {
        LoadError::invalid("site.timezone", format!("unknown timezone `{timezone_name}`: {err}"))
    })?;

    let footer_copy = non_blank(site.footer_copy).unwrap_or_else(|| format!("© {name}"));

    Ok(SiteSettings {
        base_url,
        description: non_blank(site.description)
            .unwrap_or_else(|| DEFAULT_SITE_DESCRIPTION.to_string()),
        og_image: non_blank(site.og_image).unwrap_or_else(|| DEFAULT_OG_IMAGE.to_string()),
        timezone,
        footer_copy,
        name,
    })
}

fn build_feed_settings(feed: RawFeedSettings, site: &SiteSettings) -> Result<FeedSettings, LoadError> {
    let base_url = match non_blank(feed.base_url) {
        Some(url) => normalize_base_url(&url, "feed.base_url")?,
        None => site.base_url.clone(),
    };

    let timeout_secs = feed.timeout_seconds.unwrap_or(DEFAULT_FEED_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "feed.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(FeedSettings {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_archive_settings(archive: RawArchiveSettings) -> Result<ArchiveSettings, LoadError> {
    let page_size = archive.page_size.unwrap_or(DEFAULT_PAGE_SIZE as u64);
    let page_size = usize::try_from(page_size)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| LoadError::invalid("archive.page_size", "must be greater than zero"))?;

    let debounce_ms = archive.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS);
    if debounce_ms > MAX_DEBOUNCE_MS {
        return Err(LoadError::invalid(
            "archive.debounce_ms",
            format!("must not exceed {MAX_DEBOUNCE_MS}"),
        ));
    }

    Ok(ArchiveSettings {
        page_size,
        debounce_ms,
    })
}

fn build_article_settings(article: RawArticleSettings) -> ArticleSettings {
    ArticleSettings {
        primary_market_heading: article
            .primary_market_heading
            .unwrap_or_else(|| DEFAULT_PRIMARY_MARKET_HEADING.to_string()),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    name: Option<String>,
    base_url: Option<String>,
    description: Option<String>,
    og_image: Option<String>,
    timezone: Option<String>,
    footer_copy: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedSettings {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawArchiveSettings {
    page_size: Option<u64>,
    debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawArticleSettings {
    primary_market_heading: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Validate an absolute http(s) URL and strip any trailing slash.
fn normalize_base_url(value: &str, key: &'static str) -> Result<String, LoadError> {
    let parsed = Url::parse(value)
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "scheme must be http or https"));
    }
    Ok(value.trim_end_matches('/').to_string())
}
