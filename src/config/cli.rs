use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the FinDaily binary.
#[derive(Debug, Parser)]
#[command(name = "findaily", version, about = "FinDaily archive and article server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FINDAILY_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(Box<ServeArgs>),
    /// Fetch one article and write the rendered page.
    #[command(name = "render-article")]
    RenderArticle(RenderArticleArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

/// Overrides shared by every command that reads published content.
#[derive(Debug, Args, Default, Clone)]
pub struct ContentOverrides {
    /// Override the public site URL used for canonical links and images.
    #[arg(long = "site-base-url", value_name = "URL")]
    pub site_base_url: Option<String>,

    /// Override the URL the `data/` directory is fetched from.
    #[arg(long = "feed-base-url", value_name = "URL")]
    pub feed_base_url: Option<String>,

    /// Override the upstream request timeout.
    #[arg(long = "feed-timeout-seconds", value_name = "SECONDS")]
    pub feed_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub content: ContentOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the number of archive entries per page.
    #[arg(long = "archive-page-size", value_name = "COUNT")]
    pub archive_page_size: Option<u64>,

    /// Override the search box debounce delay.
    #[arg(long = "archive-debounce-ms", value_name = "MILLIS")]
    pub archive_debounce_ms: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArticleArgs {
    #[command(flatten)]
    pub overrides: ContentOverrides,

    /// Article slug, e.g. `2025-08-14`.
    #[arg(value_name = "SLUG")]
    pub slug: String,

    /// Write the page here instead of stdout.
    #[arg(
        long,
        short = 'o',
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub output: Option<PathBuf>,
}
