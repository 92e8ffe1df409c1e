use std::{future::IntoFuture, io::Write, process, sync::Arc};

use findaily::{
    application::{
        article::{ArticleOptions, ArticleService},
        chrome::{ChromeOptions, ChromeService},
        content::ContentSource,
        error::AppError,
    },
    config,
    infra::{
        content::HttpContentSource,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::RenderArticle(args) => run_render_article(settings, args).await,
    }
}

fn build_content_source(settings: &config::Settings) -> Result<Arc<dyn ContentSource>, AppError> {
    let source = HttpContentSource::new(&settings.feed.base_url, settings.feed.timeout)?;
    Ok(Arc::new(source))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let content = build_content_source(&settings)?;
    let state = HttpState::new(&settings, content);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        addr = %settings.server.addr,
        feed = %settings.feed.base_url,
        "listening"
    );

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    let drain_limit = settings.server.graceful_shutdown;

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(drain_limit).await;
        } => {
            warn!(
                seconds = drain_limit.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn run_render_article(
    settings: config::Settings,
    args: config::RenderArticleArgs,
) -> Result<(), AppError> {
    let content = build_content_source(&settings)?;
    let articles = ArticleService::new(content, ArticleOptions::from(&settings));
    let chrome = ChromeService::new(&ChromeOptions::from(&settings.site)).load();

    let html = articles.render_page(chrome, &args.slug).await?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, html.as_bytes())
                .await
                .map_err(|err| AppError::from(InfraError::from(err)))?;
            info!(slug = %args.slug, path = %path.display(), "article written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(html.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|err| AppError::from(InfraError::from(err)))?;
        }
    }

    Ok(())
}
