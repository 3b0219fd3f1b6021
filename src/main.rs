use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use specpack::app::{self, AppState};
use specpack::cli;
use specpack::config::AppConfig;
use specpack::diagram::CommandRenderer;
use specpack::dispatch::HttpDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    config.ensure_dirs().await?;

    // Console on stderr, plus a daily rolling file under logs_dir
    let file_appender = tracing_appender::rolling::daily(&config.logs_dir, "specpack.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    eprintln!("📦 Spec Pack v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.pm_base_url);
    eprintln!("   Author: {}", config.created_by);
    eprintln!("   Logs: {}", config.logs_dir.display());

    let dispatcher = Arc::new(HttpDispatcher::new(config.pm_base_url.clone()));
    if dispatcher.health().await {
        eprintln!("   Status: online");
    } else {
        eprintln!("   Status: offline (commands will report dispatch failures)");
    }
    eprintln!("   Type /help for commands. /quit to exit.\n");

    let state = AppState::new(config, dispatcher, Arc::new(CommandRenderer::default()));
    let _sync = app::spawn_preview_sync(&state);
    state.helper.refresh();

    cli::run(state).await?;
    Ok(())
}
