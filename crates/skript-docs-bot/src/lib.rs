use std::path::Path;

use anyhow::Result;
use skript_docs_core::{bootstrap, CoreRuntime};
use tokio_util::sync::CancellationToken;

pub mod settings;

pub use settings::Settings;

/// Boots the core from `settings` without serving.
pub async fn prepare(settings: Settings) -> Result<CoreRuntime> {
    let config = settings.into_core_config()?;
    tracing::info!(
        target: "skript_docs_bot",
        data_file = %config.data_file.display(),
        mode = ?config.mode,
        "Preparing documentation bot"
    );
    bootstrap(config).await
}

/// Loads settings, boots the core and serves the gateway until stdin closes or Ctrl-C.
pub async fn run_bot(config_path: Option<&Path>) -> Result<()> {
    let runtime = prepare(Settings::load(config_path)?).await?;
    serve_until_interrupted(&runtime).await
}

pub async fn serve_until_interrupted(runtime: &CoreRuntime) -> Result<()> {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "skript_docs_bot", "interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    let result = runtime.serve(shutdown).await;
    signal.abort();
    result
}
