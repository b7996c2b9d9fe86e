//! Binary entry point that glues the in-memory catalog to the TUI. The single
//! `Library` built here is the only one in the process; the app owns it for
//! the whole session.
use anyhow::Context;
use library_catalog::config::AppConfig;
use library_catalog::logging::init_logging;
use library_catalog::{run_app, App, Library};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to resolve configuration")?;
    let _log_guard = init_logging(&config)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %config.log_dir.display(),
        "starting library catalog"
    );

    let mut app = App::new(Library::new());
    let result = run_app(&mut app);

    if let Err(err) = &result {
        tracing::error!("application exited with error: {err:#}");
    } else {
        tracing::info!("library catalog closed");
    }
    result
}
