//! Tracing subscriber setup.

use scribo_core::AppConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber. Honors RUST_LOG; defaults to info with
/// debug for our own crates outside production.
pub fn init_tracing(config: &AppConfig) {
    let default_directives = if config.is_production() {
        "info"
    } else {
        "info,scribo_api=debug,scribo_pipeline=debug,scribo_db=debug"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let builder = fmt().with_env_filter(filter).with_target(true);

    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}
