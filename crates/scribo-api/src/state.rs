//! Shared application state.

use scribo_core::AppConfig;
use scribo_pipeline::FileLifecycle;

pub struct AppState {
    pub config: AppConfig,
    pub lifecycle: FileLifecycle,
}
