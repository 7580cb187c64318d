//! Hosting surface for the diabetes scorer: HTTP API, configuration and
//! warm-up scheduling.

pub mod api;
pub mod config;
pub mod warmup;

pub use api::{create_router, AppState};
pub use config::ScorerConfig;
