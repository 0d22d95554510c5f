//! HTTP front end for the briefing pipeline: configuration, wiring and routes.
mod config;
mod routes;
mod state;

pub use config::{ConfigError, FetchConfig, ServerConfig};
pub use routes::router;
pub use state::{AppState, StartupError, ELEVENLABS_KEY_VAR, FIRECRAWL_KEY_VAR};
