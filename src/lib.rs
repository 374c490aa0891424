// Library exports for embedding and testing
pub mod app_state;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use app_state::AppState;
pub use config::Config;
pub use error::{IapError, Result};
pub use services::{StoreConnection, SubscriptionSession};
