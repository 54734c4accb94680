pub mod api;
pub mod audit;
pub mod cache;
pub mod compliance;
pub mod config;
pub mod config_files;
pub mod error;
pub mod http;
pub mod management;
pub mod pii;
pub mod proxy;
pub mod quota;
pub mod secrets;
pub mod server;
pub mod stream;
pub mod telemetry;
pub mod tenant;
pub mod types;

pub use config::Config;
pub use error::{AirlockError, Result};
pub use server::ServerState;
