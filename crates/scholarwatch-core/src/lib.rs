pub mod config;
pub mod error;
pub mod paper;
pub mod source;
pub mod storage;
pub mod notify;
pub mod render;
pub mod watcher;
pub mod server;

pub use config::AppConfig;
pub use error::{Error, Result};
