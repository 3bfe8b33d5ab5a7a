#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;
pub use crate::config::{FileTokenStore, MemoryTokenStore, TomlConfig};

pub use crate::core::{
    app::{AdminApp, AppNotice, AppSettings},
    client::ApiClient,
    session::{GuardEvent, SessionGuard},
};
pub use crate::domain::model::Credentials;
pub use crate::utils::error::{AdminError, Result};
