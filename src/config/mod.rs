#[cfg(feature = "cli")]
pub mod cli;
pub mod storage;
pub mod toml_config;

pub use storage::{FileTokenStore, MemoryTokenStore};
pub use toml_config::TomlConfig;
