pub mod app;
pub mod client;
pub mod filter;
pub mod idle;
pub mod ip;
pub mod lockout;
pub mod session;
pub mod ticker;

pub use crate::domain::model::{Alert, AlertKind, License, LicenseStats, StatusFilter, View};
pub use crate::domain::ports::{ConfigProvider, LicenseApi, TokenStore};
pub use crate::utils::error::Result;
