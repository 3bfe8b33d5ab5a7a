use crate::core::idle::{DEFAULT_SESSION_TIMEOUT_SECS, DEFAULT_SESSION_WARNING_SECS};
use crate::core::ip::DEFAULT_IP_LOOKUP_URL;
use crate::core::lockout::{DEFAULT_LOCKOUT_SECS, DEFAULT_MAX_LOGIN_ATTEMPTS};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "licensy-admin")]
#[command(about = "Interactive admin shell for license keys")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,

    #[arg(long, default_value = ".licensy-admin/token")]
    pub token_path: String,

    #[arg(long, default_value = "Token", help = "Authorization scheme: Token or Bearer")]
    pub auth_scheme: String,

    #[arg(long, default_value = "1", help = "Author id sent when creating licenses")]
    pub author_id: i64,

    #[arg(long, default_value = "10")]
    pub request_timeout: u64,

    #[arg(long, default_value = DEFAULT_IP_LOOKUP_URL)]
    pub ip_lookup_url: String,

    #[arg(long, help = "Skip the public IP lookup at startup")]
    pub no_ip_lookup: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn auth_scheme(&self) -> &str {
        &self.auth_scheme
    }

    fn token_path(&self) -> &str {
        &self.token_path
    }

    fn request_timeout_secs(&self) -> u64 {
        self.request_timeout
    }

    fn session_timeout_secs(&self) -> u64 {
        DEFAULT_SESSION_TIMEOUT_SECS
    }

    fn session_warning_secs(&self) -> u64 {
        DEFAULT_SESSION_WARNING_SECS
    }

    fn max_login_attempts(&self) -> u32 {
        DEFAULT_MAX_LOGIN_ATTEMPTS
    }

    fn lockout_secs(&self) -> u64 {
        DEFAULT_LOCKOUT_SECS
    }

    fn license_author(&self) -> i64 {
        self.author_id
    }

    fn ip_lookup_url(&self) -> Option<&str> {
        (!self.no_ip_lookup).then_some(self.ip_lookup_url.as_str())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_base", &self.api_base)?;
        validation::validate_path("token_path", &self.token_path)?;
        validation::validate_auth_scheme("auth_scheme", &self.auth_scheme)?;
        validation::validate_positive_number("request_timeout", self.request_timeout, 1)?;
        if !self.no_ip_lookup {
            validation::validate_url("ip_lookup_url", &self.ip_lookup_url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse_from(["licensy-admin"]);
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
        assert_eq!(config.auth_scheme(), "Token");
        assert_eq!(config.license_author(), 1);
        assert_eq!(config.ip_lookup_url(), Some(DEFAULT_IP_LOOKUP_URL));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = CliConfig::parse_from([
            "licensy-admin",
            "--api-base",
            "https://licenses.example.com/api",
            "--auth-scheme",
            "Bearer",
            "--no-ip-lookup",
        ]);
        assert_eq!(config.api_base(), "https://licenses.example.com/api");
        assert_eq!(config.ip_lookup_url(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let config = CliConfig::parse_from(["licensy-admin", "--auth-scheme", "Basic"]);
        assert!(config.validate().is_err());
    }
}
