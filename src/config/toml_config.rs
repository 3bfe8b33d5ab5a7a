use crate::core::idle::{DEFAULT_SESSION_TIMEOUT_SECS, DEFAULT_SESSION_WARNING_SECS};
use crate::core::ip::DEFAULT_IP_LOOKUP_URL;
use crate::core::lockout::{DEFAULT_LOCKOUT_SECS, DEFAULT_MAX_LOGIN_ATTEMPTS};
use crate::core::ConfigProvider;
use crate::utils::error::{AdminError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_TOKEN_PATH: &str = ".licensy-admin/token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: ApiConfig,
    pub session: Option<SessionConfig>,
    pub lockout: Option<LockoutConfig>,
    pub storage: Option<StorageConfig>,
    pub network: Option<NetworkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_scheme: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub license_author: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub timeout_secs: Option<u64>,
    pub warning_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    pub max_attempts: Option<u32>,
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub token_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ip_lookup_enabled: Option<bool>,
    pub ip_lookup_url: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdminError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdminError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LICENSY_API})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdminError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("api.base_url", &self.api.base_url)?;
        crate::utils::validation::validate_auth_scheme("api.auth_scheme", self.auth_scheme())?;
        crate::utils::validation::validate_positive_number(
            "api.timeout_seconds",
            self.request_timeout_secs(),
            1,
        )?;
        crate::utils::validation::validate_path("storage.token_path", self.token_path())?;

        if let Some(url) = ConfigProvider::ip_lookup_url(self) {
            crate::utils::validation::validate_url("network.ip_lookup_url", url)?;
        }

        crate::utils::validation::validate_timing(
            self.session_timeout_secs(),
            self.session_warning_secs(),
            self.max_login_attempts(),
            self.lockout_secs(),
        )
    }
}

impl ConfigProvider for TomlConfig {
    fn api_base(&self) -> &str {
        &self.api.base_url
    }

    fn auth_scheme(&self) -> &str {
        self.api.auth_scheme.as_deref().unwrap_or("Token")
    }

    fn token_path(&self) -> &str {
        self.storage
            .as_ref()
            .and_then(|s| s.token_path.as_deref())
            .unwrap_or(DEFAULT_TOKEN_PATH)
    }

    fn request_timeout_secs(&self) -> u64 {
        self.api.timeout_seconds.unwrap_or(10)
    }

    fn session_timeout_secs(&self) -> u64 {
        self.session
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS)
    }

    fn session_warning_secs(&self) -> u64 {
        self.session
            .as_ref()
            .and_then(|s| s.warning_secs)
            .unwrap_or(DEFAULT_SESSION_WARNING_SECS)
    }

    fn max_login_attempts(&self) -> u32 {
        self.lockout
            .as_ref()
            .and_then(|l| l.max_attempts)
            .unwrap_or(DEFAULT_MAX_LOGIN_ATTEMPTS)
    }

    fn lockout_secs(&self) -> u64 {
        self.lockout
            .as_ref()
            .and_then(|l| l.duration_secs)
            .unwrap_or(DEFAULT_LOCKOUT_SECS)
    }

    fn license_author(&self) -> i64 {
        self.api.license_author.unwrap_or(1)
    }

    fn ip_lookup_url(&self) -> Option<&str> {
        match &self.network {
            Some(NetworkConfig {
                ip_lookup_enabled: Some(false),
                ..
            }) => None,
            Some(NetworkConfig {
                ip_lookup_url: Some(url),
                ..
            }) => Some(url.as_str()),
            _ => Some(DEFAULT_IP_LOOKUP_URL),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
