use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Login rejected: {message}")]
    LoginRejected { message: String },

    #[error("Too many failed login attempts, locked for {remaining_secs}s")]
    LockedOut { remaining_secs: u64 },

    #[error("Unauthorized: token missing, invalid or expired")]
    Unauthorized,

    #[error("API returned status {status}")]
    ApiStatus { status: u16, detail: Option<String> },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("License {id} not found")]
    LicenseNotFound { id: i64 },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Api,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdminError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdminError::LoginRejected { .. }
            | AdminError::LockedOut { .. }
            | AdminError::Unauthorized
            | AdminError::NotAuthenticated => ErrorCategory::Authentication,
            AdminError::ApiError(e) if e.is_decode() => ErrorCategory::Api,
            AdminError::ApiError(_) => ErrorCategory::Network,
            AdminError::ApiStatus { .. }
            | AdminError::LicenseNotFound { .. }
            | AdminError::SerializationError(_) => ErrorCategory::Api,
            AdminError::ConfigValidationError { .. }
            | AdminError::InvalidConfigValueError { .. }
            | AdminError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AdminError::InvalidInput { .. } => ErrorCategory::Input,
            AdminError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Authentication | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Api | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 401 類回應需要強制登出
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdminError::Unauthorized)
    }

    /// 真的連不上伺服器 (回應內容解析失敗不算)
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, AdminError::ApiError(e) if !e.is_decode())
    }

    /// 伺服器回傳的錯誤說明 (`detail` 或 `error` 欄位)
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            AdminError::ApiStatus { detail, .. } => detail.as_deref(),
            AdminError::LoginRejected { message } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AdminError::ApiError(e) if e.is_decode() => {
                "The server sent a response that could not be read.".to_string()
            }
            AdminError::ApiError(_) => "Could not reach the server.".to_string(),
            AdminError::SerializationError(_) => {
                "The server sent a response that could not be read.".to_string()
            }
            AdminError::ApiStatus {
                status,
                detail: Some(detail),
            } => format!("Server rejected the request ({}): {}", status, detail),
            AdminError::ApiStatus { status, .. } => {
                format!("Server rejected the request ({}).", status)
            }
            AdminError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            AdminError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Authentication => "Log in again with valid credentials.",
            ErrorCategory::Network => "Check that the API server is running and reachable.",
            ErrorCategory::Api => "Retry the action; if it keeps failing, check the server logs.",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags.",
            ErrorCategory::Input => "Check the command syntax with 'help'.",
            ErrorCategory::System => "Check file permissions for the token file.",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
