use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AdminError;

/// 遠端 API 管理的授權碼記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub id: i64,
    pub key: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, alias = "author", skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
}

/// 時間欄位可能帶時區 (RFC 3339)，也可能是 `USE_TZ=False` 時的無時區格式，後者視為 UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLicense {
    pub key: String,
    pub author: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseUpdate {
    pub is_active: bool,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// 不要把密碼印進日誌
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn matches(&self, license: &License) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => license.is_active,
            StatusFilter::Inactive => !license.is_active,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            other => Err(AdminError::InvalidInput {
                message: format!("unknown status filter '{}' (all, active, inactive)", other),
            }),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Active => write!(f, "active"),
            StatusFilter::Inactive => write!(f, "inactive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LicenseStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// 最近 7 天內建立
    pub recent: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    LoginFailure,
    ConnectionFailure,
    DataFetchFailure,
    ActionFailure,
    SessionExpired,
    LockedOut,
}

/// 需要使用者確認的阻斷式訊息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(kind: AlertKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn login_failed(message: impl Into<String>) -> Self {
        Self::new(AlertKind::LoginFailure, "Login Failed", message)
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(AlertKind::ConnectionFailure, "Connection Error", message)
    }

    pub fn data_fetch_failed() -> Self {
        Self::new(
            AlertKind::DataFetchFailure,
            "Data Error",
            "An error occurred while loading licenses.",
        )
    }

    pub fn action_failed(message: impl Into<String>) -> Self {
        Self::new(AlertKind::ActionFailure, "Error", message)
    }

    pub fn session_expired() -> Self {
        Self::new(
            AlertKind::SessionExpired,
            "Session Expired",
            "Please log in again.",
        )
    }

    pub fn locked_out(remaining_secs: u64) -> Self {
        Self::new(
            AlertKind::LockedOut,
            "Security Lock",
            format!(
                "Too many failed login attempts. Please wait {} seconds.",
                remaining_secs
            ),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Unauthenticated,
    Authenticated,
}
