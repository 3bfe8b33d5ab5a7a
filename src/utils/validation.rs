use crate::utils::error::{AdminError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AdminError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AdminError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AdminError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AdminError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AdminError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(AdminError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AdminError::InvalidInput {
            message: format!("{} cannot be empty or whitespace-only", field_name),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AdminError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 驗證 auth header 前綴 (Django REST framework 使用 `Token`)
pub fn validate_auth_scheme(field_name: &str, scheme: &str) -> Result<()> {
    match scheme {
        "Token" | "Bearer" => Ok(()),
        other => Err(AdminError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: other.to_string(),
            reason: "Supported schemes: Token, Bearer".to_string(),
        }),
    }
}

/// 共用的 session/lockout 時間設定驗證
pub fn validate_timing(
    session_timeout_secs: u64,
    session_warning_secs: u64,
    max_login_attempts: u32,
    lockout_secs: u64,
) -> Result<()> {
    validate_positive_number("session.timeout_secs", session_timeout_secs, 1)?;
    validate_range(
        "session.warning_secs",
        session_warning_secs,
        0,
        session_timeout_secs.saturating_sub(1),
    )?;
    validate_positive_number("lockout.max_attempts", u64::from(max_login_attempts), 1)?;
    validate_positive_number("lockout.duration_secs", lockout_secs, 1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_base", "https://example.com/api").is_ok());
        assert!(validate_url("api_base", "http://127.0.0.1:8000/api").is_ok());
        assert!(validate_url("api_base", "").is_err());
        assert!(validate_url("api_base", "invalid-url").is_err());
        assert!(validate_url("api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("lockout.max_attempts", 5, 1).is_ok());
        assert!(validate_positive_number("lockout.max_attempts", 0, 1).is_err());
    }

    #[test]
    fn test_validate_timing() {
        assert!(validate_timing(300, 60, 5, 300).is_ok());
        assert!(validate_timing(300, 300, 5, 300).is_err());
        assert!(validate_timing(0, 0, 5, 300).is_err());
        assert!(validate_timing(300, 60, 0, 300).is_err());
    }

    #[test]
    fn test_validate_auth_scheme() {
        assert!(validate_auth_scheme("api.auth_scheme", "Token").is_ok());
        assert!(validate_auth_scheme("api.auth_scheme", "Bearer").is_ok());
        assert!(validate_auth_scheme("api.auth_scheme", "Basic").is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("key", "ABC-123").is_ok());
        assert!(validate_non_empty_string("key", "   ").is_err());
    }
}
