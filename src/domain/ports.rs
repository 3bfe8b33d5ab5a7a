use crate::domain::model::{Credentials, License, NewLicense};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 保存登入 token 的地方 (跨次執行仍然存在)
pub trait TokenStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn save(&self, token: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn clear(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn auth_scheme(&self) -> &str;
    fn token_path(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn session_timeout_secs(&self) -> u64;
    fn session_warning_secs(&self) -> u64;
    fn max_login_attempts(&self) -> u32;
    fn lockout_secs(&self) -> u64;
    fn license_author(&self) -> i64;
    /// `None` 代表不查詢外部 IP
    fn ip_lookup_url(&self) -> Option<&str>;
}

/// 遠端授權碼 REST API
#[async_trait]
pub trait LicenseApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<String>;
    async fn list_licenses(&self, token: &str) -> Result<Vec<License>>;
    /// 2xx 即成功；回應內容解析不了時為 `None`
    async fn create_license(&self, token: &str, license: &NewLicense) -> Result<Option<License>>;
    async fn set_license_active(
        &self,
        token: &str,
        id: i64,
        is_active: bool,
    ) -> Result<Option<License>>;
    async fn delete_license(&self, token: &str, id: i64) -> Result<()>;
    /// 只用於顯示，失敗時回傳 `None`
    async fn detect_ip(&self) -> Option<String>;
}
