use crate::core::filter::{compute_stats, filter_licenses};
use crate::core::idle::IdleTick;
use crate::core::ip;
use crate::core::session::{GuardEvent, GuardSettings, SessionGuard};
use crate::domain::model::{
    Alert, AlertKind, Credentials, License, LicenseStats, NewLicense, StatusFilter, View,
};
use crate::domain::ports::{ConfigProvider, LicenseApi, TokenStore};
use crate::utils::error::{AdminError, Result};
use crate::utils::validation::validate_non_empty_string;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy)]
pub struct AppSettings {
    pub guard: GuardSettings,
    pub license_author: i64,
}

impl AppSettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            guard: GuardSettings {
                session_timeout_secs: config.session_timeout_secs(),
                session_warning_secs: config.session_warning_secs(),
                max_login_attempts: config.max_login_attempts(),
                lockout_secs: config.lockout_secs(),
            },
            license_author: config.license_author(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            guard: GuardSettings::default(),
            license_author: 1,
        }
    }
}

/// ticker 事件處理後，介面需要知道的變化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppNotice {
    Nothing,
    SessionWarning { remaining_secs: u64, started: bool },
    SessionExpired,
    LockoutCountdown { remaining_secs: u64 },
    LockoutCleared,
}

/// 管理面板的唯一狀態容器
///
/// 所有狀態轉換 (登入、登出、資料更新、計時事件) 都經過這裡的方法，
/// 錯誤會轉成一個待顯示的 [`Alert`]，同時也以 `Err` 回傳給呼叫端。
pub struct AdminApp<A: LicenseApi, T: TokenStore> {
    api: A,
    tokens: T,
    settings: AppSettings,
    guard: SessionGuard,
    view: View,
    token: Option<String>,
    username: Option<String>,
    licenses: Vec<License>,
    stats: LicenseStats,
    query: String,
    status_filter: StatusFilter,
    alert: Option<Alert>,
    client_ip: String,
    last_activity: Option<DateTime<Utc>>,
}

impl<A: LicenseApi, T: TokenStore> AdminApp<A, T> {
    pub fn new(
        api: A,
        tokens: T,
        settings: AppSettings,
        events: UnboundedSender<GuardEvent>,
    ) -> Self {
        Self {
            api,
            tokens,
            settings,
            guard: SessionGuard::new(settings.guard, events),
            view: View::Unauthenticated,
            token: None,
            username: None,
            licenses: Vec::new(),
            stats: LicenseStats::default(),
            query: String::new(),
            status_filter: StatusFilter::All,
            alert: None,
            client_ip: ip::FALLBACK_IP.to_string(),
            last_activity: None,
        }
    }

    /// 啟動：查詢 IP，若已有保存的 token 就直接進入登入狀態 (不先驗證)
    pub async fn startup(&mut self) -> Result<()> {
        self.client_ip = ip::ip_or_fallback(self.api.detect_ip().await);
        tracing::debug!("Client IP: {}", self.client_ip);

        let stored = match self.tokens.load().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Could not read stored token: {}", e);
                None
            }
        };

        if let Some(token) = stored {
            tracing::info!("Found stored token, resuming session");
            self.enter_session(token, None);
            self.refresh().await?;
        }
        Ok(())
    }

    fn enter_session(&mut self, token: String, username: Option<String>) {
        self.token = Some(token);
        self.username = username;
        self.view = View::Authenticated;
        self.last_activity = Some(Utc::now());
        self.guard.start_session();
    }

    pub async fn login(&mut self, credentials: Credentials) -> Result<()> {
        if !self.guard.can_attempt_login() {
            let remaining_secs = self.guard.lockout_remaining_secs();
            self.alert = Some(Alert::locked_out(remaining_secs));
            return Err(AdminError::LockedOut { remaining_secs });
        }

        match self.api.login(&credentials).await {
            Ok(token) => {
                if let Err(e) = self.tokens.save(&token).await {
                    tracing::warn!("Could not persist token: {}", e);
                }
                self.guard.record_success();
                self.enter_session(token, Some(credentials.username.clone()));
                tracing::info!("✅ Logged in as '{}'", credentials.username);

                // 登入本身已成功；清單載入失敗只會留下 alert
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Initial license fetch failed: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                let outcome = self.guard.record_failed_attempt();
                tracing::warn!(
                    "Login failed ({}/{}): {} {:?}",
                    self.guard.login_attempts(),
                    self.guard.max_login_attempts(),
                    e,
                    outcome
                );

                self.alert = Some(match &e {
                    e if e.is_connection_failure() => Alert::connection_failed(
                        "Could not connect to the server. Check the API address and CORS settings.",
                    ),
                    AdminError::LoginRejected { message } => Alert::login_failed(message.clone()),
                    other => Alert::login_failed(other.user_friendly_message()),
                });
                Err(e)
            }
        }
    }

    /// 登出；重複呼叫沒有副作用
    pub async fn logout(&mut self) {
        if let Err(e) = self.tokens.clear().await {
            tracing::warn!("Could not remove stored token: {}", e);
        }

        if self.view == View::Authenticated {
            tracing::info!("Logged out");
        }
        self.token = None;
        self.username = None;
        self.view = View::Unauthenticated;
        self.licenses.clear();
        self.stats = LicenseStats::default();
        self.guard.end_session();
    }

    fn require_token(&mut self) -> Result<String> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => {
                self.alert = Some(Alert::action_failed("Please log in first."));
                Err(AdminError::NotAuthenticated)
            }
        }
    }

    /// 401 一律強制登出並提示 session 過期，其他錯誤用呼叫端給的 alert
    async fn fail(&mut self, err: AdminError, alert: Alert) -> AdminError {
        if err.is_unauthorized() {
            tracing::warn!("Token rejected by server, forcing logout");
            self.logout().await;
            self.alert = Some(Alert::session_expired());
        } else {
            self.alert = Some(alert);
        }
        err
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let token = self.require_token()?;

        match self.api.list_licenses(&token).await {
            Ok(licenses) => {
                self.stats = compute_stats(&licenses, Utc::now());
                self.licenses = licenses;
                Ok(())
            }
            Err(e) => Err(self.fail(e, Alert::data_fetch_failed()).await),
        }
    }

    /// 新增授權碼；伺服器回應 2xx 就重新載入清單，回傳內容只作參考
    pub async fn create_license(&mut self, key: &str) -> Result<Option<License>> {
        let token = self.require_token()?;
        if let Err(e) = validate_non_empty_string("license key", key) {
            self.alert = Some(Alert::action_failed(e.user_friendly_message()));
            return Err(e);
        }

        let new_license = NewLicense {
            key: key.trim().to_string(),
            author: self.settings.license_author,
        };

        match self.api.create_license(&token, &new_license).await {
            Ok(created) => {
                match &created {
                    Some(license) => tracing::info!("Created license {} ({})", license.id, license.key),
                    None => tracing::info!("Created license ({})", new_license.key),
                }
                self.refresh_after_action().await;
                Ok(created)
            }
            Err(e) => {
                let alert = match &e {
                    e if e.is_connection_failure() => {
                        Alert::connection_failed("Could not connect to the server.")
                    }
                    other => Alert::action_failed(
                        other
                            .server_detail()
                            .unwrap_or("An error occurred while adding the license."),
                    ),
                };
                Err(self.fail(e, alert).await)
            }
        }
    }

    /// 以目前顯示的狀態為準切換啟用/停用
    pub async fn toggle_license(&mut self, id: i64) -> Result<Option<License>> {
        let token = self.require_token()?;
        let Some(current) = self.find_license(id).map(|l| l.is_active) else {
            self.alert = Some(Alert::action_failed(format!("License {} is not in the list.", id)));
            return Err(AdminError::LicenseNotFound { id });
        };

        match self.api.set_license_active(&token, id, !current).await {
            Ok(updated) => {
                tracing::info!("License {} is_active={}", id, !current);
                self.refresh_after_action().await;
                Ok(updated)
            }
            Err(e) => {
                let alert = Alert::action_failed("An error occurred while updating the license.");
                Err(self.fail(e, alert).await)
            }
        }
    }

    /// 刪除；確認步驟由呼叫端負責
    pub async fn delete_license(&mut self, id: i64) -> Result<()> {
        let token = self.require_token()?;

        match self.api.delete_license(&token, id).await {
            Ok(()) => {
                tracing::info!("Deleted license {}", id);
                self.refresh_after_action().await;
                Ok(())
            }
            Err(e) => {
                let alert = Alert::action_failed("An error occurred while deleting the license.");
                Err(self.fail(e, alert).await)
            }
        }
    }

    async fn refresh_after_action(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!("License list refresh failed: {}", e);
        }
    }

    /// 使用者互動；只有登入中才會重置閒置倒數
    pub fn record_activity(&mut self) {
        if self.guard.record_activity() {
            self.last_activity = Some(Utc::now());
        }
    }

    pub async fn handle_event(&mut self, event: GuardEvent) -> AppNotice {
        match event {
            GuardEvent::IdleTick(generation) => match self.guard.on_idle_tick(generation) {
                None | Some(IdleTick::Running) => AppNotice::Nothing,
                Some(IdleTick::WarningStarted) => AppNotice::SessionWarning {
                    remaining_secs: self.guard.idle_remaining_secs(),
                    started: true,
                },
                Some(IdleTick::Warning) => AppNotice::SessionWarning {
                    remaining_secs: self.guard.idle_remaining_secs(),
                    started: false,
                },
                Some(IdleTick::Expired) => {
                    tracing::info!("Session expired after inactivity");
                    self.logout().await;
                    self.alert = Some(Alert::new(
                        AlertKind::SessionExpired,
                        "Session Expired",
                        "You were logged out after a period of inactivity.",
                    ));
                    AppNotice::SessionExpired
                }
            },
            GuardEvent::LockoutTick(generation) => {
                if self.guard.on_lockout_tick(generation) {
                    AppNotice::LockoutCleared
                } else if self.guard.can_attempt_login() {
                    AppNotice::Nothing
                } else {
                    AppNotice::LockoutCountdown {
                        remaining_secs: self.guard.lockout_remaining_secs(),
                    }
                }
            }
        }
    }

    // --- 顯示用的查詢 ---

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_authenticated(&self) -> bool {
        self.view == View::Authenticated
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn licenses(&self) -> &[License] {
        &self.licenses
    }

    pub fn find_license(&self, id: i64) -> Option<&License> {
        self.licenses.iter().find(|l| l.id == id)
    }

    pub fn filtered_licenses(&self) -> Vec<&License> {
        filter_licenses(&self.licenses, &self.query, self.status_filter)
    }

    pub fn stats(&self) -> LicenseStats {
        self.stats
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }
}
