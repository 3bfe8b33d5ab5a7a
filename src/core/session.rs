use crate::core::idle::{IdleTick, IdleTimer};
use crate::core::lockout::{FailureOutcome, LoginLockout};
use crate::core::ticker::{Ticker, TICK_PERIOD};
use tokio::sync::mpsc::UnboundedSender;

/// ticker 送進事件迴圈的事件，帶著產生它的 ticker 世代編號
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent {
    IdleTick(u64),
    LockoutTick(u64),
}

#[derive(Debug, Clone, Copy)]
pub struct GuardSettings {
    pub session_timeout_secs: u64,
    pub session_warning_secs: u64,
    pub max_login_attempts: u32,
    pub lockout_secs: u64,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            session_timeout_secs: crate::core::idle::DEFAULT_SESSION_TIMEOUT_SECS,
            session_warning_secs: crate::core::idle::DEFAULT_SESSION_WARNING_SECS,
            max_login_attempts: crate::core::lockout::DEFAULT_MAX_LOGIN_ATTEMPTS,
            lockout_secs: crate::core::lockout::DEFAULT_LOCKOUT_SECS,
        }
    }
}

/// 登入鎖定與閒置逾時的守門員
///
/// 兩個倒數各自由一個 [`Ticker`] 驅動。ticker 只存在於對應的狀態期間：
/// session 開始時建立閒置 ticker，結束時丟棄；鎖定開始時建立鎖定 ticker，解除時丟棄。
/// 重新開始 session 會先丟掉舊的 ticker，所以同時最多只有一個閒置 ticker。
#[derive(Debug)]
pub struct SessionGuard {
    lockout: LoginLockout,
    idle: IdleTimer,
    events: UnboundedSender<GuardEvent>,
    generation: u64,
    idle_ticker: Option<(u64, Ticker)>,
    lockout_ticker: Option<(u64, Ticker)>,
}

impl SessionGuard {
    pub fn new(settings: GuardSettings, events: UnboundedSender<GuardEvent>) -> Self {
        Self {
            lockout: LoginLockout::new(settings.max_login_attempts, settings.lockout_secs),
            idle: IdleTimer::new(settings.session_timeout_secs, settings.session_warning_secs),
            events,
            generation: 0,
            idle_ticker: None,
            lockout_ticker: None,
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    // --- session / idle ---

    pub fn start_session(&mut self) {
        self.idle.reset();
        let generation = self.next_generation();
        let ticker = Ticker::spawn(
            TICK_PERIOD,
            self.events.clone(),
            GuardEvent::IdleTick(generation),
        );
        // 取代舊的 ticker 時舊任務會在 drop 時中止
        if self.idle_ticker.replace((generation, ticker)).is_some() {
            tracing::debug!("Replaced existing idle ticker");
        }
        tracing::info!(
            "Session started, idle timeout {}s",
            self.idle.remaining_secs()
        );
    }

    pub fn end_session(&mut self) {
        if self.idle_ticker.take().is_some() {
            tracing::info!("Session ended, idle ticker released");
        }
        self.idle.reset();
    }

    pub fn is_session_active(&self) -> bool {
        self.idle_ticker.is_some()
    }

    /// 使用者有操作；只有 session 進行中才會重置倒數
    pub fn record_activity(&mut self) -> bool {
        if !self.is_session_active() {
            return false;
        }
        self.idle.reset();
        true
    }

    /// 處理閒置 tick；舊世代或 session 已結束時回傳 `None`
    pub fn on_idle_tick(&mut self, generation: u64) -> Option<IdleTick> {
        match &self.idle_ticker {
            Some((current, _)) if *current == generation => Some(self.idle.tick()),
            _ => {
                tracing::debug!("Ignoring stale idle tick (generation {})", generation);
                None
            }
        }
    }

    pub fn idle_remaining_secs(&self) -> u64 {
        self.idle.remaining_secs()
    }

    pub fn warning_active(&self) -> bool {
        self.is_session_active() && self.idle.warning_active()
    }

    // --- login lockout ---

    pub fn can_attempt_login(&self) -> bool {
        self.lockout.can_attempt_login()
    }

    pub fn login_attempts(&self) -> u32 {
        self.lockout.attempts()
    }

    pub fn max_login_attempts(&self) -> u32 {
        self.lockout.max_attempts()
    }

    pub fn lockout_remaining_secs(&self) -> u64 {
        self.lockout.remaining_secs()
    }

    pub fn record_failed_attempt(&mut self) -> FailureOutcome {
        let outcome = self.lockout.record_failed_attempt();
        if outcome == FailureOutcome::LockoutStarted {
            let generation = self.next_generation();
            let ticker = Ticker::spawn(
                TICK_PERIOD,
                self.events.clone(),
                GuardEvent::LockoutTick(generation),
            );
            self.lockout_ticker = Some((generation, ticker));
            tracing::warn!(
                "Login locked for {}s after {} failed attempts",
                self.lockout.remaining_secs(),
                self.lockout.attempts()
            );
        }
        outcome
    }

    pub fn record_success(&mut self) {
        self.lockout.record_success();
        self.lockout_ticker = None;
    }

    /// 處理鎖定 tick；回傳 `true` 表示鎖定剛解除
    pub fn on_lockout_tick(&mut self, generation: u64) -> bool {
        match &self.lockout_ticker {
            Some((current, _)) if *current == generation => {
                let cleared = self.lockout.tick();
                if cleared {
                    self.lockout_ticker = None;
                    tracing::info!("Login lockout cleared");
                }
                cleared
            }
            _ => false,
        }
    }

    /// 目前閒置 ticker 的世代；沒有 session 時為 `None`
    pub fn idle_generation(&self) -> Option<u64> {
        self.idle_ticker.as_ref().map(|(generation, _)| *generation)
    }

    pub fn lockout_generation(&self) -> Option<u64> {
        self.lockout_ticker.as_ref().map(|(generation, _)| *generation)
    }
}
