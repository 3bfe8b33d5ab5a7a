pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCKOUT_SECS: u64 = 300;

/// 登入失敗計數與暫時鎖定
///
/// 只保存狀態；每秒的倒數由 [`crate::core::session::SessionGuard`] 的 ticker 呼叫 [`tick`](Self::tick)。
#[derive(Debug, Clone)]
pub struct LoginLockout {
    attempts: u32,
    max_attempts: u32,
    lockout_secs: u64,
    remaining_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// 尚未達到上限，還剩幾次
    Counted { attempts_left: u32 },
    /// 這次失敗觸發了鎖定，需要開始倒數
    LockoutStarted,
    /// 已經在鎖定中
    AlreadyLocked,
}

impl LoginLockout {
    pub fn new(max_attempts: u32, lockout_secs: u64) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            lockout_secs,
            remaining_secs: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn can_attempt_login(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn is_locked(&self) -> bool {
        !self.can_attempt_login()
    }

    pub fn record_failed_attempt(&mut self) -> FailureOutcome {
        if self.is_locked() {
            return FailureOutcome::AlreadyLocked;
        }

        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            self.remaining_secs = self.lockout_secs;
            FailureOutcome::LockoutStarted
        } else {
            FailureOutcome::Counted {
                attempts_left: self.max_attempts - self.attempts,
            }
        }
    }

    pub fn record_success(&mut self) {
        self.attempts = 0;
        self.remaining_secs = 0;
    }

    /// 倒數一秒；回傳 `true` 表示鎖定在這一秒解除
    pub fn tick(&mut self) -> bool {
        if !self.is_locked() {
            return false;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.attempts = 0;
            return true;
        }
        false
    }
}

impl Default for LoginLockout {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOGIN_ATTEMPTS, DEFAULT_LOCKOUT_SECS)
    }
}
