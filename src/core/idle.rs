pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SESSION_WARNING_SECS: u64 = 60;

/// 閒置倒數計時
#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout_secs: u64,
    warning_secs: u64,
    remaining_secs: u64,
    warning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTick {
    Running,
    /// 這一秒剛進入警告區間
    WarningStarted,
    Warning,
    Expired,
}

impl IdleTimer {
    pub fn new(timeout_secs: u64, warning_secs: u64) -> Self {
        Self {
            timeout_secs,
            warning_secs,
            remaining_secs: timeout_secs,
            warning: false,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn warning_active(&self) -> bool {
        self.warning
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn reset(&mut self) {
        self.remaining_secs = self.timeout_secs;
        self.warning = false;
    }

    pub fn tick(&mut self) -> IdleTick {
        if self.is_expired() {
            return IdleTick::Expired;
        }

        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            self.warning = true;
            return IdleTick::Expired;
        }

        if self.remaining_secs <= self.warning_secs {
            if self.warning {
                return IdleTick::Warning;
            }
            self.warning = true;
            return IdleTick::WarningStarted;
        }

        IdleTick::Running
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TIMEOUT_SECS, DEFAULT_SESSION_WARNING_SECS)
    }
}
