use crate::app::commands::{parse_command, Command, HELP};
use crate::app::render;
use crate::core::app::{AdminApp, AppNotice};
use crate::core::session::GuardEvent;
use crate::domain::model::{Alert, Credentials};
use crate::domain::ports::{LicenseApi, TokenStore};
use crate::utils::error::Result;
use inquire::error::InquireError;
use inquire::{Password, PasswordDisplayMode};
use std::io::{IsTerminal, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

/// 下一行輸入要怎麼解讀
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Password { username: String },
    ConfirmDelete { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellControl {
    Continue,
    Exit,
}

pub struct Shell<A: LicenseApi, T: TokenStore> {
    app: AdminApp<A, T>,
    pending: Option<Pending>,
}

impl<A: LicenseApi, T: TokenStore> Shell<A, T> {
    pub fn new(app: AdminApp<A, T>) -> Self {
        Self { app, pending: None }
    }

    pub fn app(&self) -> &AdminApp<A, T> {
        &self.app
    }

    /// 下一個輸入是密碼
    pub fn awaiting_password(&self) -> bool {
        matches!(self.pending, Some(Pending::Password { .. }))
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    pub fn prompt(&self) -> String {
        match (&self.pending, self.app.username()) {
            (Some(Pending::Password { .. }), _) => "password: ".to_string(),
            (Some(Pending::ConfirmDelete { id }), _) => format!("delete license {}? [y/N] ", id),
            (None, _) if !self.app.is_authenticated() => "licensy (logged out)> ".to_string(),
            (None, Some(username)) => format!("licensy ({})> ", username),
            (None, None) => "licensy> ".to_string(),
        }
    }

    pub async fn startup<W: Write>(&mut self, out: &mut W) -> Result<()> {
        // 啟動失敗 (例如舊 token 被拒) 只會留下 alert
        if let Err(e) = self.app.startup().await {
            tracing::debug!("Startup: {}", e);
        }

        writeln!(out, "licensy-admin: connected from {}", self.app.client_ip())?;
        if self.app.is_authenticated() {
            writeln!(out, "Resumed previous session.")?;
            self.show_list(out)?;
        } else {
            writeln!(out, "Type 'login <username>' to start, 'help' for commands.")?;
        }
        self.flush_alert(out)
    }

    fn flush_alert<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if let Some(alert) = self.app.take_alert() {
            render::render_alert(out, &alert)?;
        }
        Ok(())
    }

    fn show_list<W: Write>(&self, out: &mut W) -> Result<()> {
        render::render_stats(out, &self.app.stats())?;
        render::render_licenses(out, &self.app.filtered_licenses())?;
        Ok(())
    }

    fn require_login<W: Write>(&self, out: &mut W) -> Result<bool> {
        if !self.app.is_authenticated() {
            writeln!(out, "Not logged in.")?;
            return Ok(false);
        }
        Ok(true)
    }

    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<ShellControl> {
        // 每一行輸入都算一次使用者互動
        self.app.record_activity();

        if let Some(pending) = self.pending.take() {
            self.handle_pending(pending, line, out).await?;
            self.flush_alert(out)?;
            return Ok(ShellControl::Continue);
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e.user_friendly_message())?;
                return Ok(ShellControl::Continue);
            }
        };

        let control = self.run_command(command, out).await?;
        self.flush_alert(out)?;
        Ok(control)
    }

    async fn handle_pending<W: Write>(&mut self, pending: Pending, line: &str, out: &mut W) -> Result<()> {
        match pending {
            Pending::Password { username } => {
                let credentials = Credentials::new(username, line.trim_end_matches(['\r', '\n']));
                if self.app.login(credentials).await.is_ok() {
                    writeln!(out, "Logged in.")?;
                    if self.app.is_authenticated() {
                        self.show_list(out)?;
                    }
                } else if !self.app.guard().can_attempt_login() {
                    writeln!(
                        out,
                        "Login disabled for {} seconds.",
                        self.app.guard().lockout_remaining_secs()
                    )?;
                } else {
                    let guard = self.app.guard();
                    writeln!(
                        out,
                        "Attempt {}/{}.",
                        guard.login_attempts(),
                        guard.max_login_attempts()
                    )?;
                }
            }
            Pending::ConfirmDelete { id } => {
                if matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
                    if self.app.delete_license(id).await.is_ok() {
                        writeln!(out, "License {} deleted.", id)?;
                    }
                } else {
                    writeln!(out, "Cancelled.")?;
                }
            }
        }
        Ok(())
    }

    async fn run_command<W: Write>(&mut self, command: Command, out: &mut W) -> Result<ShellControl> {
        match command {
            Command::Empty => {}
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(ShellControl::Exit),
            Command::Login { username } => {
                let guard = self.app.guard();
                if !guard.can_attempt_login() {
                    // 鎖定中不讀密碼
                    render::render_alert(out, &Alert::locked_out(guard.lockout_remaining_secs()))?;
                } else {
                    self.pending = Some(Pending::Password { username });
                }
            }
            Command::Logout => {
                self.app.logout().await;
                writeln!(out, "Logged out.")?;
            }
            Command::List => {
                if self.require_login(out)? {
                    self.show_list(out)?;
                }
            }
            Command::Refresh => {
                if self.app.refresh().await.is_ok() {
                    self.show_list(out)?;
                }
            }
            Command::Search { text } => {
                if self.require_login(out)? {
                    self.app.set_query(text);
                    render::render_licenses(out, &self.app.filtered_licenses())?;
                }
            }
            Command::Filter(status) => {
                if self.require_login(out)? {
                    self.app.set_status_filter(status);
                    render::render_licenses(out, &self.app.filtered_licenses())?;
                }
            }
            Command::Add { key } => {
                if let Ok(created) = self.app.create_license(&key).await {
                    let key = created.map(|license| license.key).unwrap_or(key);
                    writeln!(out, "License {} created.", key)?;
                }
            }
            Command::Toggle { id } => {
                if self.app.toggle_license(id).await.is_ok() {
                    // 以重新載入後的清單為準
                    match self.app.find_license(id) {
                        Some(license) => {
                            let state = if license.is_active { "active" } else { "inactive" };
                            writeln!(out, "License {} is now {}.", id, state)?;
                        }
                        None => writeln!(out, "License {} updated.", id)?,
                    }
                }
            }
            Command::Delete { id } => {
                if self.require_login(out)? {
                    self.pending = Some(Pending::ConfirmDelete { id });
                }
            }
            Command::Copy { id } => {
                if self.require_login(out)? {
                    match self.app.find_license(id) {
                        Some(license) => writeln!(out, "{}", license.key)?,
                        None => writeln!(out, "License {} is not in the list.", id)?,
                    }
                }
            }
            Command::Stats => {
                if self.require_login(out)? {
                    render::render_stats(out, &self.app.stats())?;
                }
            }
            Command::Status => self.show_status(out)?,
        }
        Ok(ShellControl::Continue)
    }

    fn show_status<W: Write>(&self, out: &mut W) -> Result<()> {
        let guard = self.app.guard();
        writeln!(out, "IP address:     {}", self.app.client_ip())?;
        if self.app.is_authenticated() {
            writeln!(out, "User:           {}", self.app.username().unwrap_or("(stored token)"))?;
            writeln!(out, "Session left:   {}s", guard.idle_remaining_secs())?;
            if let Some(at) = self.app.last_activity() {
                writeln!(out, "Last activity:  {}", at.with_timezone(&chrono::Local).format("%H:%M:%S"))?;
            }
            writeln!(
                out,
                "Filter:         {} / search '{}'",
                self.app.status_filter(),
                self.app.query()
            )?;
        } else {
            writeln!(out, "Not logged in.")?;
            writeln!(
                out,
                "Login attempts: {}/{}",
                guard.login_attempts(),
                guard.max_login_attempts()
            )?;
            if !guard.can_attempt_login() {
                writeln!(out, "Locked for:     {}s", guard.lockout_remaining_secs())?;
            }
        }
        Ok(())
    }

    pub async fn handle_event<W: Write>(&mut self, event: GuardEvent, out: &mut W) -> Result<()> {
        match self.app.handle_event(event).await {
            AppNotice::Nothing | AppNotice::LockoutCountdown { .. } => {}
            AppNotice::SessionWarning {
                remaining_secs,
                started,
            } => {
                if render::should_show_countdown(remaining_secs, started) {
                    writeln!(out)?;
                    render::render_session_warning(out, remaining_secs)?;
                }
            }
            AppNotice::SessionExpired => {
                self.pending = None;
                writeln!(out)?;
                self.flush_alert(out)?;
            }
            AppNotice::LockoutCleared => {
                writeln!(out)?;
                writeln!(out, "Login is available again.")?;
            }
        }
        Ok(())
    }
}

/// 終端機上以遮罩方式讀密碼；使用者取消時回傳 `None`
async fn read_masked_password() -> Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Password::new("password:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
    })
    .await
    .map_err(std::io::Error::other)?;

    match answer {
        Ok(password) => Ok(Some(password)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(InquireError::IO(e)) => Err(e.into()),
        Err(e) => Err(std::io::Error::other(e).into()),
    }
}

fn show_prompt<A: LicenseApi, T: TokenStore, W: Write>(
    shell: &Shell<A, T>,
    out: &mut W,
    masked_password: bool,
) -> Result<()> {
    // 遮罩輸入由 inquire 自己印提示
    if !(masked_password && shell.awaiting_password()) {
        write!(out, "{}", shell.prompt())?;
    }
    out.flush()?;
    Ok(())
}

/// 互動主迴圈：stdin 的每一行與 ticker 事件在同一個任務裡處理
///
/// stdin 是終端機時密碼改用遮罩輸入；管線輸入仍逐行讀取。
pub async fn run<A: LicenseApi, T: TokenStore>(
    mut shell: Shell<A, T>,
    mut events: UnboundedReceiver<GuardEvent>,
) -> Result<()> {
    let mut stdout = std::io::stdout();
    let masked_password = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    shell.startup(&mut stdout).await?;
    show_prompt(&shell, &mut stdout, masked_password)?;

    loop {
        if masked_password && shell.awaiting_password() {
            // 讀密碼期間的 tick 留在 channel 裡，之後再處理
            match read_masked_password().await? {
                Some(password) => {
                    shell.handle_line(&password, &mut stdout).await?;
                }
                None => {
                    shell.cancel_pending();
                    writeln!(stdout, "Cancelled.")?;
                }
            }
            show_prompt(&shell, &mut stdout, masked_password)?;
            continue;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if shell.handle_line(&line, &mut stdout).await? == ShellControl::Exit {
                    break;
                }
                show_prompt(&shell, &mut stdout, masked_password)?;
            }
            Some(event) = events.recv() => {
                shell.handle_event(event, &mut stdout).await?;
                stdout.flush()?;
            }
        }
    }

    writeln!(stdout)?;
    Ok(())
}
