use crate::domain::model::{Alert, License, LicenseStats};
use std::io::{self, Write};

pub fn render_alert<W: Write>(out: &mut W, alert: &Alert) -> io::Result<()> {
    let width = alert.title.len().max(alert.message.len()) + 4;
    let border = "─".repeat(width);

    writeln!(out, "┌{}┐", border)?;
    writeln!(out, "│  {:<w$}  │", alert.title, w = width - 4)?;
    writeln!(out, "│  {:<w$}  │", alert.message, w = width - 4)?;
    writeln!(out, "└{}┘", border)
}

pub fn render_licenses<W: Write>(out: &mut W, licenses: &[&License]) -> io::Result<()> {
    if licenses.is_empty() {
        return writeln!(out, "No licenses found.");
    }

    let key_width = licenses
        .iter()
        .map(|l| l.key.len())
        .max()
        .unwrap_or(0)
        .max(3);

    writeln!(
        out,
        "{:>6}  {:<kw$}  {:<8}  {:<10}  {:<10}",
        "ID",
        "KEY",
        "STATUS",
        "CREATED",
        "UPDATED",
        kw = key_width
    )?;
    for license in licenses {
        writeln!(
            out,
            "{:>6}  {:<kw$}  {:<8}  {:<10}  {:<10}",
            license.id,
            license.key,
            if license.is_active { "active" } else { "inactive" },
            license.created_at.format("%Y-%m-%d").to_string(),
            license.updated_at.format("%Y-%m-%d").to_string(),
            kw = key_width
        )?;
    }
    Ok(())
}

pub fn render_stats<W: Write>(out: &mut W, stats: &LicenseStats) -> io::Result<()> {
    writeln!(
        out,
        "Total: {}  Active: {}  Inactive: {}  Last 7 days: {}",
        stats.total, stats.active, stats.inactive, stats.recent
    )
}

/// 警告區間內不每秒都印，只在開始、每 15 秒與最後 5 秒顯示
pub fn should_show_countdown(remaining_secs: u64, started: bool) -> bool {
    started || remaining_secs % 15 == 0 || remaining_secs <= 5
}

pub fn render_session_warning<W: Write>(out: &mut W, remaining_secs: u64) -> io::Result<()> {
    writeln!(
        out,
        "⚠️  Session expires in {} seconds. Type anything to stay logged in.",
        remaining_secs
    )
}
