use crate::domain::model::{License, LicenseStats, StatusFilter};
use chrono::{DateTime, Duration, Utc};

/// 依關鍵字 (不分大小寫的子字串) 與狀態過濾
pub fn filter_licenses<'a>(
    licenses: &'a [License],
    query: &str,
    status: StatusFilter,
) -> Vec<&'a License> {
    let needle = query.trim().to_lowercase();

    licenses
        .iter()
        .filter(|license| needle.is_empty() || license.key.to_lowercase().contains(&needle))
        .filter(|license| status.matches(license))
        .collect()
}

pub fn compute_stats(licenses: &[License], now: DateTime<Utc>) -> LicenseStats {
    let week_ago = now - Duration::days(7);
    let active = licenses.iter().filter(|l| l.is_active).count();

    LicenseStats {
        total: licenses.len(),
        active,
        inactive: licenses.len() - active,
        recent: licenses.iter().filter(|l| l.created_at > week_ago).count(),
    }
}
