//! Custom Askama template filters.

use std::fmt::Display;

use chrono::Datelike;

/// Copyright span from the given first year up to the current one.
///
/// Usage in templates: `{{ 2025|copyright_years }}` renders `2025-2027`
/// in 2027, and just `2025` during 2025.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn copyright_years(since: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(year_span(&since.to_string(), chrono::Utc::now().year()))
}

fn year_span(since: &str, now: i32) -> String {
    match since.trim().parse::<i32>() {
        Ok(first) if first < now => format!("{first}-{now}"),
        _ => now.to_string(),
    }
}
