//! Time-string formatting for display values

/// Format milliseconds as zero-padded "HH:MM:SS", truncating to whole seconds.
///
/// Negative inputs are clamped to zero. Hours are not wrapped, so anything
/// past 99 hours simply grows a wider hour field.
pub fn format_hms(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let h = total_secs / 3600;
    let m = (total_secs / 60) % 60;
    let s = total_secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
