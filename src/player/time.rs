/// Format a millisecond offset as `M:SS`.
///
/// Minutes are not padded; seconds are truncated, never rounded.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
