//! Human-readable byte size and transfer speed formatting.

/// Unit suffixes, 1024-based.
const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count as a human-readable string.
///
/// Sizes scale at exactly 1024 per unit, through TB. Zero renders as
/// `"0 B"`; everything else carries two decimals.
///
/// # Examples
///
/// ```
/// use dlmux::humanize::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 B");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// ```
#[must_use]
pub fn format_bytes(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }

    #[allow(clippy::cast_precision_loss)]
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{size_bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

/// Formats a transfer speed (bytes per second) as a human-readable string.
#[must_use]
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec <= 0.0 {
        return "0 B/s".to_string();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let truncated = bytes_per_sec as u64;
    format!("{}/s", format_bytes(truncated))
}
