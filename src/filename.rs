//! Filesystem-safe output naming for downloads.
//!
//! Every engine writes to `<download_dir>/<name>` where `<name>` comes from
//! the caller's explicit choice, the URL's last path segment, or a generic
//! fallback, always passed through [`clean_filename`] first.

use crate::parser::filename_from_url;

/// Maximum output filename length in bytes.
const MAX_FILENAME_BYTES: usize = 255;

/// Fallback name when neither the caller nor the URL yields one.
const DEFAULT_OUTPUT_NAME: &str = "download";

/// Sanitizes a filename for safe filesystem use.
///
/// Replaces characters that are invalid on common filesystems
/// (`< > : " / \ | ? *`) and control characters with `_`, trims
/// surrounding whitespace, and caps the result at 255 bytes while
/// preserving the extension. Truncation never splits a UTF-8 character.
#[must_use]
pub fn clean_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.len() <= MAX_FILENAME_BYTES {
        return cleaned.to_string();
    }

    // Keep the extension, shrink the stem to fit the byte budget.
    let (stem, ext) = match cleaned.rfind('.') {
        Some(pos) if pos > 0 => cleaned.split_at(pos),
        _ => (cleaned, ""),
    };
    let budget = MAX_FILENAME_BYTES.saturating_sub(ext.len());
    let mut cut = budget.min(stem.len());
    while cut > 0 && !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut result = format!("{}{ext}", &stem[..cut]);

    // Pathological extension longer than the whole budget.
    if result.len() > MAX_FILENAME_BYTES {
        let mut end = MAX_FILENAME_BYTES;
        while end > 0 && !result.is_char_boundary(end) {
            end -= 1;
        }
        result.truncate(end);
    }
    result
}

/// Resolves the output filename for a transfer.
///
/// Priority: explicit caller-provided name, then the URL's last path
/// segment, then `"download"`. The result is always sanitized and
/// non-empty.
#[must_use]
pub fn output_filename(explicit: Option<&str>, url: &str) -> String {
    let raw = explicit
        .map(ToString::to_string)
        .or_else(|| filename_from_url(url))
        .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string());

    let cleaned = clean_filename(&raw);
    if cleaned.is_empty() {
        DEFAULT_OUTPUT_NAME.to_string()
    } else {
        cleaned
    }
}
