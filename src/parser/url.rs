//! URL validation, provider classification, and filename extraction.

use std::fmt;

use tracing::trace;
use url::Url;

use super::error::UrlError;

/// Schemes accepted without further inspection.
const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Provider classification of a download URL.
///
/// Matched by case-insensitive substring against a fixed, ordered marker
/// table; the first match wins. URLs matching nothing are `Direct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Mega.nz cloud storage.
    Mega,
    /// Google Drive / Google Docs.
    GoogleDrive,
    /// MediaFire file hosting.
    MediaFire,
    /// GitHub (releases, raw files).
    GitHub,
    /// Plain direct link, no special handling.
    Direct,
}

impl ProviderKind {
    /// Stable identifier used in logs and CLI output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mega => "mega",
            Self::GoogleDrive => "gdrive",
            Self::MediaFire => "mediafire",
            Self::GitHub => "github",
            Self::Direct => "direct",
        }
    }

    /// Whether this provider is a cloud-storage service (as opposed to a
    /// generic host). Used by `validate` for the scheme fallback.
    #[must_use]
    pub fn is_cloud_storage(self) -> bool {
        matches!(self, Self::Mega | Self::GoogleDrive | Self::MediaFire)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered marker table; earlier entries win.
const PROVIDER_MARKERS: [(&str, ProviderKind); 6] = [
    ("mega.nz", ProviderKind::Mega),
    ("mega.co.nz", ProviderKind::Mega),
    ("drive.google.com", ProviderKind::GoogleDrive),
    ("docs.google.com", ProviderKind::GoogleDrive),
    ("mediafire.com", ProviderKind::MediaFire),
    ("github.com", ProviderKind::GitHub),
];

/// Validates a download URL.
///
/// Returns a non-empty human-readable reason on success. Fails when the
/// input is empty/whitespace-only, when the scheme is outside
/// {http, https, ftp, ftps} and the URL does not carry a cloud-storage
/// marker, or when no host component is present. Performs no I/O.
///
/// # Errors
///
/// Returns [`UrlError`] describing the first rule the input violates.
pub fn validate(url: &str) -> Result<&'static str, UrlError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    match Url::parse(trimmed) {
        Ok(parsed) => {
            if ALLOWED_SCHEMES.contains(&parsed.scheme()) {
                if parsed.host_str().is_none_or(str::is_empty) {
                    return Err(UrlError::NoHost);
                }
                trace!(url = %trimmed, "URL validated");
                Ok("valid URL")
            } else if classify(trimmed).is_cloud_storage() {
                // Cloud links are accepted even with exotic schemes; the
                // provider-specific engine knows how to handle them.
                Ok("valid cloud-storage URL")
            } else {
                Err(UrlError::UnsupportedScheme {
                    scheme: parsed.scheme().to_string(),
                })
            }
        }
        // Scheme-less or otherwise unparseable input. Cloud links still
        // pass; a recognized scheme that failed to parse means the host
        // was missing; everything else reports its scheme prefix.
        Err(_) if classify(trimmed).is_cloud_storage() => Ok("valid cloud-storage URL"),
        Err(_) => {
            let scheme = scheme_prefix(trimmed);
            if ALLOWED_SCHEMES.contains(&scheme) {
                Err(UrlError::NoHost)
            } else {
                Err(UrlError::UnsupportedScheme {
                    scheme: scheme.to_string(),
                })
            }
        }
    }
}

/// Best-effort scheme extraction for error reporting on unparseable input.
fn scheme_prefix(url: &str) -> &str {
    match url.split_once(':') {
        Some((prefix, _)) if prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') => {
            prefix
        }
        _ => "",
    }
}

/// Classifies a URL into a provider category.
///
/// Case-insensitive substring match over the whole URL against the fixed
/// marker table, first match in table order; deterministic and pure.
#[must_use]
pub fn classify(url: &str) -> ProviderKind {
    let lowered = url.to_lowercase();
    for (marker, kind) in PROVIDER_MARKERS {
        if lowered.contains(marker) {
            return kind;
        }
    }
    ProviderKind::Direct
}

/// Extracts the filename from a URL's last path segment.
///
/// Returns `None` when the URL does not parse or its path has no
/// non-empty final segment. The query string is never inspected.
#[must_use]
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if last.is_empty() {
        None
    } else {
        Some(last.to_string())
    }
}
