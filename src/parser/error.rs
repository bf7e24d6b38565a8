//! Error types for URL validation.

use thiserror::Error;

/// Errors produced when validating a download URL.
///
/// All variants are returned to the immediate caller before any side
/// effect occurs; nothing here touches the network or the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// The input was empty or whitespace-only.
    #[error("URL is empty")]
    Empty,

    /// The URL scheme is not one of http, https, ftp, ftps and the URL
    /// does not point at a recognized cloud-storage provider.
    #[error("invalid URL scheme: {scheme}")]
    UnsupportedScheme {
        /// The offending scheme ("" when the input had none).
        scheme: String,
    },

    /// The URL has no host/domain component.
    #[error("invalid URL: no domain")]
    NoHost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_error_display_names_the_scheme() {
        let err = UrlError::UnsupportedScheme {
            scheme: "gopher".to_string(),
        };
        assert_eq!(err.to_string(), "invalid URL scheme: gopher");
    }

    #[test]
    fn test_url_error_empty_display() {
        assert_eq!(UrlError::Empty.to_string(), "URL is empty");
    }
}
