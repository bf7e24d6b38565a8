//! URL validation and provider classification.
//!
//! Pure, deterministic string inspection: no network I/O happens anywhere
//! in this module. Callers validate before building a task, classify to
//! auto-select an engine, and derive a default output name from the URL.

mod error;
mod url;

pub use error::UrlError;
pub use url::{ProviderKind, classify, filename_from_url, validate};
