//! Runtime configuration for the orchestrator.
//!
//! Everything here is plain data handed down from the caller (CLI flags,
//! embedding application); nothing reads the environment implicitly.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default directory downloads are written into.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Default aria2 control-channel port.
pub const DEFAULT_RPC_PORT: u16 = 6800;

/// Default parallel connection count for the accelerator engine.
pub const DEFAULT_CONNECTIONS: u16 = 16;

/// Configuration shared by the dispatcher and the control-channel client.
///
/// The control-channel secret deliberately has no default: the channel can
/// only be used when a caller provides one explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory all engines write their output into.
    pub download_dir: PathBuf,
    /// Port the aria2 control channel listens on.
    pub rpc_port: u16,
    /// Shared secret for the aria2 control channel. `None` disables it.
    pub rpc_secret: Option<String>,
    /// Parallel connections requested from the accelerator engine.
    pub connections: u16,
    /// Split count requested from the accelerator engine.
    pub split: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            rpc_port: DEFAULT_RPC_PORT,
            rpc_secret: None,
            connections: DEFAULT_CONNECTIONS,
            split: DEFAULT_CONNECTIONS,
        }
    }
}

impl Config {
    /// Creates a config writing into `download_dir` with all other defaults.
    #[must_use]
    pub fn with_download_dir(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            ..Self::default()
        }
    }
}

/// Idempotently creates `dir` (and parents), returning the path back.
///
/// Every execution runs this before launching an engine; concurrent calls
/// are safe because `create_dir_all` tolerates the directory existing.
///
/// # Errors
///
/// Returns the underlying I/O error when the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<&Path, io::Error> {
    std::fs::create_dir_all(dir)?;
    debug!(dir = %dir.display(), "download directory ready");
    Ok(dir)
}
