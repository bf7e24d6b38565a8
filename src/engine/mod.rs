//! Engine catalog and the execution dispatcher.
//!
//! An [`Engine`] is a closed set of external download tools. The static
//! [`EngineDescriptor`] catalog carries capability information for
//! display and selection; execution parameters are hard-coded in the
//! per-engine adapters and never derived from the catalog, so descriptor
//! edits cannot affect a running transfer.
//!
//! Adding or removing an engine is a compile-time-checked change: the
//! dispatcher selects adapters through an exhaustive `match`.

mod aria2;
mod curl;
mod dispatcher;
mod error;
mod mega;
mod wget;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

/// One external download engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// aria2c, parallel-connection accelerator.
    Aria2,
    /// wget, single-connection HTTP/FTP client.
    Wget,
    /// curl, redirect-following transfer tool.
    Curl,
    /// megadl, Mega.nz-specific downloader.
    Mega,
}

/// All supported engines, in catalog order.
pub const ALL_ENGINES: [Engine; 4] = [Engine::Aria2, Engine::Wget, Engine::Curl, Engine::Mega];

impl Engine {
    /// Stable lowercase identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Aria2 => "aria2",
            Self::Wget => "wget",
            Self::Curl => "curl",
            Self::Mega => "mega",
        }
    }

    /// The executable this engine launches.
    #[must_use]
    pub fn binary(self) -> &'static str {
        match self {
            Self::Aria2 => "aria2c",
            Self::Wget => "wget",
            Self::Curl => "curl",
            Self::Mega => "megadl",
        }
    }

    /// The catalog entry for this engine.
    #[must_use]
    pub fn descriptor(self) -> &'static EngineDescriptor {
        match self {
            Self::Aria2 => &ARIA2_DESCRIPTOR,
            Self::Wget => &WGET_DESCRIPTOR,
            Self::Curl => &CURL_DESCRIPTOR,
            Self::Mega => &MEGA_DESCRIPTOR,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Engine {
    type Err = DispatchError;

    /// Case-insensitive lookup; unknown names fail with
    /// [`DispatchError::UnknownEngine`] before a task can be built.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aria2" | "aria2c" => Ok(Self::Aria2),
            "wget" => Ok(Self::Wget),
            "curl" => Ok(Self::Curl),
            "mega" | "megadl" => Ok(Self::Mega),
            _ => Err(DispatchError::unknown_engine(s)),
        }
    }
}

/// Case-insensitive catalog lookup.
#[must_use]
pub fn find(id: &str) -> Option<Engine> {
    Engine::from_str(id).ok()
}

/// Immutable capability information about one engine.
///
/// Populated once as static data and read-only thereafter; safe for
/// concurrent reads from any number of threads without locking.
#[derive(Debug)]
pub struct EngineDescriptor {
    /// Human name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Advantages, for display.
    pub pros: &'static [&'static str],
    /// Limitations, for display.
    pub cons: &'static [&'static str],
    /// Maximum parallel connections the engine supports.
    pub max_connections: u32,
    /// Whether interrupted transfers can be resumed.
    pub supports_resume: bool,
    /// Free-text hint about the best use case.
    pub best_for: &'static str,
}

static ARIA2_DESCRIPTOR: EngineDescriptor = EngineDescriptor {
    name: "Aria2",
    description: "Ultra-fast download accelerator with multi-connection support",
    pros: &[
        "Multi-threaded (up to 32x)",
        "Resume support",
        "RPC control",
        "Best for large files",
    ],
    cons: &["Requires setup", "More complex"],
    max_connections: 32,
    supports_resume: true,
    best_for: "Large files, slow servers",
};

static WGET_DESCRIPTOR: EngineDescriptor = EngineDescriptor {
    name: "Wget",
    description: "Simple and reliable HTTP/HTTPS/FTP downloader",
    pros: &["Simple to use", "Widely supported", "Stable"],
    cons: &["Single connection", "Limited features"],
    max_connections: 1,
    supports_resume: true,
    best_for: "Small files, direct links",
};

static CURL_DESCRIPTOR: EngineDescriptor = EngineDescriptor {
    name: "cURL",
    description: "Powerful data transfer tool with many protocols",
    pros: &["Protocol versatile", "Good for APIs", "Flexible"],
    cons: &["Single connection", "Complex syntax"],
    max_connections: 1,
    supports_resume: true,
    best_for: "API downloads, special protocols",
};

static MEGA_DESCRIPTOR: EngineDescriptor = EngineDescriptor {
    name: "Mega Auto",
    description: "Specialized Mega.nz downloader with bypass support",
    pros: &["No quota limit", "Resume support", "Auto-extract"],
    cons: &["Mega only", "Slower than direct"],
    max_connections: 4,
    supports_resume: true,
    best_for: "Mega.nz files",
};

/// Scans `search_path` and returns the engines whose executables are
/// present, in catalog order.
///
/// This is the explicit startup probe: callers run it once and pass the
/// result down, instead of relying on hidden initialization-time state.
/// No process is spawned; presence means an executable file on the path.
#[must_use]
pub fn detect_available_engines(search_path: &OsStr) -> Vec<Engine> {
    let available: Vec<Engine> = ALL_ENGINES
        .into_iter()
        .filter(|engine| binary_on_path(search_path, engine.binary()).is_some())
        .collect();
    debug!(?available, "engine availability probed");
    available
}

/// Resolves `name` to an executable file within `search_path`.
///
/// First match in path order wins, mirroring shell lookup.
pub(crate) fn binary_on_path(search_path: &OsStr, name: &str) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
