//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use dlmux::config::{DEFAULT_CONNECTIONS, DEFAULT_RPC_PORT};

/// Download files through the best available external engine.
///
/// dlmux validates and classifies each URL, picks an engine (or uses the
/// one requested), and dispatches the transfer to the external tool,
/// reporting progress and a final status per URL.
#[derive(Parser, Debug)]
#[command(name = "dlmux")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download
    pub urls: Vec<String>,

    /// Engine to use (aria2, wget, curl, mega); auto-selected from the URL when omitted
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Output filename (applies to single-URL runs only)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Directory downloads are written into
    #[arg(short = 'd', long)]
    pub dir: Option<PathBuf>,

    /// Parallel connections for the accelerator engine (1-32)
    #[arg(short = 'x', long, default_value_t = DEFAULT_CONNECTIONS, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub connections: u16,

    /// Split count for the accelerator engine (1-32)
    #[arg(short = 's', long, default_value_t = DEFAULT_CONNECTIONS, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub split: u16,

    /// Print the engine catalog and exit
    #[arg(long)]
    pub engines: bool,

    /// Probe which engines are installed and exit
    #[arg(long)]
    pub detect: bool,

    /// aria2 control-channel port
    #[arg(long, default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// aria2 control-channel shared secret (the channel stays disabled without it)
    #[arg(long)]
    pub rpc_secret: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
