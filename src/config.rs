// config.rs - Run configuration
// Purpose: Everything a run needs besides the operator's interactive answers

use crate::command_builder::PROXYCHAINS_BIN;
use crate::validator::DEFAULT_PROBE_URL;
use std::path::PathBuf;
use std::time::Duration;

/// Local TOR SOCKS listener, resolved remotely (socks5h)
pub const DEFAULT_TOR_PROXY: &str = "socks5h://127.0.0.1:9050";

#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Domains given on the command line; empty means ask
    pub domains: Vec<String>,
    /// Route through TOR without asking
    pub use_tor: bool,
    /// Proxy chain file given on the command line
    pub proxy_file: Option<PathBuf>,
    /// Ask questions for anything not given on the command line
    pub interactive: bool,
    pub tor_proxy: String,
    pub probe_url: String,
    pub tor_timeout: Duration,
    pub proxy_timeout: Duration,
    /// Per-tool limit (None = wait forever)
    pub tool_timeout: Option<Duration>,
    /// Targets scanned at once (tools within a target always run in order)
    pub parallel_targets: usize,
    pub proxychains_bin: String,
    /// Where the validated proxy list is written for proxychains
    /// (None = private temp file removed after the run)
    pub proxychains_conf: Option<PathBuf>,
    /// Save every tool output under `<dir>/<host>/<tool>.txt`
    pub output_dir: Option<PathBuf>,
    /// Append JSONL run events here
    pub events_file: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            use_tor: false,
            proxy_file: None,
            interactive: true,
            tor_proxy: DEFAULT_TOR_PROXY.to_string(),
            probe_url: DEFAULT_PROBE_URL.to_string(),
            tor_timeout: Duration::from_secs(10),
            proxy_timeout: Duration::from_secs(5),
            tool_timeout: None,
            parallel_targets: 1,
            proxychains_bin: PROXYCHAINS_BIN.to_string(),
            proxychains_conf: None,
            output_dir: None,
            events_file: None,
        }
    }
}

impl ScanConfig {
    /// Non-interactive config for the given domains
    pub fn batch<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            interactive: false,
            ..Default::default()
        }
    }

    /// Routing was fixed on the command line, so no routing question is needed
    pub fn routing_preset(&self) -> bool {
        self.use_tor || self.proxy_file.is_some()
    }
}
