// lib.rs - StealthHawk reconnaissance orchestrator
// Runs a fixed set of external scanners against each target, optionally through TOR or a proxy chain

pub mod command_builder;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod preflight;
pub mod process_runner;
pub mod progress;
pub mod prompt;
pub mod routing;
pub mod target;
pub mod tools;
pub mod validator;

pub use command_builder::{CommandBuilder, CommandLine};
pub use config::ScanConfig;
pub use error::ReconError;
pub use orchestrator::{ExecutionResult, Orchestrator, RunSummary, Stage};
pub use routing::{ProxyEndpoint, RoutingMode};
pub use target::{Target, ensure_scheme};
pub use tools::ToolKind;
