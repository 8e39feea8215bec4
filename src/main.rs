// main.rs - StealthHawk - Stealthy Reconnaissance Orchestrator
// Purpose: Collect targets, pick a routing mode (direct / TOR / proxy chain),
//          then run dirsearch, sublist3r, amass, curl, nmap, whatweb, nikto and sslscan
//          against every target and print their raw output
// License: MIT

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

use stealthhawk::config::{DEFAULT_TOR_PROXY, ScanConfig};
use stealthhawk::orchestrator::Orchestrator;
use stealthhawk::preflight;
use stealthhawk::process_runner::ProcessRunner;
use stealthhawk::progress::ProgressTracker;
use stealthhawk::prompt::StdinPrompter;
use stealthhawk::validator::{DEFAULT_PROBE_URL, HttpProber};

/// StealthHawk - Stealthy reconnaissance and vulnerability assessment
#[derive(Parser, Debug)]
#[command(
    name = "StealthHawk",
    version = "0.1.0",
    about = "Run a fixed recon tool chain against one or more domains, optionally through TOR or a proxy chain",
    long_about = r#"
╔═══════════════════════════════════════════════════════════════════════════════╗
║                   STEALTHHAWK - Stealthy Reconnaissance Tool                  ║
╚═══════════════════════════════════════════════════════════════════════════════╝

For every target, in this order:

  dirsearch   directory brute force (all extensions)
  sublist3r   subdomain enumeration          -> subdomains.txt
  amass       subdomain / OSINT enumeration  -> amass_subdomains.txt
  curl        HTTP headers
  nmap        full port range, service versions
  whatweb     web technology fingerprint
  nikto       web server vulnerability scan
  sslscan     TLS/SSL audit

Traffic can go direct, through TOR (proxychains + local SOCKS on 127.0.0.1:9050)
or through a validated proxy chain list (proxychains -q).

Without flags the tool asks for domains and routing interactively.

EXAMPLES:

  Interactive:
    stealthhawk

  Two domains through TOR, no questions:
    stealthhawk -d example.com -d example.org --tor --batch

  Through a proxy chain list, saving every output:
    stealthhawk -d example.com --proxy-file proxies.txt --output-dir results

  Check which tools are installed:
    stealthhawk --check-tools
"#
)]
struct Args {
    // ═══════════════════════════════════════════════════════════════════════════
    // TARGET OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Target domain (repeatable); asked interactively when omitted
    #[arg(short, long = "domain", value_name = "DOMAIN", help_heading = "Target Options")]
    domains: Vec<String>,

    /// Never prompt; unanswered questions mean "no"
    #[arg(long, help_heading = "Target Options")]
    batch: bool,

    // ═══════════════════════════════════════════════════════════════════════════
    // ROUTING OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Route every tool through TOR (verified before the run)
    #[arg(long, help_heading = "Routing Options")]
    tor: bool,

    /// Proxy chain file, one endpoint per line (http://, socks4://, socks5://, host:port)
    #[arg(long, value_name = "FILE", help_heading = "Routing Options")]
    proxy_file: Option<PathBuf>,

    /// TOR SOCKS endpoint used for the connectivity check
    #[arg(long, value_name = "URL", default_value = DEFAULT_TOR_PROXY, help_heading = "Routing Options")]
    tor_proxy: String,

    /// IP echo URL fetched through TOR / each proxy
    #[arg(long, value_name = "URL", default_value = DEFAULT_PROBE_URL, help_heading = "Routing Options")]
    probe_url: String,

    /// TOR check timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 10, help_heading = "Routing Options")]
    tor_timeout: u64,

    /// Per-proxy check timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 5, help_heading = "Routing Options")]
    proxy_timeout: u64,

    /// proxychains binary (e.g. proxychains4)
    #[arg(long, value_name = "BIN", default_value = "proxychains", help_heading = "Routing Options")]
    proxychains_bin: String,

    /// Where to write the proxychains config for a validated chain (default: private temp file)
    #[arg(long, value_name = "FILE", help_heading = "Routing Options")]
    proxychains_conf: Option<PathBuf>,

    // ═══════════════════════════════════════════════════════════════════════════
    // EXECUTION OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Kill a tool after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..), help_heading = "Execution Options")]
    tool_timeout: Option<u64>,

    /// Targets scanned at the same time (tools of one target always run in order)
    #[arg(long, value_name = "NUM", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=32), help_heading = "Execution Options")]
    parallel_targets: u64,

    /// Save every tool output under DIR/<host>/<tool>.txt
    #[arg(long, value_name = "DIR", help_heading = "Execution Options")]
    output_dir: Option<PathBuf>,

    /// Append run events as JSON lines to FILE
    #[arg(long, value_name = "FILE", help_heading = "Execution Options")]
    events: Option<PathBuf>,

    // ═══════════════════════════════════════════════════════════════════════════
    // TOOL MANAGEMENT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Show which tools are installed and exit
    #[arg(long, help_heading = "Tool Management")]
    check_tools: bool,

    /// Skip the tool availability check before the run
    #[arg(long, help_heading = "Tool Management")]
    skip_preflight: bool,

    /// Do not print the banner
    #[arg(long, help_heading = "Tool Management")]
    no_banner: bool,
}

impl Args {
    fn to_config(&self) -> ScanConfig {
        ScanConfig {
            domains: self.domains.clone(),
            use_tor: self.tor,
            proxy_file: self.proxy_file.clone(),
            interactive: !self.batch,
            tor_proxy: self.tor_proxy.clone(),
            probe_url: self.probe_url.clone(),
            tor_timeout: Duration::from_secs(self.tor_timeout),
            proxy_timeout: Duration::from_secs(self.proxy_timeout),
            tool_timeout: self.tool_timeout.map(Duration::from_secs),
            parallel_targets: self.parallel_targets as usize,
            proxychains_bin: self.proxychains_bin.clone(),
            proxychains_conf: self.proxychains_conf.clone(),
            output_dir: self.output_dir.clone(),
            events_file: self.events.clone(),
        }
    }
}

/// Print application banner
fn print_banner() {
    println!("{}", "═══════════════════════════════════════════════════════════════".green().bold());
    println!("{}", "  Welcome to StealthHawk".green().bold());
    println!("{}", "  A powerful tool for stealthy reconnaissance and vulnerability assessment.".blue());
    println!("{}", "═══════════════════════════════════════════════════════════════\n".green().bold());
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.no_banner {
        print_banner();
    }

    if args.check_tools {
        preflight::check_tools_status(&args.proxychains_bin).await;
        return Ok(());
    }

    let config = args.to_config();

    if let Some(ref dir) = config.output_dir {
        std::fs::create_dir_all(dir)
            .context(format!("Failed to create output directory: {}", dir.display()))?;
        println!("{}", format!("[*] Output directory: {}/", dir.display()).cyan());
    }

    if !args.skip_preflight {
        // Routing is only known after the questions, so check proxychains whenever it may be used
        let routed = config.routing_preset() || config.interactive;
        preflight::preflight_check(routed, &config.proxychains_bin).await;
    }

    let tracker = ProgressTracker::new(uuid::Uuid::new_v4().to_string(), config.events_file.clone());
    println!("{}", format!("[*] Run ID: {}", tracker.run_id()).cyan());
    if let Some(ref events) = config.events_file {
        println!("{}", format!("[*] Event log: {}", events.display()).cyan());
    }

    let runner = ProcessRunner::new(config.tool_timeout);
    let prober = HttpProber::new(config.probe_url.clone());
    let mut orchestrator = Orchestrator::new(config, runner, prober, StdinPrompter, tracker);

    if let Err(e) = orchestrator.execute().await {
        eprintln!("{}", format!("[ERROR] {}", e).red().bold());
        std::process::exit(1);
    }

    Ok(())
}
