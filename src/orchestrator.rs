// orchestrator.rs - Run state machine
// Purpose: CollectTargets -> ConfigureRouting -> ConfigureProxies -> RunAll -> Done
//          One routing mode per run, fixed tool order per target, failures never stop the loop

use crate::command_builder::{CommandBuilder, CommandLine};
use crate::config::ScanConfig;
use crate::error::ReconError;
use crate::process_runner::{CommandRunner, ProcessOutput};
use crate::progress::ProgressTracker;
use crate::prompt::{Prompter, parse_yes_no};
use crate::routing::{self, ProxyChain, ProxyEndpoint, RoutingMode};
use crate::target::{Target, parse_targets};
use crate::tools::ToolKind;
use crate::validator::{self, Prober};
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// Lines of stderr echoed for a failed tool
const STDERR_TAIL_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CollectTargets,
    ConfigureRouting,
    ConfigureProxies,
    RunAll,
    Done,
}

/// Outcome of one tool against one target
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub tool: ToolKind,
    pub target: Target,
    pub command: CommandLine,
    pub output: ProcessOutput,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.output.success
    }

    fn failure_reason(&self) -> String {
        match (&self.output.error, self.output.exit_code) {
            (Some(error), _) => error.clone(),
            (None, Some(code)) => format!("exit status {}", code),
            (None, None) => "terminated by signal".to_string(),
        }
    }
}

/// Every result for one target, in tool order
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Target,
    pub results: Vec<ExecutionResult>,
}

impl TargetReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success()).count()
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub routing: RoutingMode,
    pub reports: Vec<TargetReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn invocations(&self) -> usize {
        self.reports.iter().map(|r| r.results.len()).sum()
    }

    pub fn failures(&self) -> usize {
        self.reports.iter().map(TargetReport::failures).sum()
    }
}

pub struct Orchestrator<R, P, Q> {
    config: ScanConfig,
    runner: R,
    prober: P,
    prompter: Q,
    builder: CommandBuilder,
    tracker: ProgressTracker,
    multi: MultiProgress,
    stage: Stage,
    targets: Vec<Target>,
    routing: RoutingMode,
    /// Generated proxychains config, removed when the orchestrator is dropped
    conf_file: Option<NamedTempFile>,
}

impl<R, P, Q> Orchestrator<R, P, Q>
where
    R: CommandRunner,
    P: Prober,
    Q: Prompter,
{
    pub fn new(config: ScanConfig, runner: R, prober: P, prompter: Q, tracker: ProgressTracker) -> Self {
        let builder = CommandBuilder::new(config.proxychains_bin.clone());
        Self {
            config,
            runner,
            prober,
            prompter,
            builder,
            tracker,
            multi: MultiProgress::new(),
            stage: Stage::CollectTargets,
            targets: Vec::new(),
            routing: RoutingMode::Direct,
            conf_file: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn routing(&self) -> &RoutingMode {
        &self.routing
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn prompter(&self) -> &Q {
        &self.prompter
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Drive the whole run. Only a failed TOR check (or an unreadable prompt)
    /// ends it early; once tools start, the run completes.
    pub async fn execute(&mut self) -> Result<RunSummary, ReconError> {
        let started = Instant::now();
        self.tracker.run_started();

        if let Err(e) = self.setup().await {
            self.tracker.run_failed(&e.to_string());
            return Err(e);
        }

        self.stage = Stage::RunAll;
        let reports = if self.targets.is_empty() {
            Vec::new()
        } else {
            self.run_all().await
        };

        self.stage = Stage::Done;
        let summary = RunSummary {
            routing: self.routing.clone(),
            reports,
            elapsed: started.elapsed(),
        };
        self.tracker
            .run_completed(summary.invocations(), summary.failures());
        print_summary(&summary);

        Ok(summary)
    }

    async fn setup(&mut self) -> Result<(), ReconError> {
        self.stage = Stage::CollectTargets;
        self.collect_targets()?;
        if self.targets.is_empty() {
            println!("{}", "[!] No valid targets given, nothing to scan.".yellow());
            return Ok(());
        }

        self.stage = Stage::ConfigureRouting;
        self.configure_routing().await?;

        self.stage = Stage::ConfigureProxies;
        self.configure_proxies().await?;

        self.tracker.routing_selected(&self.routing.label());
        println!(
            "{}",
            format!("[*] Routing mode: {}", self.routing.label()).cyan()
        );
        Ok(())
    }

    fn collect_targets(&mut self) -> Result<(), ReconError> {
        print_stage("STAGE 1: TARGETS");

        let input = if !self.config.domains.is_empty() {
            self.config.domains.join(" ")
        } else if self.config.interactive {
            self.prompter.ask("Enter domain(s) separated by space:")?
        } else {
            String::new()
        };

        let (targets, rejected) = parse_targets(&input);
        for token in &rejected {
            println!("{}", format!("[!] Skipping invalid target: {}", token).yellow());
            self.tracker.target_rejected(token);
        }

        for (idx, target) in targets.iter().enumerate() {
            println!("  {}. {}", idx + 1, target.url().white());
        }
        self.tracker.targets_collected(targets.len());
        self.targets = targets;
        Ok(())
    }

    async fn configure_routing(&mut self) -> Result<(), ReconError> {
        print_stage("STAGE 2: ROUTING");

        let use_tor = if self.config.use_tor {
            true
        } else if self.config.routing_preset() || !self.config.interactive {
            false
        } else {
            parse_yes_no(&self.prompter.ask("Do you want to use TOR nodes? (yes/no):")?)
        };

        if !use_tor {
            return Ok(());
        }

        let Some(endpoint) = ProxyEndpoint::parse(&self.config.tor_proxy) else {
            return Err(ReconError::TorUnreachable {
                endpoint: self.config.tor_proxy.clone(),
                reason: "not a valid SOCKS proxy URL".to_string(),
            });
        };

        match validator::check_tor_connection(&self.prober, &endpoint, self.config.tor_timeout).await {
            Ok(body) => {
                self.tracker.tor_verified(&body);
                self.routing = RoutingMode::Tor;
                Ok(())
            }
            Err(e) => {
                println!(
                    "{}",
                    "[-] Exiting... Please start TOR service and try again.".red().bold()
                );
                Err(e)
            }
        }
    }

    async fn configure_proxies(&mut self) -> Result<(), ReconError> {
        let proxy_file = if let Some(ref path) = self.config.proxy_file {
            Some(path.clone())
        } else if self.config.interactive
            && !self.config.use_tor
            && parse_yes_no(&self.prompter.ask("Do you want to use a proxy chain list? (yes/no):")?)
        {
            Some(PathBuf::from(
                self.prompter.ask("Enter the path to your proxy chain file:")?,
            ))
        } else {
            None
        };

        let Some(proxy_file) = proxy_file else {
            return Ok(());
        };

        if self.routing == RoutingMode::Tor {
            println!(
                "{}",
                format!("[!] TOR selected, ignoring proxy chain file {}", proxy_file.display()).yellow()
            );
            return Ok(());
        }

        print_stage("STAGE 3: PROXY CHAIN");

        let read = if proxy_file.as_os_str().is_empty() {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no path given"))
        } else {
            routing::read_proxy_candidates(&proxy_file).await
        };
        let candidates = match read {
            Ok(candidates) => candidates,
            Err(e) => {
                let shown = proxy_file.display().to_string();
                println!(
                    "{}",
                    format!("[!] Could not read proxy chain file {}: {}", shown, e).yellow()
                );
                self.tracker.proxy_rejected(&shown, &e.to_string());
                Vec::new()
            }
        };

        let validation =
            validator::validate_proxies(&self.prober, &candidates, self.config.proxy_timeout).await;
        for proxy in &validation.valid {
            self.tracker.proxy_accepted(&proxy.to_string());
        }
        for (candidate, reason) in &validation.rejected {
            self.tracker.proxy_rejected(candidate, reason);
        }

        if validation.valid.is_empty() {
            println!(
                "{}",
                "[!] No working proxy in the chain list. Tools still go through proxychains -q with its own config."
                    .yellow()
                    .bold()
            );
            self.routing = RoutingMode::ProxyChain(ProxyChain::default());
            return Ok(());
        }

        let config_path = self.write_conf(&validation.valid);
        self.routing = RoutingMode::ProxyChain(ProxyChain {
            proxies: validation.valid,
            config_path,
        });
        Ok(())
    }

    /// Write the proxychains config for the validated list. On failure the
    /// chain runs with proxychains' own config.
    fn write_conf(&mut self, proxies: &[ProxyEndpoint]) -> Option<PathBuf> {
        let written = match self.config.proxychains_conf.clone() {
            Some(path) => routing::write_proxychains_conf(&path, proxies).map(|_| path),
            None => routing::temp_proxychains_conf(proxies).map(|file| {
                let path = file.path().to_path_buf();
                self.conf_file = Some(file);
                path
            }),
        };

        match written {
            Ok(path) => {
                println!(
                    "{}",
                    format!("[+] proxychains config written to {}", path.display()).green()
                );
                Some(path)
            }
            Err(e) => {
                println!(
                    "{}",
                    format!("[!] Could not write proxychains config: {}", e).yellow()
                );
                None
            }
        }
    }

    async fn run_all(&self) -> Vec<TargetReport> {
        print_stage("STAGE 4: RECONNAISSANCE");

        let total = self.targets.len() * ToolKind::ALL.len();
        let completed = AtomicUsize::new(0);
        let workers = self.config.parallel_targets.max(1);

        if workers > 1 {
            println!(
                "{}",
                format!("[*] Scanning up to {} targets at once", workers).cyan()
            );
        }

        // `buffered` keeps reports in target order
        stream::iter(self.targets.iter().enumerate())
            .map(|(idx, target)| self.run_target(idx, target, &completed, total))
            .buffered(workers)
            .collect()
            .await
    }

    async fn run_target(
        &self,
        idx: usize,
        target: &Target,
        completed: &AtomicUsize,
        total: usize,
    ) -> TargetReport {
        self.multi.suspend(|| {
            println!(
                "{}",
                format!(
                    "🔍 Processing target [{}/{}]: {}",
                    idx + 1,
                    self.targets.len(),
                    target.url()
                )
                .cyan()
                .bold()
            )
        });

        let mut results = Vec::with_capacity(ToolKind::ALL.len());

        for tool in ToolKind::ALL {
            let command = self.builder.build(target, tool, &self.routing);
            let rendered = command.to_string();
            let progress = percent(completed.load(Ordering::SeqCst), total);
            self.tracker
                .tool_started(tool.binary(), target.url(), &rendered, progress);

            let spinner = self.spinner(format!("{} → {}", tool.binary(), target.host()));
            let output = self.runner.execute(&command).await;
            spinner.finish_and_clear();
            self.multi.remove(&spinner);

            let result = ExecutionResult {
                tool,
                target: target.clone(),
                command,
                output,
            };

            let progress = percent(completed.fetch_add(1, Ordering::SeqCst) + 1, total);
            if result.success() {
                self.tracker.tool_completed(
                    tool.binary(),
                    target.url(),
                    result.output.exit_code,
                    result.output.duration.as_millis(),
                    progress,
                );
            } else {
                self.tracker
                    .tool_failed(tool.binary(), target.url(), &result.failure_reason(), progress);
            }

            self.multi.suspend(|| print_result(&result));

            if let Some(ref dir) = self.config.output_dir {
                if let Err(e) = save_result(dir, &result).await {
                    self.multi.suspend(|| {
                        println!(
                            "{}",
                            format!("[!] Could not save {} output: {}", tool.binary(), e).yellow()
                        )
                    });
                }
            }

            results.push(result);
        }

        TargetReport {
            target: target.clone(),
            results,
        }
    }

    fn spinner(&self, message: String) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

fn percent(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 100.0;
    }
    done as f32 / total as f32 * 100.0
}

fn print_stage(title: &str) {
    println!("\n{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
    println!("{}", format!("  {}", title).yellow().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
}

/// Raw tool output, printed whether the tool succeeded or not
fn print_result(result: &ExecutionResult) {
    println!(
        "{}",
        format!("{} [{}]:", result.tool.title(), result.target.host())
            .cyan()
            .bold()
    );
    println!("{}", format!("$ {}", result.command).dimmed());
    println!("{}", result.output.stdout);

    if !result.success() {
        println!(
            "{}",
            format!(
                "[!] {} failed: {} ({:.1}s)",
                result.tool.binary(),
                result.failure_reason(),
                result.output.duration.as_secs_f64()
            )
            .yellow()
        );

        let stderr_lines: Vec<&str> = result.output.stderr.lines().collect();
        let tail_start = stderr_lines.len().saturating_sub(STDERR_TAIL_LINES);
        for line in &stderr_lines[tail_start..] {
            println!("    {}", line.dimmed());
        }
    }
}

/// Write stdout (and stderr if any) under `<dir>/<host>/`
async fn save_result(dir: &std::path::Path, result: &ExecutionResult) -> std::io::Result<()> {
    let target_dir = dir.join(result.target.host());
    tokio::fs::create_dir_all(&target_dir).await?;

    let stdout_file = target_dir.join(format!("{}.txt", result.tool.binary()));
    tokio::fs::write(&stdout_file, &result.output.stdout).await?;

    if !result.output.stderr.is_empty() {
        let stderr_file = target_dir.join(format!("{}.stderr.txt", result.tool.binary()));
        tokio::fs::write(&stderr_file, &result.output.stderr).await?;
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
    println!("{}", "📊 SCAN SUMMARY".yellow().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
    println!("{}", format!("Routing:           {}", summary.routing.label()).white());
    println!("{}", format!("Targets:           {}", summary.reports.len()).white());
    println!("{}", format!("Tool runs:         {}", summary.invocations()).white());

    for report in &summary.reports {
        let failures = report.failures();
        let ok = report.results.len() - failures;
        let line = format!(
            "  {:<40} ✅ {:<3} ❌ {}",
            report.target.host(),
            ok,
            failures
        );
        if failures == 0 {
            println!("{}", line.green());
        } else {
            println!("{}", line.yellow());
        }
    }

    println!("{}", format!("Elapsed:           {:.1}s", summary.elapsed.as_secs_f64()).white());
    println!("{}", "═══════════════════════════════════════════════════════════════\n".yellow().bold());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 16), 0.0);
        assert_eq!(percent(8, 16), 50.0);
        assert_eq!(percent(0, 0), 100.0);
    }

    #[test]
    fn test_failure_reason() {
        let target = Target::parse("example.com").unwrap();
        let command = crate::command_builder::build(&target, ToolKind::Nmap, &RoutingMode::Direct);
        let mut result = ExecutionResult {
            tool: ToolKind::Nmap,
            target,
            command,
            output: ProcessOutput {
                exit_code: Some(2),
                ..Default::default()
            },
        };
        assert_eq!(result.failure_reason(), "exit status 2");

        result.output.error = Some("failed to launch nmap: not found".to_string());
        assert_eq!(result.failure_reason(), "failed to launch nmap: not found");
    }

    #[tokio::test]
    async fn test_save_result_layout() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::parse("example.com").unwrap();
        let command = crate::command_builder::build(&target, ToolKind::Curl, &RoutingMode::Direct);
        let result = ExecutionResult {
            tool: ToolKind::Curl,
            target,
            command,
            output: ProcessOutput {
                stdout: "HTTP/2 200\n".to_string(),
                stderr: "warning\n".to_string(),
                success: true,
                exit_code: Some(0),
                ..Default::default()
            },
        };

        save_result(dir.path(), &result).await.unwrap();

        let saved = std::fs::read_to_string(dir.path().join("example.com").join("curl.txt")).unwrap();
        assert_eq!(saved, "HTTP/2 200\n");
        assert!(dir.path().join("example.com").join("curl.stderr.txt").exists());
    }
}
