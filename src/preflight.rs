// preflight.rs - Tool availability checks
// Purpose: Find the wrapped binaries on this host and report what is missing.
// Only inspects the host; installing packages is left to the operator.

use crate::command_builder::PROXYCHAINS_BIN;
use crate::tools::{ToolInfo, get_tools_list};
use colored::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Upper bound for a single `--version` query
const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Common paths where security tools may be installed outside of PATH
fn get_common_tool_paths() -> Vec<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
    let gopath = std::env::var("GOPATH").unwrap_or_else(|_| format!("{}/go", home));

    vec![
        PathBuf::from(format!("{}/bin", gopath)),
        PathBuf::from(format!("{}/go/bin", home)),
        // pip / pipx user installs (dirsearch, sublist3r)
        PathBuf::from(format!("{}/.local/bin", home)),
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
        PathBuf::from("/usr/sbin"),
        PathBuf::from("/snap/bin"),
        PathBuf::from("/opt/tools"),
    ]
}

/// Where a binary was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Resolvable through PATH
    OnPath(PathBuf),
    /// Present in a well-known directory that is not on PATH
    OffPath(PathBuf),
}

impl Location {
    pub fn path(&self) -> &PathBuf {
        match self {
            Location::OnPath(p) | Location::OffPath(p) => p,
        }
    }
}

/// Search for a binary via `which`, then in common install directories
pub async fn discover_tool_path(binary: &str) -> Option<Location> {
    if let Ok(output) = Command::new("which").arg(binary).output().await {
        if output.status.success() {
            let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path_str.is_empty() {
                return Some(Location::OnPath(PathBuf::from(path_str)));
            }
        }
    }

    for dir in get_common_tool_paths() {
        let candidate = dir.join(binary);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(Location::OffPath(candidate));
        }
    }

    None
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &std::path::Path) -> bool {
    true
}

/// Strip ANSI escape codes from a string
pub fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // ESC [ ... final byte
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// First non-empty line of a version banner, cleaned up
pub fn first_version_line(stdout: &str, stderr: &str) -> Option<String> {
    let text = if !stdout.trim().is_empty() { stdout } else { stderr };
    text.lines()
        .map(|line| strip_ansi_codes(line.trim()))
        .find(|line| !line.is_empty())
}

/// Get tool version by running it with --version or -version
pub async fn get_tool_version(binary: &str) -> Option<String> {
    for flag in ["--version", "-version"] {
        let query = Command::new(binary)
            .arg(flag)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        if let Ok(Ok(output)) = tokio::time::timeout(VERSION_TIMEOUT, query).await {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                if let Some(line) = first_version_line(&stdout, &stderr) {
                    return Some(line);
                }
            }
        }
    }

    None
}

/// Discovery result for every catalog entry a run needs
#[derive(Debug, Default)]
pub struct PreflightReport {
    pub found: HashMap<&'static str, Location>,
    pub missing: Vec<&'static str>,
}

impl PreflightReport {
    pub fn all_present(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Binary actually invoked for a catalog entry. The wrapper may be installed
/// under another name, e.g. `proxychains4`.
fn lookup_binary<'a>(tool: &'a ToolInfo, proxychains_bin: &'a str) -> &'a str {
    if tool.binary == PROXYCHAINS_BIN {
        proxychains_bin
    } else {
        tool.binary
    }
}

/// Check the binaries a run will invoke. Missing tools are reported, never fatal:
/// their invocations fail individually at run time.
pub async fn preflight_check(routed: bool, proxychains_bin: &str) -> PreflightReport {
    println!("{}", "── TOOL VALIDATION ──".cyan().bold());
    println!("{}", "[*] Testing for tools...".cyan());

    let tools = get_tools_list();
    let mut report = PreflightReport::default();

    for tool in tools.iter().filter(|t| is_tool_needed(t, routed)) {
        match discover_tool_path(lookup_binary(tool, proxychains_bin)).await {
            Some(location) => {
                match location {
                    Location::OnPath(ref path) => println!(
                        "    {} {} → {}",
                        "✓".green(),
                        tool.name.green(),
                        path.display().to_string().dimmed()
                    ),
                    Location::OffPath(ref path) => println!(
                        "    {} {} → {} {}",
                        "⚠".yellow(),
                        tool.name.yellow(),
                        path.display().to_string().dimmed(),
                        "(not on PATH)".yellow()
                    ),
                }
                report.found.insert(tool.binary, location);
            }
            None => {
                println!(
                    "    {} {} - {}",
                    "✗".red(),
                    tool.name.red(),
                    format!("Install: {}", tool.install_cmd).dimmed()
                );
                report.missing.push(tool.binary);
            }
        }
    }

    if report.all_present() {
        println!("{}", "[+] All required tools found.".green());
    } else {
        println!(
            "{}",
            format!(
                "[!] {} tool(s) missing; their steps will fail and the run continues.",
                report.missing.len()
            )
            .yellow()
        );
    }
    println!();

    report
}

/// The eight scanners are always needed, proxychains only for routed runs.
/// The tor daemon may live elsewhere, so it is informational only.
fn is_tool_needed(tool: &ToolInfo, routed: bool) -> bool {
    match tool.binary {
        "proxychains" => routed,
        "tor" => false,
        _ => tool.is_core,
    }
}

/// Print status of a single tool with discovered path
fn print_tool_status(tool: &ToolInfo, version: Option<&str>, location: Option<&Location>) {
    let installed = location.is_some();
    let status_icon = if installed { "✓".green() } else { "✗".red() };
    let name_colored = if installed {
        tool.name.green()
    } else {
        tool.name.red()
    };

    let version_str = if let Some(v) = version {
        let truncated: String = v.chars().take(30).collect();
        format!("({})", truncated).dimmed().to_string()
    } else {
        "".to_string()
    };

    let path_str = match location {
        Some(Location::OnPath(p)) => format!("→ {}", p.display()).dimmed().to_string(),
        Some(Location::OffPath(p)) => format!("→ {} (not on PATH)", p.display()).yellow().to_string(),
        None => format!("Install: {}", tool.install_cmd).dimmed().to_string(),
    };

    println!(
        "  {} {:<12} - {:<36} {} {}",
        status_icon, name_colored, tool.description, version_str, path_str
    );
}

/// Check and display status of all tools (`--check-tools`)
pub async fn check_tools_status(proxychains_bin: &str) {
    println!("{}", "╔══════════════════════════════════════════════════════════════════════════════╗".cyan().bold());
    println!("{}", "║                       STEALTHHAWK - TOOL STATUS CHECK                        ║".cyan().bold());
    println!("{}", "╚══════════════════════════════════════════════════════════════════════════════╝".cyan().bold());
    println!();

    let tools = get_tools_list();
    let mut core_missing = 0;
    let mut helpers_missing = 0;

    for (heading, core) in [("  SCANNERS (Required)", true), ("  ROUTING HELPERS (TOR / proxy chain)", false)] {
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".white());
        println!("{}", heading.white().bold());
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".white());

        for tool in tools.iter().filter(|t| t.is_core == core) {
            let location = discover_tool_path(lookup_binary(tool, proxychains_bin)).await;
            let version = match location {
                Some(ref loc) => get_tool_version(&loc.path().to_string_lossy()).await,
                None => None,
            };
            print_tool_status(tool, version.as_deref(), location.as_ref());

            if location.is_none() {
                if core {
                    core_missing += 1;
                } else {
                    helpers_missing += 1;
                }
            }
        }
        println!();
    }

    println!("{}", format!("  Tools found: {}/{}", tools.len() - core_missing - helpers_missing, tools.len()).white());
    if core_missing > 0 {
        println!("{}", format!("  ⚠️  {} scanner(s) missing - those steps will fail!", core_missing).red().bold());
    } else {
        println!("{}", "  ✓ All scanners installed!".green().bold());
    }
    if helpers_missing > 0 {
        println!("{}", format!("  ℹ️  {} routing helper(s) missing (needed only for TOR / proxy chain runs)", helpers_missing).yellow());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(strip_ansi_codes("\x1b[32mNmap 7.94\x1b[0m"), "Nmap 7.94");
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    fn test_first_version_line_prefers_stdout() {
        assert_eq!(
            first_version_line("\n  curl 8.5.0 (x86_64)\nRelease-Date", "ignored"),
            Some("curl 8.5.0 (x86_64)".to_string())
        );
        assert_eq!(
            first_version_line("  ", "\x1b[1mv4.2.0\x1b[0m\n"),
            Some("v4.2.0".to_string())
        );
        assert_eq!(first_version_line("", ""), None);
    }

    #[test]
    fn test_tool_needed_depends_on_routing() {
        let tools = get_tools_list();
        let proxychains = tools.iter().find(|t| t.binary == "proxychains").unwrap();
        let nmap = tools.iter().find(|t| t.binary == "nmap").unwrap();
        assert!(!is_tool_needed(proxychains, false));
        assert!(is_tool_needed(proxychains, true));
        assert!(is_tool_needed(nmap, false));
    }

    #[test]
    fn test_lookup_uses_configured_wrapper() {
        let tools = get_tools_list();
        let proxychains = tools.iter().find(|t| t.binary == "proxychains").unwrap();
        let nmap = tools.iter().find(|t| t.binary == "nmap").unwrap();
        assert_eq!(lookup_binary(proxychains, "proxychains4"), "proxychains4");
        assert_eq!(lookup_binary(proxychains, "proxychains"), "proxychains");
        assert_eq!(lookup_binary(nmap, "proxychains4"), "nmap");
    }

    #[tokio::test]
    async fn test_preflight_reports_missing_custom_wrapper() {
        let report = preflight_check(true, "stealthhawk-no-such-proxychains").await;
        assert!(report.missing.contains(&"proxychains"));
        assert!(!report.found.contains_key("proxychains"));
    }

    #[tokio::test]
    async fn test_discover_missing_binary() {
        assert!(discover_tool_path("stealthhawk-no-such-binary").await.is_none());
    }
}
