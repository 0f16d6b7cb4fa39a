//! One-shot state queries against bspwm
//!
//! Each method runs exactly one `bspc` invocation and parses its stdout.
//! There are no retries; a failed or empty query yields an empty result
//! so a single bad cycle renders as "nothing" instead of killing the
//! daemon.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::warn;

use super::types::MonitorReport;

/// Point-in-time queries against the window manager's node tree.
///
/// Every call is a fresh snapshot; results from different calls may
/// disagree when windows open or close in between. Callers are expected
/// to join ids against a metadata map and drop the ids that lost the
/// race.
#[async_trait]
pub trait NodeQuery: Send + Sync {
    /// Id of the currently focused window, if any
    async fn focused(&self) -> Vec<u32>;

    /// Ids of all windows on the focused desktop
    async fn local_windows(&self) -> Vec<u32>;

    /// Ids of windows sharing the focused window's class
    async fn same_class(&self) -> Vec<u32>;

    /// Per-monitor status flags
    async fn report(&self) -> MonitorReport;
}

/// Production driver shelling out to `bspc`
#[derive(Debug, Default, Clone, Copy)]
pub struct BspcQuery;

impl BspcQuery {
    async fn run(args: &[&str]) -> String {
        match Command::new("bspc").args(args).output().await {
            Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
            Err(e) => {
                warn!(error = %e, ?args, "bspc query failed");
                String::new()
            }
        }
    }
}

#[async_trait]
impl NodeQuery for BspcQuery {
    async fn focused(&self) -> Vec<u32> {
        parse_ids(&Self::run(&["query", "-N", "-n", "focused.window"]).await)
    }

    async fn local_windows(&self) -> Vec<u32> {
        parse_ids(&Self::run(&["query", "-N", "-n", ".local.window"]).await)
    }

    async fn same_class(&self) -> Vec<u32> {
        parse_ids(&Self::run(&["query", "-N", "-n", ".local.same_class"]).await)
    }

    async fn report(&self) -> MonitorReport {
        parse_report(&Self::run(&["wm", "--get-status"]).await)
    }
}

/// Parse newline-separated hexadecimal window ids. Malformed tokens map
/// to zero and are dropped; zero is never a valid window id.
fn parse_ids(output: &str) -> Vec<u32> {
    output
        .lines()
        .map(hex_to_id)
        .filter(|&id| id != 0)
        .collect()
}

/// Parse one `0x...` id token to its numeric value, 0 when malformed
fn hex_to_id(token: &str) -> u32 {
    let token = token.trim();
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16).unwrap_or(0)
}

/// Split a `bspc wm --get-status` line into per-monitor flag lists.
///
/// The report is a single line like `WMDP-1:fI:oII:LT:mDP-2:fI`; monitor
/// sections start at a `W`- or `:`-prefixed `M`/`m` marker. The leading
/// fragment before the first marker is discarded.
fn parse_report(status: &str) -> MonitorReport {
    static MONITOR_BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let boundary = MONITOR_BOUNDARY.get_or_init(|| Regex::new(r"[W:][Mm]").unwrap());

    let status = status.trim();
    let mut result = MonitorReport::new();
    if status.is_empty() {
        return result;
    }

    for fragment in boundary.split(status).skip(1) {
        let mut parts = fragment.split(':');
        let Some(monitor) = parts.next() else {
            continue;
        };
        result.insert(monitor.to_string(), parts.map(String::from).collect());
    }
    result
}
