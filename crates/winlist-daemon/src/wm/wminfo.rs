//! Per-window metadata via `wmctrl`
//!
//! `wmctrl -pGxl` prints one line per window with fixed leading columns
//! (id, desktop, pid, four geometry integers) followed by the class
//! token, the host name and the free-text title. Titles may contain
//! arbitrary runs of whitespace and non-ASCII characters; both are
//! normalized away before the columns are split so the fixed columns
//! stay aligned.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::types::{Geometry, WindowInfo};

/// Metadata lookup for all windows on all desktops
#[async_trait]
pub trait InfoQuery: Send + Sync {
    /// Map of window id to its metadata. One external query per call.
    async fn window_info(&self) -> HashMap<u32, WindowInfo>;
}

/// Production driver shelling out to `wmctrl`
#[derive(Debug, Default, Clone, Copy)]
pub struct WmctrlQuery;

#[async_trait]
impl InfoQuery for WmctrlQuery {
    async fn window_info(&self) -> HashMap<u32, WindowInfo> {
        let output = match Command::new("wmctrl").arg("-pGxl").output().await {
            Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
            Err(e) => {
                warn!(error = %e, "wmctrl query failed");
                return HashMap::new();
            }
        };
        parse_window_list(&output)
    }
}

fn parse_window_list(output: &str) -> HashMap<u32, WindowInfo> {
    let mut result = HashMap::new();
    for line in output.lines().filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Some((id, info)) => {
                result.insert(id, info);
            }
            None => {
                debug!(line, "skipping unparseable wmctrl line");
            }
        }
    }
    result
}

/// Parse one `wmctrl -pGxl` line.
///
/// Returns `None` for lines whose fixed columns do not parse or whose id
/// is zero; such lines cannot belong to a real window.
fn parse_line(line: &str) -> Option<(u32, WindowInfo)> {
    // Drop non-ASCII, collapse whitespace runs to single spaces
    let ascii: String = line.chars().filter(char::is_ascii).collect();
    let normalized = ascii.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut columns = normalized.splitn(10, ' ');

    let id = u32::try_from(parse_prefixed_int(columns.next()?)?).ok()?;
    if id == 0 {
        return None;
    }
    let desktop: i32 = columns.next()?.parse().ok()?;
    let pid: u32 = columns.next()?.parse().ok()?;
    let x: i32 = columns.next()?.parse().ok()?;
    let y: i32 = columns.next()?.parse().ok()?;
    let width: i32 = columns.next()?.parse().ok()?;
    let height: i32 = columns.next()?.parse().ok()?;

    let raw_class = columns.next()?;
    let class = raw_class
        .rsplit('.')
        .next()
        .unwrap_or(raw_class)
        .to_lowercase();

    let _hostname = columns.next()?;

    // The title column is absent for nameless windows; fall back to the
    // class string like the bar would expect.
    let title = match columns.next() {
        Some(title) => title.to_string(),
        None => class.clone(),
    };

    Some((
        id,
        WindowInfo {
            desktop,
            pid,
            geometry: Geometry {
                x,
                y,
                width,
                height,
            },
            class,
            title,
        },
    ))
}

/// Parse an integer token with an optional base prefix (`0x`, `0o`,
/// `0b`), defaulting to decimal
fn parse_prefixed_int(token: &str) -> Option<u64> {
    let token = token.trim();
    let lower = token.to_lowercase();
    if let Some(digits) = lower.strip_prefix("0x") {
        u64::from_str_radix(digits, 16).ok()
    } else if let Some(digits) = lower.strip_prefix("0o") {
        u64::from_str_radix(digits, 8).ok()
    } else if let Some(digits) = lower.strip_prefix("0b") {
        u64::from_str_radix(digits, 2).ok()
    } else {
        token.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str =
        "0x00400005  1 1042   10 38 940 1012 Navigator.firefox   host Release notes";

    #[test]
    fn test_parse_line_columns() {
        let (id, info) = parse_line(LINE).unwrap();
        assert_eq!(id, 0x0040_0005);
        assert_eq!(info.desktop, 1);
        assert_eq!(info.pid, 1042);
        assert_eq!(
            info.geometry,
            Geometry {
                x: 10,
                y: 38,
                width: 940,
                height: 1012
            }
        );
        assert_eq!(info.class, "firefox");
        assert_eq!(info.title, "Release notes");
    }

    #[test]
    fn test_class_is_last_dot_segment_lowercased() {
        let line = "0x1 0 1 0 0 1 1 st-256color.St host term";
        let (_, info) = parse_line(line).unwrap();
        assert_eq!(info.class, "st");
    }

    #[test]
    fn test_title_defaults_to_class() {
        let line = "0x1 0 1 0 0 1 1 Navigator.firefox host";
        let (_, info) = parse_line(line).unwrap();
        assert_eq!(info.title, "firefox");
    }

    #[test]
    fn test_non_ascii_is_stripped_and_whitespace_collapsed() {
        let line = "0x1 0 1 0 0 1 1 a.term host caf\u{e9}   \u{2014}  menu";
        let (_, info) = parse_line(line).unwrap();
        assert_eq!(info.title, "caf menu");
    }

    #[test]
    fn test_negative_desktop_for_sticky_windows() {
        let line = "0x1 -1 1 0 0 1 1 a.bar host sticky";
        let (_, info) = parse_line(line).unwrap();
        assert_eq!(info.desktop, -1);
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        assert!(parse_line("garbage").is_none());
        assert!(parse_line("0x1 notanumber 1 0 0 1 1 a.b host t").is_none());
        // zero id cannot be a real window
        assert!(parse_line("0x0 0 1 0 0 1 1 a.b host t").is_none());
    }

    #[test]
    fn test_parse_window_list_skips_bad_lines() {
        let output = format!("{}\ngarbage\n\n0x2 0 7 0 0 5 5 x.y host z\n", LINE);
        let map = parse_window_list(&output);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&0x0040_0005));
        assert_eq!(map[&0x2].title, "z");
    }

    #[test]
    fn test_parse_prefixed_int_bases() {
        assert_eq!(parse_prefixed_int("0x2a"), Some(42));
        assert_eq!(parse_prefixed_int("0o52"), Some(42));
        assert_eq!(parse_prefixed_int("0b101010"), Some(42));
        assert_eq!(parse_prefixed_int("42"), Some(42));
        assert_eq!(parse_prefixed_int("nope"), None);
    }
}
