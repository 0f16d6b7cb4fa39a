//! Window manager value types
//!
//! Everything here is a plain immutable value constructed once per query
//! result and thrown away at the end of the render cycle.

use std::collections::HashMap;

/// Per-monitor status flags from `bspc wm --get-status`, keyed by monitor
/// name. Available for diagnostics; rendering does not consume it.
pub type MonitorReport = HashMap<String, Vec<String>>;

/// Window placement on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Per-window metadata as reported by the windowing system, without the
/// window id (the id is the key of the metadata map)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Desktop index; -1 for sticky windows
    pub desktop: i32,
    /// Owning process id
    pub pid: u32,
    pub geometry: Geometry,
    /// Lower-cased last dot-segment of the raw class string
    pub class: String,
    /// Whitespace-normalized, ASCII-only window title
    pub title: String,
}

/// A window joined with its metadata, valid for a single render cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    /// Window id; never zero
    pub id: u32,
    pub desktop: i32,
    pub pid: u32,
    pub geometry: Geometry,
    pub class: String,
    pub title: String,
}

impl WindowRecord {
    pub fn from_info(id: u32, info: WindowInfo) -> Self {
        Self {
            id,
            desktop: info.desktop,
            pid: info.pid,
            geometry: info.geometry,
            class: info.class,
            title: info.title,
        }
    }
}
