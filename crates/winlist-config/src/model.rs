//! Configuration data model
//!
//! Defaults match the values polybar themes commonly pair with bspwm;
//! every field can be overridden from the KDL config file.

use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub labels: LabelConfig,
    pub colors: ColorConfig,
    pub refresh: RefreshConfig,
    /// bspwm event categories passed to `bspc subscribe`
    pub subscribe: SubscribeConfig,
}

impl Config {
    /// Per-instance cache file path: `<cache-dir>/<module-name>.<pid>`
    pub fn cache_path(&self, pid: i32) -> PathBuf {
        self.global
            .cache_dir
            .join(format!("{}.{}", self.global.module_name, pid))
    }
}

/// Global settings
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Directory holding the per-instance cache files
    pub cache_dir: PathBuf,
    /// polybar module name; also the cache file base name
    pub module_name: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            cache_dir: PathBuf::from(shellexpand::tilde("~/.cache/polybar").into_owned()),
            module_name: "window-list".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string accepted by `tracing_subscriber::EnvFilter`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Label geometry and decoration
#[derive(Debug, Clone)]
pub struct LabelConfig {
    /// Field width in character cells for peer/other labels
    pub width: usize,
    /// Field width for the focused label
    pub focused_width: usize,
    /// Suffix appended when a title exceeds its field width
    pub overflow: String,
    /// Separator between class name and title in the focused label
    pub delimiter: String,
    /// Opening character surrounding every title
    pub surround: char,
    /// Left/right padding in character cells
    pub padding: usize,
}

impl LabelConfig {
    /// Closing counterpart of the surround character. Paren, bracket and
    /// brace close with their pair; anything else repeats itself.
    pub fn surround_close(&self) -> char {
        match self.surround {
            '[' => ']',
            '{' => '}',
            '(' => ')',
            other => other,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            width: 17,
            focused_width: 27,
            overflow: "..".to_string(),
            delimiter: " - ".to_string(),
            surround: '[',
            padding: 1,
        }
    }
}

/// Color palette, in polybar's `#[AA]RRGGBB` notation
#[derive(Debug, Clone)]
pub struct ColorConfig {
    pub dimmed_fg: String,
    pub focused_bg: String,
    pub focused_fg: String,
    pub focused_class_fg: String,
    pub same_class_bg: String,
    pub same_class_fg: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            dimmed_fg: "#6b7089".to_string(),
            focused_bg: "#1e2132".to_string(),
            focused_fg: "#c6c8d1".to_string(),
            focused_class_fg: "#6b7089".to_string(),
            same_class_bg: "#5b7881".to_string(),
            same_class_fg: "#d2d4de".to_string(),
        }
    }
}

/// Background refresh timing
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between repaints while waiting for the next event
    pub interval_ms: u64,
    /// Delay before the first background repaint
    pub start_delay_ms: u64,
    /// Hard expiry for an orphaned refresh task
    pub timeout_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            start_delay_ms: 1000,
            timeout_ms: 600_000,
        }
    }
}

/// Event categories the daemon subscribes to
#[derive(Debug, Clone)]
pub struct SubscribeConfig {
    pub events: Vec<String>,
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        Self {
            events: [
                "desktop_focus",
                "desktop_layout",
                "node_focus",
                "node_remove",
                "node_transfer",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}
