//! Label formatting
//!
//! Pure string construction: window records in, polybar markup out. No
//! I/O happens here, which keeps the whole render path testable without
//! a window manager.
//!
//! Every label has a fixed-width core: shorter titles are right-padded,
//! longer ones are cut and suffixed with the overflow marker, so the bar
//! never jitters as titles change length.

use std::sync::OnceLock;

use regex::Regex;
use winlist_config::{ColorConfig, Config, LabelConfig};

use crate::snapshot::Snapshot;
use crate::wm::WindowRecord;

/// Matches a separator the window manager already prefixed to a title
/// (e.g. `- title`), which would duplicate our own class delimiter
fn leading_separator() -> &'static Regex {
    static LEADING_SEPARATOR: OnceLock<Regex> = OnceLock::new();
    LEADING_SEPARATOR.get_or_init(|| Regex::new(r"^[^\w]*?- +").unwrap())
}

/// Fallback class shown when the clamp swallowed the delimiter
const UNKNOWN_CLASS: &str = "UNKNOWN";

/// Formats window records into polybar markup
#[derive(Debug, Clone)]
pub struct Renderer {
    labels: LabelConfig,
    colors: ColorConfig,
}

impl Renderer {
    pub fn new(config: &Config) -> Self {
        Self {
            labels: config.labels.clone(),
            colors: config.colors.clone(),
        }
    }

    /// Concatenate all tiers in display order
    pub fn payload(&self, snapshot: &Snapshot) -> String {
        let mut out = String::new();
        if let Some(record) = &snapshot.focused {
            out.push_str(&self.focused_label(record));
        }
        for record in &snapshot.same_class {
            out.push_str(&self.same_class_label(&record.title));
        }
        for record in &snapshot.rest {
            out.push_str(&self.other_label(&record.title));
        }
        out
    }

    /// Label for the focused window: `class - [title]`, wide field,
    /// class and title in separate foreground colors on a filled
    /// background
    pub fn focused_label(&self, record: &WindowRecord) -> String {
        let raw = format!("{}{}{}", record.class, self.labels.delimiter, record.title);
        let label = self.strip_leading_separator(&raw);
        let label = self.clamp(&label, self.labels.focused_width);

        let (class, name) = match label.split_once(&self.labels.delimiter) {
            Some((class, name)) => (class.to_string(), name.to_string()),
            None => {
                // Delimiter got truncated away; show a recognizable
                // placeholder in a blank field of the right size
                let name_width = self
                    .labels
                    .focused_width
                    .saturating_sub(self.labels.delimiter.chars().count() + UNKNOWN_CLASS.len());
                (UNKNOWN_CLASS.to_string(), " ".repeat(name_width))
            }
        };

        let core = format!(
            "{}{}",
            self.fg(
                &format!("{}{}", class, self.labels.delimiter),
                &self.colors.focused_class_fg
            ),
            self.fg(&self.surround(&name), &self.colors.focused_fg)
        );
        self.bg(&self.pad(&core), &self.colors.focused_bg)
    }

    /// Label for a window sharing the focused window's class
    pub fn same_class_label(&self, title: &str) -> String {
        let core = self.pad(&self.surround(&self.clamp(title, self.labels.width)));
        self.fg(
            &self.bg(&core, &self.colors.same_class_bg),
            &self.colors.same_class_fg,
        )
    }

    /// Label for any other visible window
    pub fn other_label(&self, title: &str) -> String {
        let core = self.pad(&self.surround(&self.clamp(title, self.labels.width)));
        self.fg(&core, &self.colors.dimmed_fg)
    }

    /// Remove a redundant separator at the start of the title part of a
    /// `class - title` label
    fn strip_leading_separator(&self, label: &str) -> String {
        match label.split_once(&self.labels.delimiter) {
            Some((class, name)) => format!(
                "{}{}{}",
                class,
                self.labels.delimiter,
                leading_separator().replace(name, "")
            ),
            None => label.to_string(),
        }
    }

    /// Fix `title` to exactly `limit` character cells: right-pad short
    /// titles, cut long ones and append the overflow marker
    fn clamp(&self, title: &str, limit: usize) -> String {
        let len = title.chars().count();
        if len > limit {
            let cut = limit - self.labels.overflow.chars().count();
            let mut out: String = title.chars().take(cut).collect();
            out.push_str(&self.labels.overflow);
            out
        } else {
            let mut out = title.to_string();
            out.extend(std::iter::repeat(' ').take(limit - len));
            out
        }
    }

    fn surround(&self, title: &str) -> String {
        format!(
            "{}{}{}",
            self.labels.surround,
            title,
            self.labels.surround_close()
        )
    }

    fn pad(&self, title: &str) -> String {
        let pad = " ".repeat(self.labels.padding);
        format!("{}{}{}", pad, title, pad)
    }

    fn fg(&self, title: &str, color: &str) -> String {
        format!("%{{F{}}}{}%{{F-}}", color, title)
    }

    fn bg(&self, title: &str, color: &str) -> String {
        format!("%{{B{}}}{}%{{B-}}", color, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::Geometry;

    fn renderer() -> Renderer {
        Renderer::new(&Config::default())
    }

    fn record(class: &str, title: &str) -> WindowRecord {
        WindowRecord {
            id: 0x2a,
            desktop: 0,
            pid: 1,
            geometry: Geometry {
                x: 0,
                y: 0,
                width: 100,
                height: 100,
            },
            class: class.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_clamp_is_exactly_width_for_any_title() {
        let r = renderer();
        for title in ["", "a", "exactly seventeen", "a very long window title indeed"] {
            for width in [3, 10, 17, 27] {
                let clamped = r.clamp(title, width);
                assert_eq!(clamped.chars().count(), width, "title={:?}", title);
            }
        }
    }

    #[test]
    fn test_clamp_long_title_keeps_prefix_and_marker() {
        let r = renderer();
        let clamped = r.clamp("a very long window title indeed", 17);
        assert_eq!(clamped, "a very long win..");
        assert!(clamped.ends_with(".."));
        assert_eq!(&clamped[..15], "a very long win");
    }

    #[test]
    fn test_clamp_short_title_right_pads() {
        let r = renderer();
        assert_eq!(r.clamp("vim", 17), "vim              ");
    }

    #[test]
    fn test_other_label_markup() {
        let r = renderer();
        assert_eq!(
            r.other_label("vim"),
            "%{F#6b7089} [vim              ] %{F-}"
        );
    }

    #[test]
    fn test_same_class_label_markup() {
        let r = renderer();
        assert_eq!(
            r.same_class_label("vim"),
            "%{F#d2d4de}%{B#5b7881} [vim              ] %{B-}%{F-}"
        );
    }

    #[test]
    fn test_focused_label_markup() {
        let r = renderer();
        let label = r.focused_label(&record("term", "vim"));
        let expected = format!(
            "%{{B#1e2132}} %{{F#6b7089}}term - %{{F-}}%{{F#c6c8d1}}[vim{}]%{{F-}} %{{B-}}",
            " ".repeat(17)
        );
        assert_eq!(label, expected);
    }

    #[test]
    fn test_focused_label_strips_duplicated_separator() {
        let r = renderer();
        // some applications already prefix the title with "- "
        let label = r.focused_label(&record("term", "- vim"));
        let plain = r.focused_label(&record("term", "vim"));
        assert_eq!(label, plain);
    }

    #[test]
    fn test_focused_label_unknown_when_class_eats_the_field() {
        let r = renderer();
        let label = r.focused_label(&record(&"x".repeat(30), "vim"));
        assert!(label.contains("UNKNOWN - "));
        // blank name field of focused_width - delimiter - "UNKNOWN"
        let blank = format!("[{}]", " ".repeat(27 - 3 - 7));
        assert!(label.contains(&blank));
    }

    #[test]
    fn test_payload_tier_order() {
        let r = renderer();
        let snapshot = Snapshot {
            focused: Some(record("term", "vim")),
            same_class: vec![record("term", "mutt")],
            rest: vec![record("firefox", "docs")],
        };
        let payload = r.payload(&snapshot);

        let focused_at = payload.find("[vim").unwrap();
        let peer_at = payload.find("[mutt").unwrap();
        let other_at = payload.find("[docs").unwrap();
        assert!(focused_at < peer_at);
        assert!(peer_at < other_at);
        // one label per window
        assert_eq!(payload.matches("[vim").count(), 1);
        assert_eq!(payload.matches("[mutt").count(), 1);
        assert_eq!(payload.matches("[docs").count(), 1);
    }

    #[test]
    fn test_empty_snapshot_renders_empty_payload() {
        let r = renderer();
        assert_eq!(r.payload(&Snapshot::default()), "");
    }
}
