//! KDL configuration parser

use std::path::Path;

use crate::error::ConfigError;
use crate::model::*;

/// Load configuration from the given path, falling back to the built-in
/// defaults when the file does not exist. A present-but-broken file is an
/// error; silently ignoring it would hide typos behind default colors.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    parse_config(path)
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "labels" => {
                config.labels = parse_labels(node)?;
            }
            "colors" => {
                config.colors = parse_colors(node);
            }
            "refresh" => {
                config.refresh = parse_refresh(node)?;
            }
            "subscribe" => {
                config.subscribe = parse_subscribe(node);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    validate(&config)?;

    Ok(config)
}

fn first_string(node: &kdl::KdlNode) -> Option<&str> {
    node.entries().first().and_then(|e| e.value().as_string())
}

fn first_i64(node: &kdl::KdlNode) -> Option<i64> {
    node.entries().first().and_then(|e| e.value().as_i64())
}

fn positive(node: &kdl::KdlNode, field: &str) -> Result<Option<u64>, ConfigError> {
    match first_i64(node) {
        Some(v) if v > 0 => Ok(Some(v as u64)),
        Some(v) => Err(ConfigError::Invalid {
            message: format!("{} must be positive, got {}", field, v),
        }),
        None => Ok(None),
    }
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    if let Some(val) = first_string(child) {
                        global.log_level = val
                            .parse()
                            .map_err(|e| ConfigError::Invalid { message: e })?;
                    }
                }
                "cache-dir" => {
                    if let Some(val) = first_string(child) {
                        global.cache_dir = shellexpand::tilde(val).into_owned().into();
                    }
                }
                "module-name" => {
                    if let Some(val) = first_string(child) {
                        global.module_name = val.to_string();
                    }
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_labels(node: &kdl::KdlNode) -> Result<LabelConfig, ConfigError> {
    let mut labels = LabelConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "width" => {
                    if let Some(v) = positive(child, "labels.width")? {
                        labels.width = v as usize;
                    }
                }
                "focused-width" => {
                    if let Some(v) = positive(child, "labels.focused-width")? {
                        labels.focused_width = v as usize;
                    }
                }
                "overflow" => {
                    if let Some(val) = first_string(child) {
                        labels.overflow = val.to_string();
                    }
                }
                "delimiter" => {
                    if let Some(val) = first_string(child) {
                        labels.delimiter = val.to_string();
                    }
                }
                "surround" => {
                    if let Some(val) = first_string(child) {
                        let mut chars = val.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => labels.surround = c,
                            _ => {
                                return Err(ConfigError::Invalid {
                                    message: format!(
                                        "labels.surround must be a single character, got {:?}",
                                        val
                                    ),
                                })
                            }
                        }
                    }
                }
                "padding" => {
                    if let Some(v) = first_i64(child) {
                        if v < 0 {
                            return Err(ConfigError::Invalid {
                                message: format!("labels.padding must not be negative, got {}", v),
                            });
                        }
                        labels.padding = v as usize;
                    }
                }
                name => {
                    tracing::warn!("Unknown labels config option: {}", name);
                }
            }
        }
    }

    Ok(labels)
}

fn parse_colors(node: &kdl::KdlNode) -> ColorConfig {
    let mut colors = ColorConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let Some(val) = first_string(child) else {
                continue;
            };
            match child.name().value() {
                "dimmed-fg" => colors.dimmed_fg = val.to_string(),
                "focused-bg" => colors.focused_bg = val.to_string(),
                "focused-fg" => colors.focused_fg = val.to_string(),
                "focused-class-fg" => colors.focused_class_fg = val.to_string(),
                "same-class-bg" => colors.same_class_bg = val.to_string(),
                "same-class-fg" => colors.same_class_fg = val.to_string(),
                name => {
                    tracing::warn!("Unknown colors config option: {}", name);
                }
            }
        }
    }

    colors
}

fn parse_refresh(node: &kdl::KdlNode) -> Result<RefreshConfig, ConfigError> {
    let mut refresh = RefreshConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "interval-ms" => {
                    if let Some(v) = positive(child, "refresh.interval-ms")? {
                        refresh.interval_ms = v;
                    }
                }
                "start-delay-ms" => {
                    if let Some(v) = first_i64(child) {
                        if v < 0 {
                            return Err(ConfigError::Invalid {
                                message: format!(
                                    "refresh.start-delay-ms must not be negative, got {}",
                                    v
                                ),
                            });
                        }
                        refresh.start_delay_ms = v as u64;
                    }
                }
                "timeout-ms" => {
                    if let Some(v) = positive(child, "refresh.timeout-ms")? {
                        refresh.timeout_ms = v;
                    }
                }
                name => {
                    tracing::warn!("Unknown refresh config option: {}", name);
                }
            }
        }
    }

    Ok(refresh)
}

fn parse_subscribe(node: &kdl::KdlNode) -> SubscribeConfig {
    let events: Vec<String> = node
        .entries()
        .iter()
        .filter_map(|e| e.value().as_string())
        .map(String::from)
        .collect();

    if events.is_empty() {
        tracing::warn!("subscribe node lists no events, keeping defaults");
        return SubscribeConfig::default();
    }

    SubscribeConfig { events }
}

/// Cross-field validation
fn validate(config: &Config) -> Result<(), ConfigError> {
    let overflow_len = config.labels.overflow.chars().count();

    // The clamp contract needs room for the marker plus one title char.
    for (field, width) in [
        ("labels.width", config.labels.width),
        ("labels.focused-width", config.labels.focused_width),
    ] {
        if width < overflow_len + 1 {
            return Err(ConfigError::Invalid {
                message: format!(
                    "{} is {} but must be at least overflow length + 1 ({})",
                    field,
                    width,
                    overflow_len + 1
                ),
            });
        }
    }

    if config.labels.delimiter.is_empty() {
        return Err(ConfigError::Invalid {
            message: "labels.delimiter must not be empty".to_string(),
        });
    }

    if config.global.module_name.is_empty() {
        return Err(ConfigError::Invalid {
            message: "global.module-name must not be empty".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config.labels.width, 17);
        assert_eq!(config.labels.focused_width, 27);
        assert_eq!(config.labels.overflow, "..");
        assert_eq!(config.labels.delimiter, " - ");
        assert_eq!(config.labels.surround, '[');
        assert_eq!(config.labels.padding, 1);
        assert_eq!(config.refresh.interval_ms, 500);
        assert_eq!(config.refresh.start_delay_ms, 1000);
        assert_eq!(config.refresh.timeout_ms, 600_000);
        assert_eq!(config.global.module_name, "window-list");
        assert_eq!(config.subscribe.events.len(), 5);
    }

    #[test]
    fn test_parse_labels_overrides() {
        let config = parse_config_str(
            r#"
labels {
    width 20
    focused-width 30
    overflow "…"
    surround "("
    padding 2
}
"#,
        )
        .unwrap();
        assert_eq!(config.labels.width, 20);
        assert_eq!(config.labels.focused_width, 30);
        assert_eq!(config.labels.overflow, "…");
        assert_eq!(config.labels.surround, '(');
        assert_eq!(config.labels.surround_close(), ')');
        assert_eq!(config.labels.padding, 2);
    }

    #[test]
    fn test_parse_colors_and_refresh() {
        let config = parse_config_str(
            r##"
colors {
    dimmed-fg "#888888"
    focused-bg "#000000"
}
refresh {
    interval-ms 250
    start-delay-ms 0
}
"##,
        )
        .unwrap();
        assert_eq!(config.colors.dimmed_fg, "#888888");
        assert_eq!(config.colors.focused_bg, "#000000");
        // untouched fields keep their defaults
        assert_eq!(config.colors.same_class_bg, "#5b7881");
        assert_eq!(config.refresh.interval_ms, 250);
        assert_eq!(config.refresh.start_delay_ms, 0);
    }

    #[test]
    fn test_parse_subscribe_events() {
        let config = parse_config_str(r#"subscribe "node_focus" "node_remove""#).unwrap();
        assert_eq!(config.subscribe.events, vec!["node_focus", "node_remove"]);
    }

    #[test]
    fn test_width_smaller_than_overflow_rejected() {
        let err = parse_config_str(
            r#"
labels {
    width 2
    overflow "..."
}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_surround_must_be_single_char() {
        let err = parse_config_str(r#"labels { surround "[[" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_negative_interval_rejected() {
        let err = parse_config_str("refresh { interval-ms -5 }").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_nodes_are_tolerated() {
        let config = parse_config_str(
            r#"
widgets { foo 1 }
labels { width 18 }
"#,
        )
        .unwrap();
        assert_eq!(config.labels.width, 18);
    }

    #[test]
    fn test_global_overrides() {
        let config = parse_config_str(
            r#"
global {
    log-level "debug"
    cache-dir "/tmp/polybar-test"
    module-name "winlist"
}
"#,
        )
        .unwrap();
        assert_eq!(config.global.log_level, LogLevel::Debug);
        assert_eq!(
            config.cache_path(4242),
            std::path::PathBuf::from("/tmp/polybar-test/winlist.4242")
        );
    }

    #[test]
    fn test_malformed_kdl_is_a_parse_error() {
        let err = parse_config_str("labels {").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
