//! Inline directive extraction from comments.
//!
//! Directives are comments whose first word is a recognized `slick-*` label:
//! suppression (`slick-disable`, `slick-enable`, `slick-disable-line`,
//! `slick-disable-next-line`), declarations (`slick-globals`,
//! `slick-exported`), and inline rule configuration (`slick-config`).
//! Unrecognized labels are ignored. A ` -- ` separator introduces an
//! optional justification.
//!
//! Malformed directives become problems, never failures: one bad comment
//! must not abort analysis of the rest of the file.

use crate::span::{Range, Span};
use crate::tokens::{Comment, CommentKind};
use crate::types::{Problem, Severity};

/// A declared global from a `slick-globals` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDecl {
    /// Declared name.
    pub name: String,
    /// Raw setting text after `:`, if any; normalized later.
    pub value: Option<String>,
}

/// Parsed directive payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveKind {
    /// Suppress reporting from this point on. `None` rules = all rules.
    Disable {
        /// Affected rule names; `None` means every rule.
        rules: Option<Vec<String>>,
    },
    /// Re-enable reporting from this point on.
    Enable {
        /// Affected rule names; `None` means every rule.
        rules: Option<Vec<String>>,
    },
    /// Suppress reporting on the directive's own line.
    DisableLine {
        /// Affected rule names; `None` means every rule.
        rules: Option<Vec<String>>,
    },
    /// Suppress reporting on the line after the directive.
    DisableNextLine {
        /// Affected rule names; `None` means every rule.
        rules: Option<Vec<String>>,
    },
    /// Declare globals for scope augmentation.
    Globals {
        /// Declared names with optional raw settings.
        entries: Vec<GlobalDecl>,
    },
    /// Mark root-scope bindings as externally consumed.
    Exported {
        /// Exported names.
        names: Vec<String>,
    },
    /// Inline per-rule configuration.
    Config {
        /// Rule name to options, as parsed JSON.
        settings: serde_json::Map<String, serde_json::Value>,
    },
}

/// One extracted directive with its source extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Parsed payload.
    pub kind: DirectiveKind,
    /// Byte range of the source comment.
    pub range: Range,
    /// Span of the source comment.
    pub loc: Span,
    /// Justification text after ` -- `, if present.
    pub justification: Option<String>,
}

impl Directive {
    /// Line the directive comment starts on.
    #[must_use]
    pub fn line(&self) -> usize {
        self.loc.start.line
    }
}

/// Result of scanning all comments once.
#[derive(Debug, Default)]
pub struct DirectiveScan {
    /// Extracted directives, in source order.
    pub directives: Vec<Directive>,
    /// Problems for malformed directives (no rule id attached).
    pub problems: Vec<Problem>,
}

/// Scans every comment for directives.
///
/// Shebang-reclassified comments are excluded even if their text happens to
/// match a directive label. The scan never fails; malformed directives are
/// reported as problems and dropped.
#[must_use]
pub fn scan_comments(comments: &[Comment]) -> DirectiveScan {
    let mut scan = DirectiveScan::default();
    for comment in comments {
        if comment.kind == CommentKind::Shebang {
            continue;
        }
        extract(comment, &mut scan);
    }
    scan
}

fn extract(comment: &Comment, scan: &mut DirectiveScan) {
    let text = comment.value.trim();
    let (label, rest) = match text.split_once(char::is_whitespace) {
        Some((label, rest)) => (label, rest.trim()),
        None => (text, ""),
    };

    // A JSON payload may contain " -- " inside a string value, so config
    // directives carry no justification.
    let (value, justification) = if label == "slick-config" {
        (rest, None)
    } else {
        split_justification(rest)
    };
    let justification = justification.map(str::to_string);

    let kind = match label {
        "slick-disable" => DirectiveKind::Disable {
            rules: parse_rule_list(value),
        },
        "slick-enable" => DirectiveKind::Enable {
            rules: parse_rule_list(value),
        },
        "slick-disable-line" | "slick-disable-next-line" => {
            // A same-line suppression spread over several lines has no
            // well-defined target line.
            if !comment.loc.is_single_line() {
                scan.problems.push(Problem::without_rule(
                    Severity::Error,
                    comment.loc.start,
                    comment.range,
                    format!("{label} comment should not span multiple lines."),
                ));
                return;
            }
            let rules = parse_rule_list(value);
            if label == "slick-disable-line" {
                DirectiveKind::DisableLine { rules }
            } else {
                DirectiveKind::DisableNextLine { rules }
            }
        }
        "slick-globals" => DirectiveKind::Globals {
            entries: parse_globals(value),
        },
        "slick-exported" => DirectiveKind::Exported {
            names: parse_names(value),
        },
        "slick-config" => match parse_config(value) {
            Ok(settings) => DirectiveKind::Config { settings },
            Err(message) => {
                scan.problems.push(Problem::without_rule(
                    Severity::Error,
                    comment.loc.start,
                    comment.range,
                    message,
                ));
                return;
            }
        },
        // Not a directive at all
        _ => return,
    };

    scan.directives.push(Directive {
        kind,
        range: comment.range,
        loc: comment.loc,
        justification,
    });
}

/// Splits `value -- justification` at the first ` -- ` separator.
fn split_justification(text: &str) -> (&str, Option<&str>) {
    match text.split_once(" -- ") {
        Some((value, justification)) => (value.trim(), Some(justification.trim())),
        None => (text.trim(), None),
    }
}

/// Parses a comma-separated rule list; empty input means "all rules".
fn parse_rule_list(value: &str) -> Option<Vec<String>> {
    let rules: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if rules.is_empty() { None } else { Some(rules) }
}

fn parse_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `name` / `name:setting` entries.
fn parse_globals(value: &str) -> Vec<GlobalDecl> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, setting)) => GlobalDecl {
                name: name.trim().to_string(),
                value: Some(setting.trim().to_string()),
            },
            None => GlobalDecl {
                name: entry.to_string(),
                value: None,
            },
        })
        .collect()
}

/// Parses the JSON object payload of a `slick-config` directive.
fn parse_config(value: &str) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let parsed: serde_json::Value = serde_json::from_str(value)
        .map_err(|e| format!("Failed to parse slick-config payload: {e}"))?;
    match parsed {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(format!(
            "slick-config payload must be a JSON object, found {}",
            json_kind(&other)
        )),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_index::LineIndex;

    fn line_comment(text: &str, value: &str, start: usize) -> Comment {
        let index = LineIndex::new(text);
        Comment::new(
            CommentKind::Line,
            value,
            Range::new(start, start + value.len() + 2),
            &index,
        )
    }

    #[test]
    fn unrecognized_labels_are_ignored() {
        let text = "// eslint-disable foo";
        let comment = line_comment(text, " eslint-disable foo", 0);
        let scan = scan_comments(&[comment]);
        assert!(scan.directives.is_empty());
        assert!(scan.problems.is_empty());
    }

    #[test]
    fn disable_without_rules_means_all() {
        let text = "// slick-disable";
        let comment = line_comment(text, " slick-disable", 0);
        let scan = scan_comments(&[comment]);
        assert_eq!(scan.directives.len(), 1);
        assert_eq!(
            scan.directives[0].kind,
            DirectiveKind::Disable { rules: None }
        );
    }

    #[test]
    fn disable_with_rule_list_and_justification() {
        let text = "// slick-disable-next-line require-this-in-methods -- stub method";
        let comment = line_comment(text, " slick-disable-next-line require-this-in-methods -- stub method", 0);
        let scan = scan_comments(&[comment]);
        assert_eq!(scan.directives.len(), 1);
        let directive = &scan.directives[0];
        assert_eq!(
            directive.kind,
            DirectiveKind::DisableNextLine {
                rules: Some(vec!["require-this-in-methods".to_string()])
            }
        );
        assert_eq!(directive.justification.as_deref(), Some("stub method"));
    }

    #[test]
    fn multi_line_same_line_directive_is_a_problem() {
        let text = "/* slick-disable-line\n   foo */ x";
        let index = LineIndex::new(text);
        let comment = Comment::new(
            CommentKind::Block,
            " slick-disable-line\n   foo ",
            Range::new(0, 30),
            &index,
        );
        let scan = scan_comments(&[comment]);
        assert!(scan.directives.is_empty());
        assert_eq!(scan.problems.len(), 1);
        let problem = &scan.problems[0];
        assert!(problem.rule.is_none());
        assert!(problem
            .message
            .contains("slick-disable-line comment should not span multiple lines"));
    }

    #[test]
    fn globals_entries_parse_names_and_settings() {
        let text = "/* slick-globals window:readonly, debug, legacy:off */";
        let comment = line_comment(text, " slick-globals window:readonly, debug, legacy:off ", 0);
        let scan = scan_comments(&[comment]);
        assert_eq!(scan.directives.len(), 1);
        match &scan.directives[0].kind {
            DirectiveKind::Globals { entries } => {
                assert_eq!(entries.len(), 3);
                assert_eq!(entries[0].name, "window");
                assert_eq!(entries[0].value.as_deref(), Some("readonly"));
                assert_eq!(entries[1].name, "debug");
                assert_eq!(entries[1].value, None);
                assert_eq!(entries[2].value.as_deref(), Some("off"));
            }
            other => panic!("expected globals directive, got {other:?}"),
        }
    }

    #[test]
    fn config_payload_parses_json_object() {
        let value = r#" slick-config {"require-this-in-methods": {"except_methods": ["render"]}} "#;
        let comment = line_comment(value, value, 0);
        let scan = scan_comments(&[comment]);
        assert_eq!(scan.directives.len(), 1);
        match &scan.directives[0].kind {
            DirectiveKind::Config { settings } => {
                assert!(settings.contains_key("require-this-in-methods"));
            }
            other => panic!("expected config directive, got {other:?}"),
        }
    }

    #[test]
    fn config_payload_keeps_separator_sequences_inside_strings() {
        let value = r#" slick-config {"require-this-in-methods": {"except_methods": ["a -- b"]}}"#;
        let comment = line_comment(value, value, 0);
        let scan = scan_comments(&[comment]);
        assert!(scan.problems.is_empty());
        assert_eq!(scan.directives.len(), 1);
        assert!(scan.directives[0].justification.is_none());
        match &scan.directives[0].kind {
            DirectiveKind::Config { settings } => {
                let options = &settings["require-this-in-methods"]["except_methods"];
                assert_eq!(options[0], "a -- b");
            }
            other => panic!("expected config directive, got {other:?}"),
        }
    }

    #[test]
    fn malformed_config_payload_is_a_problem_not_a_failure() {
        let bad = " slick-config {not json}";
        let good = " slick-disable";
        let text = "// slick-config {not json}\n// slick-disable";
        let index = LineIndex::new(text);
        let comments = vec![
            Comment::new(CommentKind::Line, bad, Range::new(0, 26), &index),
            Comment::new(CommentKind::Line, good, Range::new(27, 43), &index),
        ];
        let scan = scan_comments(&comments);
        // The bad payload is reported, the rest of the scan continues
        assert_eq!(scan.problems.len(), 1);
        assert!(scan.problems[0].message.contains("Failed to parse slick-config payload"));
        assert_eq!(scan.directives.len(), 1);
    }

    #[test]
    fn non_object_config_payload_is_rejected() {
        let value = r#" slick-config ["not", "an", "object"]"#;
        let comment = line_comment(value, value, 0);
        let scan = scan_comments(&[comment]);
        assert!(scan.directives.is_empty());
        assert!(scan.problems[0].message.contains("must be a JSON object"));
    }

    #[test]
    fn shebang_comments_are_never_scanned() {
        let text = "#!/usr/bin/env x";
        let index = LineIndex::new(text);
        // Even a shebang whose text matches a directive label is skipped.
        let comment = Comment::new(
            CommentKind::Shebang,
            "!/usr/bin/env slick-disable",
            Range::new(0, 16),
            &index,
        );
        let scan = scan_comments(&[comment]);
        assert!(scan.directives.is_empty());
        assert!(scan.problems.is_empty());
    }
}
