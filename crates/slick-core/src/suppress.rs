//! Directive-driven problem suppression.

use crate::directives::{Directive, DirectiveKind};
use crate::types::Problem;

fn applies(rules: Option<&Vec<String>>, rule: &str) -> bool {
    rules.map_or(true, |list| list.iter().any(|name| name == rule))
}

/// Filters `problems` through the file's suppression directives.
///
/// Block suppression compares source offsets: a problem is suppressed when
/// the latest `disable`/`enable` affecting its rule at or before the
/// problem's start is a disable. Line suppression compares lines: a
/// `disable-line` on the problem's line or a `disable-next-line` on the
/// line before it suppresses matching rules. Problems without a rule, such
/// as directive diagnostics, are never suppressed.
#[must_use]
pub fn apply_directives(problems: Vec<Problem>, directives: &[Directive]) -> Vec<Problem> {
    if directives.is_empty() {
        return problems;
    }
    problems
        .into_iter()
        .filter(|problem| !is_suppressed(problem, directives))
        .collect()
}

fn is_suppressed(problem: &Problem, directives: &[Directive]) -> bool {
    let Some(rule) = problem.rule.as_deref() else {
        return false;
    };
    let offset = problem.range.start;
    let line = problem.position.line;

    let mut block_disabled = false;
    for directive in directives {
        match &directive.kind {
            DirectiveKind::Disable { rules } => {
                if directive.range.start <= offset && applies(rules.as_ref(), rule) {
                    block_disabled = true;
                }
            }
            DirectiveKind::Enable { rules } => {
                if directive.range.start <= offset && applies(rules.as_ref(), rule) {
                    block_disabled = false;
                }
            }
            DirectiveKind::DisableLine { rules } => {
                if directive.line() == line && applies(rules.as_ref(), rule) {
                    return true;
                }
            }
            DirectiveKind::DisableNextLine { rules } => {
                if directive.line() + 1 == line && applies(rules.as_ref(), rule) {
                    return true;
                }
            }
            DirectiveKind::Globals { .. }
            | DirectiveKind::Exported { .. }
            | DirectiveKind::Config { .. } => {}
        }
    }
    block_disabled
}
