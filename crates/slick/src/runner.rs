//! The lint runner: wires source-code construction, rule dispatch, and
//! directive suppression into one pass.

use std::collections::HashMap;
use tracing::debug;

use slick_core::{
    apply_directives, Ast, DirectiveKind, LinterConfig, LintResult, Phase, Problem, RuleBox,
    RuleContext, RuleVisitor, ScopeGraph, Severity, SourceCode, SourceError, TraversalStep,
    VisitControl,
};

/// Drives a set of rules over analyzed files.
pub struct Linter {
    rules: Vec<RuleBox>,
}

impl Linter {
    /// Creates a linter over an explicit rule set.
    #[must_use]
    pub fn new(rules: Vec<RuleBox>) -> Self {
        Self { rules }
    }

    /// Creates a linter with every built-in rule.
    #[must_use]
    pub fn with_default_rules() -> Self {
        Self::new(slick_rules::all_rules())
    }

    /// The rules this linter runs.
    #[must_use]
    pub fn rules(&self) -> &[RuleBox] {
        &self.rules
    }

    /// Lints one file.
    ///
    /// Builds the analysis surface, applies inline rule configuration,
    /// replays the traversal through every enabled rule, filters the
    /// collected problems through suppression directives, and returns them
    /// sorted by position. Only a rejected parser handoff fails; everything
    /// the file itself gets wrong comes back as problems.
    pub fn verify(
        &self,
        text: &str,
        ast: Ast,
        scope_graph: ScopeGraph,
        config: &LinterConfig,
    ) -> Result<LintResult, SourceError> {
        let code = SourceCode::new(text, ast, scope_graph, config)?;
        let mut problems: Vec<Problem> = code.construction_problems().to_vec();
        let inline_options = self.collect_inline_options(&code, &mut problems);

        for rule in &self.rules {
            let name = rule.name();
            if !config.is_rule_enabled(name) {
                debug!(rule = name, "rule disabled by configuration");
                continue;
            }
            let severity = config
                .rule_severity(name)
                .unwrap_or_else(|| rule.default_severity());
            let options = inline_options
                .get(name)
                .or_else(|| config.rule_options(name));

            let mut ctx = RuleContext::new(&code, rule.as_ref(), severity);
            let mut visitor = rule.create(options);
            replay(&code, &mut ctx, visitor.as_mut());

            let reported = ctx.into_problems();
            debug!(rule = name, problems = reported.len(), "rule finished");
            problems.extend(reported);
        }

        let mut problems = apply_directives(problems, code.directives());
        problems.sort_by_key(|p| (p.position.line, p.position.column, p.code.clone()));
        debug!(
            problems = problems.len(),
            errors = problems
                .iter()
                .filter(|p| p.severity == Severity::Error)
                .count(),
            "lint pass finished"
        );
        Ok(LintResult { problems })
    }

    /// Gathers `slick-config` payloads into per-rule options. Settings for
    /// unknown rules become problems at the directive's location.
    fn collect_inline_options(
        &self,
        code: &SourceCode,
        problems: &mut Vec<Problem>,
    ) -> HashMap<String, serde_json::Value> {
        let mut options = HashMap::new();
        for directive in code.directives() {
            let DirectiveKind::Config { settings } = &directive.kind else {
                continue;
            };
            for (name, value) in settings {
                if self.rules.iter().any(|r| r.name() == name) {
                    options.insert(name.clone(), value.clone());
                } else {
                    problems.push(Problem::without_rule(
                        Severity::Error,
                        directive.loc.start,
                        directive.range,
                        format!("Inline configuration for unknown rule '{name}'."),
                    ));
                }
            }
        }
        options
    }
}

/// Replays the prebuilt traversal through one visitor, honoring its control
/// verdicts. A skipped subtree still receives its own exit visit; a break
/// ends delivery for this visitor only.
fn replay(code: &SourceCode, ctx: &mut RuleContext<'_>, visitor: &mut dyn RuleVisitor) {
    let steps = code.traversal_steps();
    let mut i = 0;
    while i < steps.len() {
        match steps[i] {
            TraversalStep::Visit {
                node,
                phase: Phase::Enter,
            } => match visitor.enter(ctx, node) {
                VisitControl::Continue => {}
                VisitControl::SkipSubtree => {
                    while i + 1 < steps.len() {
                        i += 1;
                        let at_leave = matches!(
                            steps[i],
                            TraversalStep::Visit {
                                node: n,
                                phase: Phase::Leave,
                            } if n == node
                        );
                        if at_leave {
                            break;
                        }
                    }
                    visitor.leave(ctx, node);
                }
                VisitControl::Break => return,
            },
            TraversalStep::Visit {
                node,
                phase: Phase::Leave,
            } => visitor.leave(ctx, node),
            TraversalStep::Emit { name, node } => visitor.on_event(ctx, name, node),
        }
        i += 1;
    }
}
