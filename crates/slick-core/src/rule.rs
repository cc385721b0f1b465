//! Rule trait and reporting context.

use crate::ast::NodeId;
use crate::source_code::SourceCode;
use crate::span::Range;
use crate::traversal::VisitControl;
use crate::types::{Problem, Severity, Suggestion};

/// A lint rule: static metadata plus a visitor factory.
///
/// The rule object itself is stateless and shared; [`Rule::create`] builds a
/// fresh visitor per analyzed file, carrying whatever per-file state the
/// rule needs.
pub trait Rule: Send + Sync {
    /// Rule name used in configuration and directives.
    fn name(&self) -> &'static str;

    /// Stable diagnostic code, e.g. `SL001`.
    fn code(&self) -> &'static str;

    /// One-line description of what the rule checks.
    fn description(&self) -> &'static str;

    /// Severity used when configuration does not override it.
    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// Builds a per-file visitor, interpreting rule options if given.
    fn create(&self, options: Option<&serde_json::Value>) -> Box<dyn RuleVisitor>;
}

/// Boxed rule, as stored in registries.
pub type RuleBox = Box<dyn Rule>;

/// Per-file visitor driven by the traversal replay.
///
/// All hooks default to no-ops so a rule only implements the sides it
/// cares about.
pub trait RuleVisitor {
    /// Called before a node's children. The returned verdict applies to
    /// this visitor only.
    fn enter(&mut self, ctx: &mut RuleContext<'_>, node: NodeId) -> VisitControl {
        let _ = (ctx, node);
        VisitControl::Continue
    }

    /// Called after a node's children. Delivered even when the visitor
    /// skipped the subtree.
    fn leave(&mut self, ctx: &mut RuleContext<'_>, node: NodeId) {
        let _ = (ctx, node);
    }

    /// Called for synthetic named events such as `code-path-start`.
    fn on_event(&mut self, ctx: &mut RuleContext<'_>, name: &str, node: NodeId) {
        let _ = (ctx, name, node);
    }
}

/// Reporting handle passed to visitor hooks.
///
/// Bundles the analysis surface with the rule's identity and effective
/// severity, and collects the problems the visitor reports.
pub struct RuleContext<'a> {
    source: &'a SourceCode,
    name: &'static str,
    code: &'static str,
    severity: Severity,
    problems: Vec<Problem>,
}

impl<'a> RuleContext<'a> {
    /// Creates a context for one rule over one file.
    #[must_use]
    pub fn new(source: &'a SourceCode, rule: &dyn Rule, severity: Severity) -> Self {
        Self {
            source,
            name: rule.name(),
            code: rule.code(),
            severity,
            problems: Vec::new(),
        }
    }

    /// The analysis surface.
    #[must_use]
    pub fn source(&self) -> &'a SourceCode {
        self.source
    }

    /// Effective severity for this rule.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Reports a problem covering `range`.
    pub fn report(&mut self, range: Range, message: impl Into<String>) {
        self.problems.push(Problem::new(
            self.code,
            self.name,
            self.severity,
            self.source.position(range.start),
            range,
            message,
        ));
    }

    /// Reports a problem anchored to a node.
    pub fn report_node(&mut self, node: NodeId, message: impl Into<String>) {
        self.report(self.source.ast().node(node).range, message);
    }

    /// Reports a problem with an attached suggestion.
    pub fn report_with_suggestion(
        &mut self,
        range: Range,
        message: impl Into<String>,
        suggestion: Suggestion,
    ) {
        self.report(range, message);
        if let Some(problem) = self.problems.pop() {
            self.problems.push(problem.with_suggestion(suggestion));
        }
    }

    /// Consumes the context, yielding the reported problems.
    #[must_use]
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, NodeKind, SourceKind};
    use crate::config::LinterConfig;
    use crate::scope::{ScopeGraphBuilder, ScopeKind};

    struct NoThis;

    impl Rule for NoThis {
        fn name(&self) -> &'static str {
            "no-this"
        }
        fn code(&self) -> &'static str {
            "SL999"
        }
        fn description(&self) -> &'static str {
            "disallow this expressions"
        }
        fn create(&self, _options: Option<&serde_json::Value>) -> Box<dyn RuleVisitor> {
            Box::new(NoThisVisitor)
        }
    }

    struct NoThisVisitor;

    impl RuleVisitor for NoThisVisitor {
        fn enter(&mut self, ctx: &mut RuleContext<'_>, node: NodeId) -> VisitControl {
            if matches!(ctx.source().ast().node(node).kind, NodeKind::ThisExpression) {
                ctx.report_node(node, "unexpected this");
            }
            VisitControl::Continue
        }
    }

    fn source(text: &str) -> SourceCode {
        let mut b = AstBuilder::new(text);
        let this_node = b.node(NodeKind::ThisExpression, Range::new(0, 4), vec![]);
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Script,
            },
            Range::new(0, text.len()),
            vec![this_node],
        );
        let ast = b.finish(root, vec![], vec![]);
        let mut sb = ScopeGraphBuilder::new();
        sb.scope(ScopeKind::Global, root, None);
        SourceCode::new(text, ast, sb.build(), &LinterConfig::new()).unwrap()
    }

    #[test]
    fn context_collects_reports_with_rule_identity() {
        let code = source("this;");
        let rule = NoThis;
        let mut ctx = RuleContext::new(&code, &rule, Severity::Error);
        let mut visitor = rule.create(None);
        let root = code.ast().root();
        for &child in code.ast().node(root).children() {
            visitor.enter(&mut ctx, child);
        }

        let problems = ctx.into_problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].rule.as_deref(), Some("no-this"));
        assert_eq!(problems[0].code.as_deref(), Some("SL999"));
        assert_eq!(problems[0].severity, Severity::Error);
        assert_eq!(problems[0].range, Range::new(0, 4));
    }

    #[test]
    fn suggestion_rides_on_the_last_report() {
        let code = source("this;");
        let rule = NoThis;
        let mut ctx = RuleContext::new(&code, &rule, Severity::Warning);
        ctx.report_with_suggestion(
            Range::new(0, 4),
            "unexpected this",
            Suggestion::new("remove it"),
        );
        let problems = ctx.into_problems();
        assert_eq!(
            problems[0].suggestion.as_ref().map(|s| s.message.as_str()),
            Some("remove it")
        );
    }
}
