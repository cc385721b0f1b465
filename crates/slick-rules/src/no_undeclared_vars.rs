//! SL002: disallow references to undeclared names.
//!
//! After global augmentation, every reference still pending in the global
//! scope's resolution list has no binding anywhere: it is neither declared
//! in the file nor a configured or inline-declared global.

use slick_core::{NodeId, NodeKind, Rule, RuleContext, RuleVisitor, VisitControl};

/// The `no-undeclared-vars` rule.
pub struct NoUndeclaredVars;

impl Rule for NoUndeclaredVars {
    fn name(&self) -> &'static str {
        "no-undeclared-vars"
    }

    fn code(&self) -> &'static str {
        "SL002"
    }

    fn description(&self) -> &'static str {
        "disallow references to names with no binding or declared global"
    }

    fn create(&self, _options: Option<&serde_json::Value>) -> Box<dyn RuleVisitor> {
        Box::new(Visitor)
    }
}

struct Visitor;

impl RuleVisitor for Visitor {
    fn enter(&mut self, ctx: &mut RuleContext<'_>, node: NodeId) -> VisitControl {
        if !matches!(ctx.source().ast().node(node).kind, NodeKind::Program { .. }) {
            return VisitControl::Continue;
        }

        let graph = ctx.source().scope_graph();
        let pending = graph.scope(graph.root()).through();
        tracing::debug!(unresolved = pending.len(), "checking global references");
        for &ref_id in pending {
            let reference = graph.reference(ref_id);
            ctx.report_node(
                reference.identifier,
                format!("'{}' is not defined.", reference.name),
            );
        }
        // Everything this rule needs lives in the scope graph.
        VisitControl::Break
    }
}
