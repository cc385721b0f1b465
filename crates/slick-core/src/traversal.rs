//! Traversal engine.
//!
//! The tree is walked once up front into a flat list of steps; rule
//! execution replays that list per rule, so a rule skipping a subtree or
//! aborting never affects what other rules see. Parent back-references are
//! collected during the same walk as a side table.

use crate::ast::{Ast, NodeId, NodeKind};

/// Which side of a node a visit step is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the node's children.
    Enter,
    /// After the node's children.
    Leave,
}

/// One step in the prebuilt traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalStep {
    /// Visit a node on entry or exit.
    Visit {
        /// The node being visited.
        node: NodeId,
        /// Entry or exit side.
        phase: Phase,
    },
    /// A synthetic named event anchored to a node.
    Emit {
        /// Event name, e.g. `code-path-start`.
        name: &'static str,
        /// Node the event is anchored to.
        node: NodeId,
    },
}

/// Verdict a visitor returns from an entry visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitControl {
    /// Keep walking normally.
    #[default]
    Continue,
    /// Skip this node's children; its own exit visit is still delivered.
    SkipSubtree,
    /// Abort the remaining traversal for this visitor only.
    Break,
}

/// Event name emitted when an analyzable code path opens.
pub const PATH_START: &str = "code-path-start";
/// Event name emitted when an analyzable code path closes.
pub const PATH_END: &str = "code-path-end";

fn opens_code_path(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Program { .. }) || kind.is_function_like()
}

/// Walks `ast` once, producing the replayable step list and the parent side
/// table indexed by node.
///
/// With `with_path_events`, a path-start event follows the entry visit and a
/// path-end event precedes the exit visit of the program root and every
/// function-like node. The events are only generated when the root conforms
/// (is a program node); a fragment root walks without them.
#[must_use]
pub fn build_steps(ast: &Ast, with_path_events: bool) -> (Vec<TraversalStep>, Vec<Option<NodeId>>) {
    let emit_paths = with_path_events
        && matches!(ast.node(ast.root()).kind, NodeKind::Program { .. });

    let mut steps = Vec::with_capacity(ast.len() * 2);
    let mut parents: Vec<Option<NodeId>> = vec![None; ast.len()];

    // Explicit stack: (node, next child index). An entry is pushed on first
    // sight (Enter) and popped once its children are exhausted (Leave).
    let mut stack: Vec<(NodeId, usize)> = vec![(ast.root(), 0)];
    steps.push(TraversalStep::Visit {
        node: ast.root(),
        phase: Phase::Enter,
    });
    if emit_paths && opens_code_path(&ast.node(ast.root()).kind) {
        steps.push(TraversalStep::Emit {
            name: PATH_START,
            node: ast.root(),
        });
    }

    while let Some(top) = stack.len().checked_sub(1) {
        let (node, next) = stack[top];
        if let Some(&child) = ast.node(node).children().get(next) {
            stack[top].1 += 1;
            parents[child.index()] = Some(node);
            stack.push((child, 0));
            steps.push(TraversalStep::Visit {
                node: child,
                phase: Phase::Enter,
            });
            if emit_paths && opens_code_path(&ast.node(child).kind) {
                steps.push(TraversalStep::Emit {
                    name: PATH_START,
                    node: child,
                });
            }
        } else {
            stack.pop();
            if emit_paths && opens_code_path(&ast.node(node).kind) {
                steps.push(TraversalStep::Emit {
                    name: PATH_END,
                    node,
                });
            }
            steps.push(TraversalStep::Visit {
                node,
                phase: Phase::Leave,
            });
        }
    }

    (steps, parents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, SourceKind};
    use crate::span::Range;

    fn small_program() -> Ast {
        // function f() { this; }
        let mut b = AstBuilder::new("function f() { this; }");
        let this_node = b.node(NodeKind::ThisExpression, Range::new(15, 19), vec![]);
        let body = b.node(NodeKind::BlockStatement, Range::new(13, 22), vec![this_node]);
        let func = b.node(NodeKind::FunctionDeclaration, Range::new(0, 22), vec![body]);
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Script,
            },
            Range::new(0, 22),
            vec![func],
        );
        b.finish_without_streams(root)
    }

    #[test]
    fn steps_pair_enter_and_leave_for_every_node() {
        let ast = small_program();
        let (steps, _) = build_steps(&ast, false);
        let enters = steps
            .iter()
            .filter(|s| matches!(s, TraversalStep::Visit { phase: Phase::Enter, .. }))
            .count();
        let leaves = steps
            .iter()
            .filter(|s| matches!(s, TraversalStep::Visit { phase: Phase::Leave, .. }))
            .count();
        assert_eq!(enters, ast.len());
        assert_eq!(leaves, ast.len());
    }

    #[test]
    fn parents_point_at_the_enclosing_node() {
        let ast = small_program();
        let (_, parents) = build_steps(&ast, false);
        assert_eq!(parents[ast.root().index()], None);
        for id in ast.node_ids() {
            for &child in ast.node(id).children() {
                assert_eq!(parents[child.index()], Some(id));
            }
        }
    }

    #[test]
    fn path_events_wrap_program_and_functions() {
        let ast = small_program();
        let (steps, _) = build_steps(&ast, true);
        let starts = steps
            .iter()
            .filter(|s| matches!(s, TraversalStep::Emit { name: PATH_START, .. }))
            .count();
        let ends = steps
            .iter()
            .filter(|s| matches!(s, TraversalStep::Emit { name: PATH_END, .. }))
            .count();
        // One for the program, one for the function.
        assert_eq!(starts, 2);
        assert_eq!(ends, 2);

        // Event ordering around the root: enter, start ... end, leave.
        assert_eq!(
            steps.first(),
            Some(&TraversalStep::Visit {
                node: ast.root(),
                phase: Phase::Enter
            })
        );
        assert_eq!(
            steps.get(1),
            Some(&TraversalStep::Emit {
                name: PATH_START,
                node: ast.root()
            })
        );
        assert_eq!(
            steps.last(),
            Some(&TraversalStep::Visit {
                node: ast.root(),
                phase: Phase::Leave
            })
        );
        assert_eq!(
            steps.get(steps.len() - 2),
            Some(&TraversalStep::Emit {
                name: PATH_END,
                node: ast.root()
            })
        );
    }

    #[test]
    fn fragment_roots_walk_without_path_events() {
        let mut b = AstBuilder::new("this");
        let root = b.node(NodeKind::ThisExpression, Range::new(0, 4), vec![]);
        let ast = b.finish_without_streams(root);
        let (steps, _) = build_steps(&ast, true);
        assert!(steps
            .iter()
            .all(|s| matches!(s, TraversalStep::Visit { .. })));
    }
}
