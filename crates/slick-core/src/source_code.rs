//! The assembled per-file analysis surface.
//!
//! [`SourceCode`] binds the text, line index, syntax tree, token store,
//! extracted directives, and augmented scope graph of one file behind a
//! single read-only handle. Construction runs the whole pipeline up front:
//! input validation, shebang reclassification, directive extraction, global
//! normalization and scope augmentation, and export marking. Everything
//! after construction is a query.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::config::{
    normalize_global_setting, ConfigError, GlobalSetting, GlobalValue, LinterConfig,
};
use crate::directives::{scan_comments, Directive, DirectiveKind};
use crate::line_index::LineIndex;
use crate::scope::{ScopeGraph, ScopeId, ScopeKind};
use crate::span::{Position, Range};
use crate::tokens::{CommentKind, TokenStore};
use crate::traversal::{build_steps, TraversalStep};
use crate::types::{Problem, Severity};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use thiserror::Error;

/// Rejected parser handoffs.
///
/// These are contract violations by the producing parser, not problems in
/// the analyzed file; analysis of the file never starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The tree was delivered without its token stream.
    #[error("parse result carries no token stream")]
    MissingTokens,

    /// The tree was delivered without its comment stream.
    #[error("parse result carries no comment stream")]
    MissingComments,

    /// The root node is not a program.
    #[error("root node must be a program, found {found}")]
    RootNotProgram {
        /// Kind name of the offending root.
        found: &'static str,
    },

    /// The token stream is not ordered by start offset.
    #[error("token stream out of order at index {index}")]
    UnorderedTokens {
        /// Index of the first out-of-order token.
        index: usize,
    },

    /// The comment stream is not ordered by start offset.
    #[error("comment stream out of order at index {index}")]
    UnorderedComments {
        /// Index of the first out-of-order comment.
        index: usize,
    },

    /// A configured global carried an unrecognized setting.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Immutable analysis surface for one source file.
#[derive(Debug)]
pub struct SourceCode {
    text: String,
    has_bom: bool,
    index: LineIndex,
    ast: Ast,
    tokens: TokenStore,
    directives: Vec<Directive>,
    scope_graph: ScopeGraph,
    problems: Vec<Problem>,
    steps: OnceCell<(Vec<TraversalStep>, Vec<Option<NodeId>>)>,
    scope_memo: RefCell<HashMap<NodeId, ScopeId>>,
    global_ref_memo: RefCell<HashMap<NodeId, bool>>,
}

impl SourceCode {
    /// Assembles the analysis surface from the parser handoff.
    ///
    /// Validates the handoff, reclassifies a leading shebang comment,
    /// extracts directives, normalizes configured and inline-declared
    /// globals, augments the scope graph with them, and marks exported
    /// bindings. Malformed directives and malformed inline global settings
    /// become construction problems; only contract violations fail.
    pub fn new(
        text: &str,
        mut ast: Ast,
        mut scope_graph: ScopeGraph,
        config: &LinterConfig,
    ) -> Result<Self, SourceError> {
        let (has_bom, text) = match text.strip_prefix('\u{feff}') {
            Some(stripped) => (true, stripped),
            None => (false, text),
        };

        let tokens = ast.tokens.take().ok_or(SourceError::MissingTokens)?;
        let mut comments = ast.comments.take().ok_or(SourceError::MissingComments)?;
        if !matches!(ast.node(ast.root()).kind, NodeKind::Program { .. }) {
            return Err(SourceError::RootNotProgram {
                found: ast.node(ast.root()).kind.name(),
            });
        }
        for i in 1..tokens.len() {
            if tokens[i].range.start < tokens[i - 1].range.end {
                return Err(SourceError::UnorderedTokens { index: i });
            }
        }
        for i in 1..comments.len() {
            if comments[i].range.start < comments[i - 1].range.end {
                return Err(SourceError::UnorderedComments { index: i });
            }
        }

        // Parsers surface `#!cmd` as an ordinary line comment whose text
        // starts with `!`. Reclassify so directive extraction skips it.
        if let Some(first) = comments.first_mut() {
            if first.kind == CommentKind::Line
                && first.range.start == 0
                && first.value.starts_with('!')
            {
                first.kind = CommentKind::Shebang;
            }
        }

        let index = LineIndex::new(text);
        let tokens = TokenStore::new(tokens, comments);

        let scan = scan_comments(tokens.comments());
        let directives = scan.directives;
        let mut problems = scan.problems;

        let configured = config.normalized_globals()?;
        let inline = normalize_inline_globals(&directives, &mut problems);
        scope_graph.augment_globals(&configured, &inline);

        tracing::debug!(
            directives = directives.len(),
            problems = problems.len(),
            "directive scan finished"
        );

        let exported: Vec<String> = directives
            .iter()
            .filter_map(|d| match &d.kind {
                DirectiveKind::Exported { names } => Some(names.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();
        scope_graph.mark_exported(&exported);

        Ok(Self {
            text: text.to_string(),
            has_bom,
            index,
            ast,
            tokens,
            directives,
            scope_graph,
            problems,
            steps: OnceCell::new(),
            scope_memo: RefCell::new(HashMap::new()),
            global_ref_memo: RefCell::new(HashMap::new()),
        })
    }

    /// Source text, without the byte-order mark.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the original input started with a byte-order mark.
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Text covered by `range`; empty when the range falls outside the file
    /// or splits a character.
    #[must_use]
    pub fn slice(&self, range: Range) -> &str {
        self.text.get(range.start..range.end).unwrap_or("")
    }

    /// The line index over the text.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Infallible position lookup for an offset.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        self.index.position(offset)
    }

    /// The syntax tree.
    #[must_use]
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// The merged token and comment store.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Extracted directives, in source order.
    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// The augmented scope graph.
    #[must_use]
    pub fn scope_graph(&self) -> &ScopeGraph {
        &self.scope_graph
    }

    /// Problems raised during construction, rule-independent.
    #[must_use]
    pub fn construction_problems(&self) -> &[Problem] {
        &self.problems
    }

    fn steps_and_parents(&self) -> &(Vec<TraversalStep>, Vec<Option<NodeId>>) {
        self.steps.get_or_init(|| build_steps(&self.ast, true))
    }

    /// The prebuilt traversal, replayed per rule by the runner.
    #[must_use]
    pub fn traversal_steps(&self) -> &[TraversalStep] {
        &self.steps_and_parents().0
    }

    /// Parent of `node`; `None` for the root.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.steps_and_parents().1[node.index()]
    }

    /// The innermost scope governing `node`.
    ///
    /// Walks the ancestor chain until a node introduces a scope. For any
    /// node other than the root the innermost scope keyed to a node wins;
    /// for the root the outermost one does. A synthetic function-expression
    /// name scope is transparently unwrapped to its unique child. Falls back
    /// to the global scope.
    #[must_use]
    pub fn scope_for(&self, node: NodeId) -> ScopeId {
        if let Some(&cached) = self.scope_memo.borrow().get(&node) {
            return cached;
        }

        let inner = node != self.ast.root();
        let mut resolved = self.scope_graph.root();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(scope) = self.scope_graph.acquire(id, inner) {
                resolved = if self.scope_graph.scope(scope).kind == ScopeKind::FunctionExpressionName
                {
                    self.scope_graph.scope(scope).child_scopes[0]
                } else {
                    scope
                };
                break;
            }
            current = self.parent(id);
        }

        self.scope_memo.borrow_mut().insert(node, resolved);
        resolved
    }

    /// Flags the binding named `name` visible from `node` (or from the top
    /// level when absent) as used. Returns false when no such binding
    /// exists.
    pub fn mark_used(&self, name: &str, node: Option<NodeId>) -> bool {
        let mut scope = self.scope_for(node.unwrap_or_else(|| self.ast.root()));
        // Top-level marking starts in the module scope when the program is
        // a module; the global scope would miss module-level bindings.
        if scope == self.scope_graph.root() {
            scope = self.scope_graph.top_level_scope(self.ast.root());
        }
        self.scope_graph.mark_used_from(scope, name)
    }

    /// Whether `node` is an identifier resolving to a definition-less global
    /// binding. Memoized per node.
    #[must_use]
    pub fn is_global_reference(&self, node: NodeId) -> bool {
        if let Some(&cached) = self.global_ref_memo.borrow().get(&node) {
            return cached;
        }
        let answer = match &self.ast.node(node).kind {
            NodeKind::Identifier { name } => self.scope_graph.is_global_reference(name, node),
            _ => false,
        };
        self.global_ref_memo.borrow_mut().insert(node, answer);
        answer
    }
}

/// Normalizes `slick-globals` declarations, converting failures into
/// problems. A declaration without a setting defaults to readonly.
fn normalize_inline_globals(
    directives: &[Directive],
    problems: &mut Vec<Problem>,
) -> Vec<(String, GlobalSetting)> {
    let mut inline = Vec::new();
    for directive in directives {
        let DirectiveKind::Globals { entries } = &directive.kind else {
            continue;
        };
        for entry in entries {
            match &entry.value {
                None => inline.push((entry.name.clone(), GlobalSetting::Readonly)),
                Some(raw) => {
                    let value = GlobalValue::Name(raw.clone());
                    match normalize_global_setting(&entry.name, &value) {
                        Ok(setting) => inline.push((entry.name.clone(), setting)),
                        Err(err) => problems.push(Problem::without_rule(
                            Severity::Error,
                            directive.loc.start,
                            directive.range,
                            err.to_string(),
                        )),
                    }
                }
            }
        }
    }
    inline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, SourceKind};
    use crate::scope::ScopeGraphBuilder;
    use crate::tokens::TokenKind;

    struct Fixture {
        text: String,
        ast: Ast,
        root: NodeId,
    }

    /// Builds a program whose comments are every `(start, end)` slice of
    /// `text`, plus one identifier token per `(name, start)` entry. The
    /// identifier nodes become direct children of the program.
    fn fixture(text: &str, comments: &[(usize, usize)], idents: &[(&str, usize)]) -> Fixture {
        let mut b = AstBuilder::new(text);
        let mut children = Vec::new();
        let mut tokens = Vec::new();
        for &(name, start) in idents {
            let range = Range::new(start, start + name.len());
            children.push(b.node(
                NodeKind::Identifier {
                    name: name.to_string(),
                },
                range,
                vec![],
            ));
            tokens.push(b.token(TokenKind::Identifier, name, range));
        }
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Script,
            },
            Range::new(0, text.len()),
            children,
        );
        let comments = comments
            .iter()
            .map(|&(start, end)| {
                let value = text[start..end]
                    .trim_start_matches("//")
                    .trim_start_matches("/*")
                    .trim_end_matches("*/")
                    .to_string();
                b.comment(CommentKind::Line, value, Range::new(start, end))
            })
            .collect();
        let ast = b.finish(root, tokens, comments);
        Fixture {
            text: text.to_string(),
            ast,
            root,
        }
    }

    fn bare_graph(root: NodeId) -> ScopeGraph {
        let mut sb = ScopeGraphBuilder::new();
        sb.scope(ScopeKind::Global, root, None);
        sb.build()
    }

    #[test]
    fn rejects_missing_streams() {
        let mut b = AstBuilder::new("x");
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Script,
            },
            Range::new(0, 1),
            vec![],
        );
        let ast = b.finish_without_streams(root);
        let graph = bare_graph(root);
        let err = SourceCode::new("x", ast, graph, &LinterConfig::new()).unwrap_err();
        assert_eq!(err, SourceError::MissingTokens);
    }

    #[test]
    fn rejects_non_program_root() {
        let mut b = AstBuilder::new("this");
        let root = b.node(NodeKind::ThisExpression, Range::new(0, 4), vec![]);
        let ast = b.finish(root, vec![], vec![]);
        let graph = bare_graph(root);
        let err = SourceCode::new("this", ast, graph, &LinterConfig::new()).unwrap_err();
        assert_eq!(
            err,
            SourceError::RootNotProgram {
                found: "this expression"
            }
        );
    }

    #[test]
    fn rejects_unordered_tokens() {
        let text = "a b";
        let mut b = AstBuilder::new(text);
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Script,
            },
            Range::new(0, 3),
            vec![],
        );
        let tokens = vec![
            b.token(TokenKind::Identifier, "b", Range::new(2, 3)),
            b.token(TokenKind::Identifier, "a", Range::new(0, 1)),
        ];
        let ast = b.finish(root, tokens, vec![]);
        let graph = bare_graph(root);
        let err = SourceCode::new(text, ast, graph, &LinterConfig::new()).unwrap_err();
        assert_eq!(err, SourceError::UnorderedTokens { index: 1 });
    }

    #[test]
    fn strips_byte_order_mark() {
        let f = fixture("x;", &[], &[("x", 0)]);
        let graph = bare_graph(f.root);
        let code =
            SourceCode::new("\u{feff}x;", f.ast, graph, &LinterConfig::new()).unwrap();
        assert!(code.has_bom());
        assert_eq!(code.text(), "x;");
    }

    #[test]
    fn shebang_comment_never_becomes_a_directive() {
        let text = "#!/usr/bin/env slick\n// slick-disable\nx;";
        let mut b = AstBuilder::new(text);
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Script,
            },
            Range::new(0, text.len()),
            vec![],
        );
        let comments = vec![
            b.comment(CommentKind::Line, "!/usr/bin/env slick", Range::new(0, 20)),
            b.comment(CommentKind::Line, " slick-disable", Range::new(21, 37)),
        ];
        let ast = b.finish(root, vec![], comments);
        let graph = bare_graph(root);
        let code = SourceCode::new(text, ast, graph, &LinterConfig::new()).unwrap();

        assert_eq!(code.tokens().comments()[0].kind, CommentKind::Shebang);
        assert_eq!(code.directives().len(), 1);
        assert!(matches!(
            code.directives()[0].kind,
            DirectiveKind::Disable { rules: None }
        ));
    }

    #[test]
    fn inline_globals_augment_the_scope_graph() {
        let text = "// slick-globals window:writable, console\nwindow;";
        let f = fixture(text, &[(0, 41)], &[("window", 42)]);
        let window_node = f.ast.node(f.root).children()[0];

        let mut sb = ScopeGraphBuilder::new();
        let global = sb.scope(ScopeKind::Global, f.root, None);
        sb.reference(global, window_node, "window", None);
        let graph = sb.build();

        let code = SourceCode::new(&f.text, f.ast, graph, &LinterConfig::new()).unwrap();
        let graph = code.scope_graph();
        assert_eq!(
            graph.variable(graph.global_binding("window").unwrap()).writeable,
            Some(true)
        );
        // Declared without a setting: defaults to readonly.
        assert_eq!(
            graph.variable(graph.global_binding("console").unwrap()).writeable,
            Some(false)
        );
        assert!(code.is_global_reference(window_node));
    }

    #[test]
    fn malformed_inline_global_setting_becomes_a_problem() {
        let text = "// slick-globals window:sometimes\n";
        let f = fixture(text, &[(0, 33)], &[]);
        let graph = bare_graph(f.root);
        let code = SourceCode::new(&f.text, f.ast, graph, &LinterConfig::new()).unwrap();
        assert!(code.scope_graph().global_binding("window").is_none());
        assert_eq!(code.construction_problems().len(), 1);
        assert!(code.construction_problems()[0].rule.is_none());
    }

    #[test]
    fn exported_directive_marks_bindings() {
        let text = "// slick-exported util\nvar util;";
        let f = fixture(text, &[(0, 22)], &[("util", 27)]);
        let util_node = f.ast.node(f.root).children()[0];

        let mut sb = ScopeGraphBuilder::new();
        let global = sb.scope(ScopeKind::Global, f.root, None);
        sb.variable(global, "util", vec![util_node]);
        let graph = sb.build();

        let code = SourceCode::new(&f.text, f.ast, graph, &LinterConfig::new()).unwrap();
        let graph = code.scope_graph();
        let util = graph.variable(graph.global_binding("util").unwrap());
        assert!(util.is_exported());
        assert!(util.is_used());
    }

    #[test]
    fn scope_resolution_unwraps_function_expression_name() {
        let text = "(function f() { f; })";
        let mut b = AstBuilder::new(text);
        let f_ref = b.node(
            NodeKind::Identifier {
                name: "f".to_string(),
            },
            Range::new(16, 17),
            vec![],
        );
        let body = b.node(NodeKind::BlockStatement, Range::new(14, 20), vec![f_ref]);
        let func = b.node(NodeKind::FunctionExpression, Range::new(1, 20), vec![body]);
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Script,
            },
            Range::new(0, 21),
            vec![func],
        );
        let ast = b.finish(root, vec![], vec![]);

        let mut sb = ScopeGraphBuilder::new();
        let global = sb.scope(ScopeKind::Global, root, None);
        let name_scope = sb.scope(ScopeKind::FunctionExpressionName, func, Some(global));
        let fn_scope = sb.scope(ScopeKind::Function, body, Some(name_scope));
        let graph = sb.build();

        let code = SourceCode::new(text, ast, graph, &LinterConfig::new()).unwrap();
        // The acquired scope for the function node is the synthetic name
        // scope; the resolver hands back its unique child instead.
        assert_eq!(
            code.scope_graph().scope(name_scope).kind,
            ScopeKind::FunctionExpressionName
        );
        assert_eq!(code.scope_for(func), fn_scope);
        // A node inside the body resolves through its own ancestor chain.
        assert_eq!(code.scope_for(f_ref), fn_scope);
    }

    #[test]
    fn mark_used_starts_at_the_module_scope() {
        let text = "let a;";
        let mut b = AstBuilder::new(text);
        let a_def = b.node(
            NodeKind::Identifier {
                name: "a".to_string(),
            },
            Range::new(4, 5),
            vec![],
        );
        let root = b.node(
            NodeKind::Program {
                source_kind: SourceKind::Module,
            },
            Range::new(0, 6),
            vec![a_def],
        );
        let ast = b.finish(root, vec![], vec![]);

        let mut sb = ScopeGraphBuilder::new();
        let global = sb.scope(ScopeKind::Global, root, None);
        let module = sb.scope(ScopeKind::Module, root, Some(global));
        let a_var = sb.variable(module, "a", vec![a_def]);
        let graph = sb.build();

        let code = SourceCode::new(text, ast, graph, &LinterConfig::new()).unwrap();
        assert!(code.mark_used("a", None));
        assert!(code.scope_graph().variable(a_var).is_used());
        assert!(!code.mark_used("missing", None));
    }
}
