//! Core analysis substrate for the slick linter.
//!
//! This crate turns one parsed source file into an immutable analysis
//! surface and drives rules over it:
//!
//! - [`LineIndex`] maps byte offsets to line/column positions and back.
//! - [`TokenStore`] answers ordered neighbor queries over the merged token
//!   and comment streams.
//! - [`directives`] extracts `slick-*` control comments.
//! - [`ScopeGraph`] carries bindings and references, augmented with
//!   configured and inline-declared globals.
//! - [`SourceCode`] binds all of the above for one file.
//! - [`traversal`] prebuilds the visit order that rule visitors replay.
//!
//! Parsing and scope-graph computation happen upstream; this crate consumes
//! their output and owns everything from there to reported problems.

pub mod ast;
pub mod config;
pub mod context_stack;
pub mod directives;
pub mod line_index;
pub mod rule;
pub mod scope;
pub mod source_code;
pub mod span;
pub mod suppress;
pub mod tokens;
pub mod traversal;
pub mod types;

pub use ast::{Ast, AstBuilder, MethodKind, Node, NodeId, NodeKind, SourceKind};
pub use config::{
    normalize_global_setting, ConfigError, GlobalSetting, GlobalValue, LinterConfig, RuleSettings,
};
pub use context_stack::ContextStack;
pub use directives::{scan_comments, Directive, DirectiveKind, DirectiveScan, GlobalDecl};
pub use line_index::{LineIndex, PositionError};
pub use rule::{Rule, RuleBox, RuleContext, RuleVisitor};
pub use scope::{
    Reference, ReferenceId, Scope, ScopeGraph, ScopeGraphBuilder, ScopeId, ScopeKind, Variable,
    VariableId,
};
pub use source_code::{SourceCode, SourceError};
pub use span::{Position, Range, Span};
pub use suppress::apply_directives;
pub use tokens::{Comment, CommentKind, SourceElement, Token, TokenFilter, TokenKind, TokenStore};
pub use traversal::{build_steps, Phase, TraversalStep, VisitControl};
pub use types::{LintResult, Problem, ProblemDiagnostic, Severity, Suggestion};
