//! slick — lint runner and public facade.
//!
//! Re-exports the core analysis substrate ([`slick_core`]) and the built-in
//! rules ([`slick_rules`]), and provides the [`Linter`] that runs a full
//! pass: source-code construction, inline configuration, rule dispatch, and
//! directive suppression.
//!
//! ```no_run
//! use slick::{Linter, LinterConfig};
//! # fn parsed() -> (String, slick::Ast, slick::ScopeGraph) { unimplemented!() }
//!
//! let (text, ast, scopes) = parsed();
//! let linter = Linter::with_default_rules();
//! let result = linter.verify(&text, ast, scopes, &LinterConfig::new())?;
//! for problem in &result.problems {
//!     println!("{}", problem.format());
//! }
//! # Ok::<(), slick::SourceError>(())
//! ```

pub mod runner;

pub use runner::Linter;

pub use slick_core::{
    apply_directives, Ast, AstBuilder, Comment, CommentKind, ConfigError, ContextStack, Directive,
    DirectiveKind, GlobalSetting, GlobalValue, LineIndex, LintResult, LinterConfig, MethodKind,
    Node, NodeId, NodeKind, Phase, Position, PositionError, Problem, ProblemDiagnostic, Range,
    Rule, RuleBox, RuleContext, RuleSettings, RuleVisitor, ScopeGraph, ScopeGraphBuilder, ScopeId,
    ScopeKind, Severity, SourceCode, SourceError, SourceKind, Span, Suggestion, Token, TokenFilter,
    TokenKind, TokenStore, TraversalStep, VisitControl,
};
pub use slick_rules::{all_rules, NoUndeclaredVars, RequireThisInMethods};
