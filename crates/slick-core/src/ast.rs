//! Arena-backed AST handoff types.
//!
//! The parser for the scripting language is an external collaborator; this
//! module defines the tree shape it hands to the analysis core. Nodes live
//! in a flat arena owned root-to-leaf; child links are arena indices, and
//! the parent back-reference is a side table owned by the traversal engine,
//! never an ownership edge.

use crate::line_index::LineIndex;
use crate::span::{Range, Span};
use crate::tokens::{Comment, CommentKind, Token, TokenKind};

/// Stable index of a node in the AST arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Arena index of this node.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether a program parses as a plain script or a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Top-level script; bindings land in the global scope.
    Script,
    /// Module; top-level bindings are module-local.
    Module,
}

/// Kind of a class method definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Constructor method.
    Constructor,
    /// Ordinary method.
    Method,
    /// Getter accessor.
    Get,
    /// Setter accessor.
    Set,
}

/// Tagged node variant used for dispatch.
///
/// Handlers are registered against these tags rather than matched against
/// runtime type strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of the tree.
    Program {
        /// Script or module semantics.
        source_kind: SourceKind,
    },
    /// Identifier reference or binding name.
    Identifier {
        /// The identifier text.
        name: String,
    },
    /// Private member name (`#name`).
    PrivateName {
        /// Name without the `#` sigil.
        name: String,
    },
    /// `this` expression.
    ThisExpression,
    /// `super` reference.
    SuperExpression,
    /// Literal value.
    Literal {
        /// Raw literal text.
        raw: String,
    },
    /// Class declaration statement.
    ClassDeclaration {
        /// Class name, if not anonymous.
        name: Option<String>,
        /// Whether the class declares an interface implementation.
        implements_interface: bool,
    },
    /// Class used in expression position.
    ClassExpression {
        /// Class name, if not anonymous.
        name: Option<String>,
        /// Whether the class declares an interface implementation.
        implements_interface: bool,
    },
    /// Body of a class; children are member definitions.
    ClassBody,
    /// Method member. Children: key, then value (a function expression).
    MethodDefinition {
        /// Constructor/method/accessor.
        kind: MethodKind,
        /// Static member flag.
        is_static: bool,
        /// Whether the key is a computed expression.
        computed: bool,
        /// Whether the member is marked as an override.
        is_override: bool,
    },
    /// Field member. Children: key, then optional initializer value.
    FieldDefinition {
        /// Static member flag.
        is_static: bool,
        /// Whether the key is a computed expression.
        computed: bool,
    },
    /// Static initialization block inside a class body.
    StaticBlock,
    /// Function declaration statement. Children: optional name identifier,
    /// parameters, body.
    FunctionDeclaration,
    /// Function in expression position.
    FunctionExpression,
    /// Arrow function; does not bind its own `this`.
    ArrowFunction,
    /// Braced statement block.
    BlockStatement,
    /// Expression statement.
    ExpressionStatement,
    /// `return` statement.
    ReturnStatement,
    /// Member access. Children: object, property.
    MemberExpression {
        /// Whether the property is a computed expression.
        computed: bool,
    },
    /// Call expression. Children: callee, then arguments.
    CallExpression,
    /// Assignment expression. Children: target, value.
    AssignmentExpression,
    /// Variable declaration statement.
    VariableDeclaration,
    /// Single declarator. Children: name, optional initializer.
    VariableDeclarator,
}

impl NodeKind {
    /// Human-readable tag name used in messages and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Program { .. } => "program",
            Self::Identifier { .. } => "identifier",
            Self::PrivateName { .. } => "private name",
            Self::ThisExpression => "this expression",
            Self::SuperExpression => "super expression",
            Self::Literal { .. } => "literal",
            Self::ClassDeclaration { .. } => "class declaration",
            Self::ClassExpression { .. } => "class expression",
            Self::ClassBody => "class body",
            Self::MethodDefinition { .. } => "method definition",
            Self::FieldDefinition { .. } => "field definition",
            Self::StaticBlock => "static block",
            Self::FunctionDeclaration => "function declaration",
            Self::FunctionExpression => "function expression",
            Self::ArrowFunction => "arrow function",
            Self::BlockStatement => "block statement",
            Self::ExpressionStatement => "expression statement",
            Self::ReturnStatement => "return statement",
            Self::MemberExpression { .. } => "member expression",
            Self::CallExpression => "call expression",
            Self::AssignmentExpression => "assignment expression",
            Self::VariableDeclaration => "variable declaration",
            Self::VariableDeclarator => "variable declarator",
        }
    }

    /// Returns true for constructs that bind their own `this` and introduce
    /// a function scope.
    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration | Self::FunctionExpression
        )
    }

    /// Returns true for any function-like construct, including arrows.
    #[must_use]
    pub fn is_function_like(&self) -> bool {
        self.is_function() || matches!(self, Self::ArrowFunction)
    }

    /// Returns true for class declarations and expressions.
    #[must_use]
    pub fn is_class(&self) -> bool {
        matches!(
            self,
            Self::ClassDeclaration { .. } | Self::ClassExpression { .. }
        )
    }
}

/// A single AST node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Tagged variant for dispatch.
    pub kind: NodeKind,
    /// Byte range of the node.
    pub range: Range,
    /// Line/column span of the node.
    pub loc: Span,
    children: Vec<NodeId>,
}

impl Node {
    /// Traversable children, in source order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The tree handed over by the parser: node arena, root, and the token and
/// comment streams attached to the root.
///
/// The streams are optional at the handoff boundary; source-code
/// construction rejects trees missing either one as malformed input.
#[derive(Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
    pub(crate) tokens: Option<Vec<Token>>,
    pub(crate) comments: Option<Vec<Comment>>,
}

impl Ast {
    /// The root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Looks up a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was produced by a different arena; node ids are only
    /// meaningful for the tree that created them.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all node ids in arena order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(|i| NodeId(u32::try_from(i).unwrap_or(u32::MAX)))
    }
}

/// Incremental builder used by parsers (and tests) to assemble an [`Ast`].
///
/// Node spans are derived from ranges through a [`LineIndex`] over the same
/// text, keeping `range` and `loc` consistent by construction.
#[derive(Debug)]
pub struct AstBuilder {
    index: LineIndex,
    nodes: Vec<Node>,
}

impl AstBuilder {
    /// Creates a builder for `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            index: LineIndex::new(text),
            nodes: Vec::new(),
        }
    }

    /// The line index used to derive spans.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Adds a node and returns its id. Children must already exist.
    pub fn node(&mut self, kind: NodeKind, range: Range, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let loc = self.index.span(range);
        self.nodes.push(Node {
            kind,
            range,
            loc,
            children,
        });
        id
    }

    /// Convenience constructor for a token over the builder's text.
    #[must_use]
    pub fn token(&self, kind: TokenKind, value: impl Into<String>, range: Range) -> Token {
        Token::new(kind, value, range, &self.index)
    }

    /// Convenience constructor for a comment over the builder's text.
    #[must_use]
    pub fn comment(&self, kind: CommentKind, value: impl Into<String>, range: Range) -> Comment {
        Comment::new(kind, value, range, &self.index)
    }

    /// Finalizes the tree with its root and attached streams.
    #[must_use]
    pub fn finish(self, root: NodeId, tokens: Vec<Token>, comments: Vec<Comment>) -> Ast {
        Ast {
            nodes: self.nodes,
            root,
            tokens: Some(tokens),
            comments: Some(comments),
        }
    }

    /// Finalizes the tree without token or comment streams.
    ///
    /// Source-code construction rejects such trees; this exists so tests can
    /// exercise the malformed-input path.
    #[must_use]
    pub fn finish_without_streams(self, root: NodeId) -> Ast {
        Ast {
            nodes: self.nodes,
            root,
            tokens: None,
            comments: None,
        }
    }
}
