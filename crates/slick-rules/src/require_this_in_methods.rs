//! SL001: require instance members to use `this`.
//!
//! An instance method, getter, setter, or function-valued field that never
//! touches `this` (or `super`) does not need to be an instance member; it
//! can be a static member or a free function. The rule tracks usage with a
//! frame stack: every construct that starts a fresh usage context pushes a
//! frame on entry, `this`/`super` set the top frame only, and the frame is
//! inspected when the construct is left. Arrow functions share the
//! enclosing context and push a frame only as a field initializer.

use serde::Deserialize;
use slick_core::{
    ContextStack, MethodKind, NodeId, NodeKind, Rule, RuleContext, RuleVisitor, VisitControl,
};

/// When to skip members of classes declared as implementing an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ImplementsPolicy {
    /// Skip every member of such classes.
    All,
    /// Skip only public, non-private-named members.
    PublicMembers,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "snake_case")]
struct Options {
    /// Member names exempt from the check. `#`-prefixed entries match
    /// private names. Computed keys never match any entry.
    except_methods: Vec<String>,
    enforce_for_class_fields: bool,
    ignore_override_methods: bool,
    ignore_classes_with_implements: Option<ImplementsPolicy>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            except_methods: Vec::new(),
            enforce_for_class_fields: true,
            ignore_override_methods: false,
            ignore_classes_with_implements: None,
        }
    }
}

/// The `require-this-in-methods` rule.
pub struct RequireThisInMethods;

impl Rule for RequireThisInMethods {
    fn name(&self) -> &'static str {
        "require-this-in-methods"
    }

    fn code(&self) -> &'static str {
        "SL001"
    }

    fn description(&self) -> &'static str {
        "require instance methods and function-valued fields to use this"
    }

    fn create(&self, options: Option<&serde_json::Value>) -> Box<dyn RuleVisitor> {
        let options = options
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();
        Box::new(Visitor {
            options,
            frames: ContextStack::new(),
        })
    }
}

struct Visitor {
    options: Options,
    frames: ContextStack<bool>,
}

fn parent_kind<'a>(ctx: &'a RuleContext<'_>, node: NodeId) -> Option<&'a NodeKind> {
    ctx.source()
        .parent(node)
        .map(|p| &ctx.source().ast().node(p).kind)
}

impl Visitor {
    /// Display name of a member, read from its key node. Private names get
    /// the `#` prefix they carry in source.
    fn member_name(ctx: &RuleContext<'_>, member: NodeId) -> String {
        let key = ctx.source().ast().node(member).children().first().copied();
        match key.map(|k| &ctx.source().ast().node(k).kind) {
            Some(NodeKind::Identifier { name }) => name.clone(),
            Some(NodeKind::PrivateName { name }) => format!("#{name}"),
            Some(NodeKind::Literal { raw }) => raw.clone(),
            _ => String::from("(unnamed)"),
        }
    }

    fn has_private_key(ctx: &RuleContext<'_>, member: NodeId) -> bool {
        let key = ctx.source().ast().node(member).children().first().copied();
        matches!(
            key.map(|k| &ctx.source().ast().node(k).kind),
            Some(NodeKind::PrivateName { .. })
        )
    }

    /// Name-based exemption. A computed key's name is unknowable
    /// statically, so computed members are never exempt.
    fn excluded_by_name(&self, ctx: &RuleContext<'_>, member: NodeId, computed: bool) -> bool {
        if computed {
            return false;
        }
        let name = Self::member_name(ctx, member);
        self.options.except_methods.iter().any(|m| *m == name)
    }

    /// Interface-implementation exemption, applied per the configured
    /// granularity against the nearest enclosing class.
    fn excluded_by_implements(&self, ctx: &RuleContext<'_>, member: NodeId) -> bool {
        let Some(policy) = self.options.ignore_classes_with_implements else {
            return false;
        };
        let mut current = ctx.source().parent(member);
        while let Some(node) = current {
            match &ctx.source().ast().node(node).kind {
                NodeKind::ClassDeclaration {
                    implements_interface,
                    ..
                }
                | NodeKind::ClassExpression {
                    implements_interface,
                    ..
                } => {
                    if !implements_interface {
                        return false;
                    }
                    return match policy {
                        ImplementsPolicy::All => true,
                        ImplementsPolicy::PublicMembers => !Self::has_private_key(ctx, member),
                    };
                }
                _ => current = ctx.source().parent(node),
            }
        }
        false
    }

    /// Inspects a popped function frame: reports when the function is the
    /// value of a qualifying instance method or field and never used
    /// `this`.
    fn check_member_value(&self, ctx: &mut RuleContext<'_>, function: NodeId, used_this: bool) {
        if used_this {
            return;
        }
        let Some(member) = ctx.source().parent(function) else {
            return;
        };
        match ctx.source().ast().node(member).kind {
            NodeKind::MethodDefinition {
                kind,
                is_static,
                computed,
                is_override,
            } => {
                if is_static || kind == MethodKind::Constructor {
                    return;
                }
                if self.options.ignore_override_methods && is_override {
                    return;
                }
                if self.excluded_by_name(ctx, member, computed)
                    || self.excluded_by_implements(ctx, member)
                {
                    return;
                }
                let label = match kind {
                    MethodKind::Method => "method",
                    MethodKind::Get => "getter",
                    MethodKind::Set => "setter",
                    MethodKind::Constructor => return,
                };
                let name = Self::member_name(ctx, member);
                ctx.report_node(
                    function,
                    format!("Expected 'this' to be used by {label} '{name}'."),
                );
            }
            NodeKind::FieldDefinition {
                is_static,
                computed,
            } => {
                if !self.options.enforce_for_class_fields || is_static {
                    return;
                }
                if self.excluded_by_name(ctx, member, computed)
                    || self.excluded_by_implements(ctx, member)
                {
                    return;
                }
                let name = Self::member_name(ctx, member);
                ctx.report_node(
                    function,
                    format!("Expected 'this' to be used by field '{name}'."),
                );
            }
            _ => {}
        }
    }
}

impl RuleVisitor for Visitor {
    fn enter(&mut self, ctx: &mut RuleContext<'_>, node: NodeId) -> VisitControl {
        match ctx.source().ast().node(node).kind {
            NodeKind::FunctionDeclaration
            | NodeKind::FunctionExpression
            | NodeKind::StaticBlock => self.frames.push(false),
            // Arrows keep the enclosing context except as the initializer
            // of a field, where the field is the tracked construct.
            NodeKind::ArrowFunction => {
                if matches!(
                    parent_kind(ctx, node),
                    Some(NodeKind::FieldDefinition { .. })
                ) {
                    self.frames.push(false);
                }
            }
            NodeKind::ThisExpression | NodeKind::SuperExpression => {
                if let Some(top) = self.frames.top_mut() {
                    *top = true;
                }
            }
            _ => {}
        }
        VisitControl::Continue
    }

    fn leave(&mut self, ctx: &mut RuleContext<'_>, node: NodeId) {
        match ctx.source().ast().node(node).kind {
            NodeKind::FunctionDeclaration | NodeKind::FunctionExpression => {
                let used_this = self.frames.pop();
                self.check_member_value(ctx, node, used_this);
            }
            NodeKind::ArrowFunction => {
                if matches!(
                    parent_kind(ctx, node),
                    Some(NodeKind::FieldDefinition { .. })
                ) {
                    let used_this = self.frames.pop();
                    self.check_member_value(ctx, node, used_this);
                }
            }
            NodeKind::StaticBlock => {
                // Boundary only; a static block has no instance to demand.
                let _ = self.frames.pop();
            }
            _ => {}
        }
    }
}
