//! Built-in rules for the slick linter.
//!
//! Each rule implements [`slick_core::Rule`] and ships a per-file visitor
//! driven by the traversal replay. [`all_rules`] yields the full registry
//! in diagnostic-code order.

pub mod no_undeclared_vars;
pub mod require_this_in_methods;

pub use no_undeclared_vars::NoUndeclaredVars;
pub use require_this_in_methods::RequireThisInMethods;

use slick_core::RuleBox;

/// Every built-in rule, in diagnostic-code order.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![Box::new(RequireThisInMethods), Box::new(NoUndeclaredVars)]
}
