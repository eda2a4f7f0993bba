//! Built-in component kinds
//!
//! Each kind lives in its own module and registers itself on the
//! [`Context`](crate::Context) through a `define_*` function. Collaborators add
//! their own kinds the same way, using [`ComponentKind::Custom`].
//!
//! [`ComponentKind::Custom`]: crate::ComponentKind::Custom

mod apply;
mod assets;
mod conditional;
mod fragment;
mod instance;
mod iteration;
mod literal;
mod template;

/// Property injection into descendants
pub use apply::define_apply;
/// Output of hoisted page assets
pub use assets::define_assets;
/// Conditional rendering
pub use conditional::define_if;
/// Document root and parameter containers
pub use fragment::{define_fragment, define_param};
/// Template instance placeholders
pub use instance::define_instance;
/// Iteration over data sources and counts
pub use iteration::{define_for, define_repeat};
/// Literal text
pub use literal::define_literal;
/// Template definitions
pub use template::define_template;

use crate::context::Context;

/// Register every built-in component kind.
pub fn define_builtins(ctx: &mut Context) {
    define_fragment(ctx);
    define_literal(ctx);
    define_param(ctx);
    define_instance(ctx);
    define_template(ctx);
    define_if(ctx);
    define_for(ctx);
    define_repeat(ctx);
    define_apply(ctx);
    define_assets(ctx);
}
