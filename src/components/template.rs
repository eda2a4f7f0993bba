//! Template definitions: `<c:Template>` and its alias `<c:Macro>`.

use core::fmt;

use crate::context::Context;
use crate::define_component::{ComponentDefSpec, Props};
use crate::template::{define_from_node, definition_schema};
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;

/// Definitions are removed from the tree once registered, so this only runs
/// for a node that was built by hand.
fn render(
    _ctx: &mut Context,
    _id: NodeId,
    _props: &Props,
    _out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    Ok(())
}

/// Registers the template definition kind.
pub fn define_template(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Template,
        names: &["Template", "Macro"],
        schema: definition_schema(),
        scope_vars: &[],
        parsed: Some(define_from_node),
        pre_render: None,
        render,
        post_render: None,
    });
}
