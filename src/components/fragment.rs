//! Containers that render their children and nothing else.

use core::fmt;

use crate::context::Context;
use crate::define_component::{ComponentDefSpec, Props};
use crate::render::render_children;
use crate::schema::Schema;
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;

fn render_contents(
    ctx: &mut Context,
    id: NodeId,
    _props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    render_children(ctx, id, out)
}

/// Registers the document root kind, also used for expanded template bodies.
/// It has no tag name.
pub fn define_fragment(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Fragment,
        names: &[],
        schema: Schema::content(),
        scope_vars: &[],
        parsed: None,
        pre_render: None,
        render: render_contents,
        post_render: None,
    });
}

/// Registers the container kind created for `<p:name>` tags holding
/// sub-content. It accepts any attribute, which the owning component
/// interprets.
pub fn define_param(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Param,
        names: &[],
        schema: Schema::any(),
        scope_vars: &[],
        parsed: None,
        pre_render: None,
        render: render_contents,
        post_render: None,
    });
}
