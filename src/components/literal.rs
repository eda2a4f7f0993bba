//! Literal text.
//!
//! Text from the markup is stored as [`Value::Markup`](crate::value::Value::Markup)
//! and written verbatim.
//! Text produced by a binding is escaped unless the binding yields markup
//! (see the `raw` pipe) or escaping is switched off in the settings.

use core::fmt;

use crate::context::Context;
use crate::define_component::{ComponentDefSpec, Props};
use crate::render::render_value;
use crate::schema::{PropSpec, PropType, Schema};
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;

fn render(
    ctx: &mut Context,
    _id: NodeId,
    props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    render_value(ctx, &props.get("text"), out)
}

/// Registers the literal text kind.
pub fn define_literal(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Literal,
        names: &[],
        schema: Schema::new(vec![PropSpec::new("text", PropType::Content)]),
        scope_vars: &[],
        parsed: None,
        pre_render: None,
        render,
        post_render: None,
    });
}
