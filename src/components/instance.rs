//! Template instance placeholders.
//!
//! An instance node exists only between its opening and closing tags: the
//! parsed hook replaces it with the expanded template body.

use core::fmt;

use crate::context::Context;
use crate::define_component::{ComponentDefSpec, Props};
use crate::schema::Schema;
use crate::template;
use crate::tree::{ComponentKind, NodeId};
use crate::types::{ErrorKind, TemplateError};

fn render(
    ctx: &mut Context,
    id: NodeId,
    _props: &Props,
    _out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    Err(TemplateError::new(ErrorKind::UnexpandedInstance {
        tag: ctx.tree.get(id)?.tag.clone(),
    }))
}

/// Registers the template instance kind. Instance nodes carry the schema of
/// their template rather than this placeholder one.
pub fn define_instance(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Instance,
        names: &[],
        schema: Schema::any(),
        scope_vars: &[],
        parsed: Some(template::expand),
        pre_render: None,
        render,
        post_render: None,
    });
}
