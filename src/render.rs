//! The render pass.
//!
//! Rendering walks the tree in document order and streams markup into a
//! caller-supplied [`fmt::Write`] sink. Each node goes through the same
//! lifecycle: its bindings are resolved against the current ambient data
//! ([`databind`]), then the component's pre-render hook, renderer and
//! post-render hook run in turn. Nothing is buffered: a branch that is not
//! taken never touches the sink.

use alloc::rc::Rc;
use core::fmt;

use tracing::trace;

use crate::context::Context;
use crate::define_component::{ComponentSpec, Props};
use crate::tree::NodeId;
use crate::types::TemplateError;
use crate::utils::escape_into;
use crate::value::Value;

/// Resolve a node's bindings into concrete, schema-checked property values.
///
/// Bindings are evaluated afresh on every call, so a node rendered once per
/// loop iteration sees the iteration's data each time.
pub fn databind(ctx: &Context, id: NodeId) -> Result<Props, TemplateError> {
    let node = ctx.tree.get(id)?;
    let mut values = node.props.clone();
    for (name, binding) in &node.bindings {
        let value = binding
            .evaluate(&ctx.data, &ctx.pipes)
            .and_then(|value| node.schema.coerce(&node.tag, name, value))
            .map_err(|e| e.or_at(node))?;
        values.insert(name.clone(), value);
    }
    Ok(Props::new(values, Rc::clone(&node.schema)))
}

/// Run the full lifecycle of one node.
pub fn render_node(ctx: &mut Context, id: NodeId, out: &mut dyn fmt::Write) -> Result<(), TemplateError> {
    let node = ctx.tree.get(id)?;
    let loc = node.loc.clone();
    let spec = ctx.component(node.kind)?.clone();
    trace!(component = %spec.kind, node = id.index(), "render");

    let mut props = databind(ctx, id)?;
    run_hooks(ctx, &spec, id, &mut props, out).map_err(|e| e.or_at(&loc))
}

fn run_hooks(
    ctx: &mut Context,
    spec: &ComponentSpec,
    id: NodeId,
    props: &mut Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    if let Some(pre_render) = spec.pre_render {
        pre_render(ctx, id, props)?;
    }
    (spec.render)(ctx, id, props, out)?;
    if let Some(post_render) = spec.post_render {
        post_render(ctx, id, props)?;
    }
    Ok(())
}

/// Render every child of `id` in order.
pub fn render_children(ctx: &mut Context, id: NodeId, out: &mut dyn fmt::Write) -> Result<(), TemplateError> {
    for child in ctx.tree.children(id)? {
        render_node(ctx, child, out)?;
    }
    Ok(())
}

/// Write a resolved value: sub-content renders as nodes, markup verbatim,
/// everything else as (optionally escaped) text.
pub fn render_value(ctx: &mut Context, value: &Value, out: &mut dyn fmt::Write) -> Result<(), TemplateError> {
    match value {
        Value::Null => {}
        Value::Content(id) => render_node(ctx, *id, out)?,
        Value::Markup(markup) => out.write_str(markup)?,
        Value::List(items) if items.iter().any(|v| matches!(v, Value::Content(_))) => {
            for item in items {
                render_value(ctx, item, out)?;
            }
        }
        other => {
            let text = other.to_text();
            if ctx.settings.escape_bindings {
                escape_into(out, &text)?;
            } else {
                out.write_str(&text)?;
            }
        }
    }
    Ok(())
}

/// Render the slot `name` of a component if it was supplied.
pub fn render_slot(
    ctx: &mut Context,
    props: &Props,
    name: &str,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    if props.is_supplied(name) {
        render_value(ctx, &props.get(name), out)?;
    }
    Ok(())
}
