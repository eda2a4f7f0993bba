//! Property injection: `<c:Apply where="Tag" set="...">`.
//!
//! Before its children render, `Apply` writes each override from `set` into
//! every descendant whose tag matches `where` (any descendant when `where` is
//! absent) and whose schema declares the property. A binding pending on an
//! overridden property is dropped. Descendants that do not declare a property
//! are left alone.

use core::fmt;

use tracing::trace;

use crate::context::Context;
use crate::define_component::{ComponentDefSpec, Props};
use crate::render::{databind, render_children};
use crate::schema::{PropSpec, PropType, Schema, coerce};
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;
use crate::value::Value;

fn overrides(ctx: &Context, props: &Props) -> Result<Vec<(String, Value)>, TemplateError> {
    Ok(match props.get("set") {
        Value::Map(map) => map.into_iter().collect(),
        Value::Content(param) => databind(ctx, param)?
            .iter()
            .map(|(name, value)| (name.to_owned(), value.clone()))
            .collect(),
        _ => Vec::new(),
    })
}

fn apply_overrides(ctx: &mut Context, id: NodeId, props: &mut Props) -> Result<(), TemplateError> {
    let overrides = overrides(ctx, props)?;
    if overrides.is_empty() {
        return Ok(());
    }
    let filter = props.is_supplied("where").then(|| props.text("where"));

    for target in ctx.tree.descendants(id)? {
        let node = ctx.tree.get(target)?;
        if let Some(filter) = &filter
            && !filter.split('|').any(|tag| tag.trim() == node.tag)
        {
            continue;
        }
        for (name, value) in &overrides {
            let node = ctx.tree.get(target)?;
            let Some(spec) = node.schema.prop(name) else {
                continue;
            };
            let value = coerce(&node.tag, spec, value.clone()).map_err(|e| e.or_at(node))?;
            let value = ctx.tree.clone_value(&value, target)?;
            trace!(node = target.index(), property = %name, "applied override");
            let node = ctx.tree.get_mut(target)?;
            node.bindings.remove(name);
            if let Some(Value::Content(old)) = node.props.insert(name.clone(), value) {
                ctx.tree.remove(old)?;
            }
        }
    }
    Ok(())
}

fn render(
    ctx: &mut Context,
    id: NodeId,
    _props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    render_children(ctx, id, out)
}

/// Registers `<c:Apply>`.
pub fn define_apply(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Apply,
        names: &["Apply"],
        schema: Schema::new(vec![
            PropSpec::new("where", PropType::Text),
            PropSpec::new("set", PropType::Metadata),
        ])
        .with_children(),
        scope_vars: &[],
        parsed: None,
        pre_render: Some(apply_overrides),
        render,
        post_render: None,
    });
}
