//! Iteration: `<c:For>` over a data source and `<c:Repeat>` over a data
//! source or a fixed count.
//!
//! The first record is pulled before anything is written, so an empty source
//! renders only the `noData` slot. Otherwise the output is `header`, the
//! `body` once per record with `glue` between consecutive records, then
//! `footer`. A positive `count` stops the iteration after that many records.
//!
//! Each iteration runs in its own data scope where the record is published
//! under the `as` name (default `item`) and, when `index` names a variable,
//! the zero-based position under that name.

use core::fmt;

use tracing::debug;

use crate::context::Context;
use crate::data_source::DataSource;
use crate::define_component::{ComponentDefSpec, Props};
use crate::render::render_slot;
use crate::schema::{PropSpec, PropType, Schema};
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;
use crate::value::Value;

fn shared_props(source: PropSpec) -> Vec<PropSpec> {
    vec![
        source,
        PropSpec::new("as", PropType::Id).with_default("item"),
        PropSpec::new("index", PropType::Id),
        PropSpec::new("count", PropType::Number),
        PropSpec::new("rewind", PropType::Bool).with_default(false),
        PropSpec::new("body", PropType::Content),
        PropSpec::new("header", PropType::Content),
        PropSpec::new("footer", PropType::Content),
        PropSpec::new("glue", PropType::Content),
        PropSpec::new("noData", PropType::Content),
    ]
}

fn iterate(
    ctx: &mut Context,
    id: NodeId,
    props: &Props,
    source: &DataSource,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    if props.bool("rewind") && !source.rewind() {
        debug!(node = id.index(), "data source cannot be rewound");
    }
    let Some(first) = source.next_record() else {
        return render_slot(ctx, props, "noData", out);
    };

    let limit = props
        .number("count")
        .filter(|n| *n >= 1.0)
        .map(|n| n as usize);
    let var = props.text("as");
    let index_var = props.is_supplied("index").then(|| props.text("index"));

    render_slot(ctx, props, "header", out)?;
    let mut record = Some(first);
    let mut position = 0;
    while let Some(item) = record {
        if position > 0 {
            render_slot(ctx, props, "glue", out)?;
        }

        ctx.data.begin_group();
        ctx.data.set(&var, Some(item), false);
        if let Some(index_var) = &index_var {
            ctx.data
                .set(index_var, Some(Value::Number(position as f64)), false);
        }
        let rendered = render_slot(ctx, props, "body", out);
        ctx.data.end_group()?;
        rendered?;

        position += 1;
        if limit.is_some_and(|limit| position >= limit) {
            break;
        }
        record = source.next_record();
    }
    render_slot(ctx, props, "footer", out)
}

fn render_for(
    ctx: &mut Context,
    id: NodeId,
    props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    let source = DataSource::from_value(props.get("each"));
    iterate(ctx, id, props, &source, out)
}

fn render_repeat(
    ctx: &mut Context,
    id: NodeId,
    props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    let source = match props.number("times") {
        Some(times) => {
            let times = times.max(0.0) as usize;
            DataSource::from_iter((1..=times).map(|n| Value::Number(n as f64)))
        }
        None => DataSource::from_value(props.get("of")),
    };
    iterate(ctx, id, props, &source, out)
}

/// Registers `<c:For>`.
pub fn define_for(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::For,
        names: &["For"],
        schema: Schema::new(shared_props(PropSpec::new("each", PropType::Data)))
            .with_default_param("body"),
        scope_vars: &["as", "index"],
        parsed: None,
        pre_render: None,
        render: render_for,
        post_render: None,
    });
}

/// Registers `<c:Repeat>`.
pub fn define_repeat(ctx: &mut Context) {
    let mut props = shared_props(PropSpec::new("of", PropType::Data));
    props.insert(1, PropSpec::new("times", PropType::Number));
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Repeat,
        names: &["Repeat"],
        schema: Schema::new(props).with_default_param("body"),
        scope_vars: &["as", "index"],
        parsed: None,
        pre_render: None,
        render: render_repeat,
        post_render: None,
    });
}
