//! `<c:Assets type="script|style|all">`: writes the scripts and styles hoisted
//! by expanded templates, in the order they were first added.

use core::fmt;

use crate::context::Context;
use crate::define_component::{ComponentDefSpec, Props};
use crate::schema::{PropSpec, PropType, Schema};
use crate::template::{Asset, AssetKind};
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;
use crate::utils::escape_into;

fn write_asset(asset: &Asset, out: &mut dyn fmt::Write) -> fmt::Result {
    match (asset.kind, &asset.src) {
        (AssetKind::Script, Some(src)) => {
            out.write_str("<script src=\"")?;
            escape_into(out, src)?;
            out.write_str("\"></script>")?;
        }
        (AssetKind::Script, None) => write!(out, "<script>{}</script>", asset.content)?,
        (AssetKind::Style, Some(src)) => {
            out.write_str("<link rel=\"stylesheet\" href=\"")?;
            escape_into(out, src)?;
            out.write_str("\">")?;
        }
        (AssetKind::Style, None) => write!(out, "<style>{}</style>", asset.content)?,
    }
    out.write_char('\n')
}

fn render(
    ctx: &mut Context,
    _id: NodeId,
    props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    let wanted = props.text("type");
    for asset in ctx.assets() {
        if wanted == "all" || wanted == asset.kind.as_ref() {
            write_asset(asset, out)?;
        }
    }
    Ok(())
}

/// Registers `<c:Assets>`.
pub fn define_assets(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Assets,
        names: &["Assets"],
        schema: Schema::new(vec![
            PropSpec::new("type", PropType::Text)
                .with_default("all")
                .with_values(&["script", "style", "all"]),
        ]),
        scope_vars: &[],
        parsed: None,
        pre_render: None,
        render,
        post_render: None,
    });
}
