//! Main entry points: parse markup, render trees

use alloc::sync::Arc;
use core::fmt;

use tracing::debug;

use crate::context::Context;
use crate::parser::parse_into;
use crate::render::render_node;
use crate::tree::NodeId;
use crate::types::TemplateError;

/// Parse markup into a new document root owned by the context's tree.
///
/// Template definitions met along the way are registered, and template
/// instances are expanded, so the returned tree is ready to render.
///
/// # Parameters
/// * `ctx` - The request context
/// * `source` - The markup to parse
pub fn parse(ctx: &mut Context, source: &str) -> Result<NodeId, TemplateError> {
    debug!(len = source.len(), "parsing markup");
    parse_into(ctx, Arc::from(source), None)
}

/// Parse markup and append the result to the children of `parent`.
pub fn parse_under(ctx: &mut Context, parent: NodeId, source: &str) -> Result<(), TemplateError> {
    parse_into(ctx, Arc::from(source), Some(parent)).map(|_| ())
}

/// Render a parsed tree into `out`.
///
/// Bindings are resolved against the data currently published on the
/// context, so the same tree can be rendered again after the data changes.
/// On error, whatever was already written to `out` is incomplete.
pub fn render(ctx: &mut Context, root: NodeId, out: &mut dyn fmt::Write) -> Result<(), TemplateError> {
    render_node(ctx, root, out)
}

/// Render a parsed tree into a new string.
pub fn render_tree_to_string(ctx: &mut Context, root: NodeId) -> Result<String, TemplateError> {
    let mut out = String::new();
    render(ctx, root, &mut out)?;
    Ok(out)
}

/// Parse and render markup, returning the output.
pub fn render_to_string(ctx: &mut Context, source: &str) -> Result<String, TemplateError> {
    let root = parse(ctx, source)?;
    render_tree_to_string(ctx, root)
}
