//! Template definitions, discovery and expansion.
//!
//! A `<c:Template>` (or `<c:Macro>`) tag registers a named, reusable body with
//! typed parameters when its closing tag is parsed. Instances of the template
//! are expanded in place right after their own closing tag: the body is
//! cloned, parameter references are substituted or transferred, and the clone
//! replaces the instance node.
//!
//! Unknown tag names may name a template kept in its own file; see
//! [`discover`].

use alloc::rc::Rc;
use alloc::sync::Arc;
use core::mem;

use strum::{AsRefStr, Display, EnumString};
use tracing::debug;

use crate::context::Context;
use crate::namespace::KeyMap;
use crate::parser::literal_text;
use crate::schema::{PropSpec, PropType, Schema, coerce};
use crate::tree::{ComponentKind, Node, NodeId};
use crate::types::{ErrorKind, SourceLocation, TemplateError};
use crate::value::Value;

mod expand;
pub mod loader;

pub use expand::expand;
pub use loader::{FsLoader, MemoryLoader, TemplateLoader};

/// Which list a page asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AssetKind {
    /// JavaScript.
    Script,
    /// CSS.
    Style,
}

/// A script or style declared by a template and hoisted to page level when
/// the template is expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Script or style.
    pub kind: AssetKind,
    /// Unique name; repeated expansions add an asset once.
    pub name: String,
    /// External reference, when given.
    pub src: Option<String>,
    /// Inline source otherwise.
    pub content: String,
}

/// A registered template.
#[derive(Debug, Clone)]
pub struct TemplateDef {
    /// Template name, also the tag its instances use.
    pub name: String,
    /// Declared parameters in declaration order.
    pub params: Vec<PropSpec>,
    /// Parameter receiving loose content written inside an instance.
    pub default_param: Option<String>,
    /// Canonical body; only ever cloned.
    pub body: NodeId,
    /// Assets hoisted by every expansion.
    pub assets: Vec<Asset>,
    /// Schema applied to instance tags.
    pub instance_schema: Rc<Schema>,
    /// Where the definition was parsed from.
    pub loc: Option<SourceLocation>,
}

impl TemplateDef {
    /// A declared parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&PropSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Declared parameter names, comma separated, for diagnostics.
    #[must_use]
    pub fn expected_params(&self) -> String {
        self.params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Schema of the `Template` component itself.
pub(crate) fn definition_schema() -> Schema {
    Schema::new(vec![
        PropSpec::new("name", PropType::Id).required(),
        PropSpec::new("default", PropType::Id),
        PropSpec::new("param", PropType::Params),
        PropSpec::new("script", PropType::Params),
        PropSpec::new("style", PropType::Params),
    ])
    .with_children()
}

fn param_text(ctx: &Context, id: NodeId, name: &str) -> Result<Option<String>, TemplateError> {
    Ok(ctx
        .tree
        .get(id)?
        .props
        .get(name)
        .filter(|v| v.is_set())
        .map(Value::to_text))
}

fn param_spec(ctx: &Context, template: &str, id: NodeId) -> Result<PropSpec, TemplateError> {
    let node = ctx.tree.get(id)?;
    let name = param_text(ctx, id, "name")?
        .ok_or_else(|| {
            TemplateError::with_token(
                ErrorKind::MissingParamName {
                    template: template.to_owned(),
                },
                node,
            )
        })?;
    let ty = match param_text(ctx, id, "type")? {
        Some(ty) => ty.parse::<PropType>().map_err(|_| {
            TemplateError::with_token(ErrorKind::UnknownPropertyType { name: ty.clone() }, node)
        })?,
        None => PropType::Text,
    };

    let mut spec = PropSpec::new(name, ty);
    if let Some(values) = param_text(ctx, id, "values")? {
        spec.values = Some(values.split('|').map(|v| v.trim().to_owned()).collect());
    }
    if let Some(default) = param_text(ctx, id, "default")? {
        let value = if ty == PropType::Content {
            Value::Markup(default)
        } else {
            Value::Text(default)
        };
        spec.default = Some(coerce(template, &spec, value).map_err(|e| e.or_at(node))?);
    } else if !node.children.is_empty() {
        // Content written inside the declaration is the default content.
        spec.default = Some(Value::Content(id));
    }
    if let Some(required) = node.props.get("required") {
        spec.required = !matches!(required.to_text().as_str(), "false" | "0" | "no" | "off");
    }
    Ok(spec)
}

fn asset(ctx: &mut Context, kind: AssetKind, id: NodeId) -> Result<Asset, TemplateError> {
    let name = match param_text(ctx, id, "name")? {
        Some(name) => name,
        None => ctx.auto_id(kind.as_ref()),
    };
    Ok(Asset {
        kind,
        name,
        src: param_text(ctx, id, "src")?,
        content: literal_text(ctx, id).trim().to_owned(),
    })
}

fn take_params(props: &mut KeyMap<String, Value>, key: &str) -> Vec<NodeId> {
    match props.remove(key) {
        Some(Value::List(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::Content(id) => Some(id),
                _ => None,
            })
            .collect(),
        Some(Value::Content(id)) => vec![id],
        _ => Vec::new(),
    }
}

/// Turn a parsed `Template` node into a registered definition and remove the
/// node from the tree.
pub fn define_from_node(ctx: &mut Context, id: NodeId) -> Result<(), TemplateError> {
    let node = ctx.tree.get_mut(id)?;
    let loc = node.loc.clone();
    let mut props = mem::take(&mut node.props);
    let children = mem::take(&mut node.children);
    let at = |kind: ErrorKind| TemplateError::with_token(kind, &loc);

    let name = props
        .get("name")
        .filter(|v| v.is_set())
        .map(Value::to_text)
        .ok_or_else(|| at(ErrorKind::MissingTemplateName))?;
    let default_param = props.get("default").filter(|v| v.is_set()).map(Value::to_text);

    let param_nodes = take_params(&mut props, "param");
    let script_nodes = take_params(&mut props, "script");
    let style_nodes = take_params(&mut props, "style");

    let mut params: Vec<PropSpec> = Vec::new();
    for pid in &param_nodes {
        let spec = param_spec(ctx, &name, *pid)?;
        if params.iter().any(|p| p.name == spec.name) {
            return Err(at(ErrorKind::DuplicateTemplateParam {
                template: name,
                param: spec.name,
            }));
        }
        params.push(spec);
    }
    if let Some(default) = &default_param
        && !params.iter().any(|p| p.name == *default)
    {
        params.push(PropSpec::new(default.clone(), PropType::Content));
    }

    let mut assets = Vec::new();
    for (kind, nodes) in [(AssetKind::Script, &script_nodes), (AssetKind::Style, &style_nodes)] {
        for aid in nodes {
            assets.push(asset(ctx, kind, *aid)?);
        }
    }

    let fragment = Rc::clone(&ctx.component(ComponentKind::Fragment)?.schema);
    let body = ctx
        .tree
        .alloc(Node::new(name.clone(), ComponentKind::Fragment, fragment).with_loc(loc.clone()));
    for child in children {
        ctx.tree.get_mut(child)?.parent = None;
        ctx.tree.append_child(body, child)?;
    }

    // Declarations whose content is a default value stay alive as part of
    // the definition; the rest are freed with the node.
    for pid in param_nodes
        .iter()
        .chain(script_nodes.iter())
        .chain(style_nodes.iter())
    {
        ctx.tree.get_mut(*pid)?.parent = None;
        if !params
            .iter()
            .any(|p| p.default == Some(Value::Content(*pid)))
        {
            ctx.tree.remove(*pid)?;
        }
    }
    ctx.tree.remove(id)?;

    let instance_schema = Rc::new(Schema {
        props: params.clone(),
        default_param: default_param.clone(),
        allows_children: false,
        accepts_any: false,
    });
    let def = TemplateDef {
        name,
        params,
        default_param,
        body,
        assets,
        instance_schema,
        loc,
    };
    let body = def.body;
    if !ctx.define_template(def) {
        ctx.tree.remove(body)?;
    }
    Ok(())
}

/// Find the file defining template `name` along the configured search path,
/// parse it, and return the definition it registered.
pub fn discover(ctx: &mut Context, name: &str) -> Result<Rc<TemplateDef>, TemplateError> {
    let limit = ctx.settings.max_template_depth;
    if ctx.loading.iter().any(|n| n == name) || ctx.loading.len() >= limit {
        return Err(TemplateError::new(ErrorKind::TemplateDepthExceeded {
            name: name.to_owned(),
            limit,
        }));
    }

    let candidates = ctx.settings.template_candidates(name);
    for path in &candidates {
        let source = match ctx.loader().read(path) {
            Ok(Some(source)) => source,
            Ok(None) => continue,
            Err(err) => {
                return Err(TemplateError::new(ErrorKind::TemplateFileUnreadable {
                    path: path.display().to_string(),
                    details: err.to_string(),
                }));
            }
        };
        debug!(template = name, path = %path.display(), "loading template file");

        ctx.loading.push(name.to_owned());
        let parsed = crate::parser::parse_into(ctx, Arc::from(source), None);
        ctx.loading.pop();
        ctx.tree.remove(parsed?)?;

        return ctx.template(name).ok_or_else(|| {
            TemplateError::new(ErrorKind::TemplateNotDefinedInFile {
                name: name.to_owned(),
                path: path.display().to_string(),
            })
        });
    }

    Err(TemplateError::new(ErrorKind::TemplateFileNotFound {
        name: name.to_owned(),
        searched: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }))
}
