//! Component definition utilities.
//!
//! Every component kind is registered on the [`Context`] through a
//! [`ComponentDefSpec`]: the tag names it answers to, its property schema and
//! the lifecycle hooks run at parse and render time.

use alloc::rc::Rc;
use core::fmt;

use crate::context::Context;
use crate::namespace::KeyMap;
use crate::schema::Schema;
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;
use crate::value::Value;

/// Called when the closing tag of a node has been parsed.
pub type ParsedHook = fn(ctx: &mut Context, id: NodeId) -> Result<(), TemplateError>;

/// Called after bindings are resolved and before rendering; may adjust the
/// resolved properties.
pub type PreRenderHook =
    fn(ctx: &mut Context, id: NodeId, props: &mut Props) -> Result<(), TemplateError>;

/// Writes the node's output.
pub type RenderFn = fn(
    ctx: &mut Context,
    id: NodeId,
    props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError>;

/// Called after rendering.
pub type PostRenderHook =
    fn(ctx: &mut Context, id: NodeId, props: &Props) -> Result<(), TemplateError>;

/// Complete specification for defining a component kind.
pub struct ComponentDefSpec<'a> {
    /// Behaviour tag
    pub kind: ComponentKind,
    /// Tag names (after `c:`) the component answers to
    pub names: &'a [&'a str],
    /// Property schema
    pub schema: Schema,
    /// Properties whose values name data sources the component defines for
    /// its content (loop variables)
    pub scope_vars: &'static [&'static str],
    /// Parse hook
    pub parsed: Option<ParsedHook>,
    /// Pre-render hook
    pub pre_render: Option<PreRenderHook>,
    /// Renderer
    pub render: RenderFn,
    /// Post-render hook
    pub post_render: Option<PostRenderHook>,
}

/// Runtime component specification stored in the registry.
#[derive(Clone)]
pub struct ComponentSpec {
    /// Behaviour tag
    pub kind: ComponentKind,
    /// Shared property schema
    pub schema: Rc<Schema>,
    /// Loop-variable properties
    pub scope_vars: &'static [&'static str],
    /// Parse hook
    pub parsed: Option<ParsedHook>,
    /// Pre-render hook
    pub pre_render: Option<PreRenderHook>,
    /// Renderer
    pub render: RenderFn,
    /// Post-render hook
    pub post_render: Option<PostRenderHook>,
}

impl From<ComponentDefSpec<'_>> for ComponentSpec {
    fn from(spec: ComponentDefSpec<'_>) -> Self {
        Self {
            kind: spec.kind,
            schema: Rc::new(spec.schema),
            scope_vars: spec.scope_vars,
            parsed: spec.parsed,
            pre_render: spec.pre_render,
            render: spec.render,
            post_render: spec.post_render,
        }
    }
}

/// Resolved property values of a node for one render pass.
///
/// Readers see the declared default for any property that is absent or
/// `Null`.
#[derive(Debug, Clone)]
pub struct Props {
    values: KeyMap<String, Value>,
    schema: Rc<Schema>,
}

impl Props {
    /// Wrap resolved values.
    #[must_use]
    pub const fn new(values: KeyMap<String, Value>, schema: Rc<Schema>) -> Self {
        Self { values, schema }
    }

    /// Whether a non-null value was supplied for `name`.
    #[must_use]
    pub fn is_supplied(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| *v != Value::Null)
    }

    /// The value of `name`, falling back to the declared default.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        match self.values.get(name) {
            Some(value) if *value != Value::Null => value.clone(),
            _ => self
                .schema
                .prop(name)
                .and_then(|spec| spec.default.clone())
                .unwrap_or(Value::Null),
        }
    }

    /// String form of `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.get(name).to_text()
    }

    /// Truthiness of `name`.
    #[must_use]
    pub fn bool(&self, name: &str) -> bool {
        self.get(name).is_truthy()
    }

    /// Numeric value of `name`, if any.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).as_number()
    }

    /// Parameter node stored in a sub-content property.
    #[must_use]
    pub fn content(&self, name: &str) -> Option<NodeId> {
        match self.values.get(name) {
            Some(Value::Content(id)) => Some(*id),
            _ => None,
        }
    }

    /// Parameter nodes stored in a parameter-list property.
    #[must_use]
    pub fn params(&self, name: &str) -> Vec<NodeId> {
        match self.values.get(name) {
            Some(Value::List(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::Content(id) => Some(*id),
                    _ => None,
                })
                .collect(),
            Some(Value::Content(id)) => vec![*id],
            _ => Vec::new(),
        }
    }

    /// Override a resolved value.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_owned(), value);
    }

    /// Iterate over supplied values (defaults excluded).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropSpec, PropType};

    #[test]
    fn test_props_fall_back_to_defaults() {
        let schema = Rc::new(Schema::new(vec![
            PropSpec::new("as", PropType::Id).with_default("item"),
            PropSpec::new("count", PropType::Number),
        ]));
        let mut values = KeyMap::default();
        values.insert("count".to_owned(), Value::Null);
        let mut props = Props::new(values, schema);
        assert_eq!(props.text("as"), "item");
        assert!(!props.is_supplied("count"));
        assert_eq!(props.number("count"), None);
        props.set("as", Value::from("row"));
        assert_eq!(props.text("as"), "row");
        assert!(props.params("missing").is_empty());
    }
}
