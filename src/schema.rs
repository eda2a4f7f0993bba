//! Per-component property schemas and scalar coercion.
//!
//! Every component kind declares a fixed [`Schema`]: named, typed properties
//! with optional defaults and enumerated value sets. Setting a property that
//! the schema does not declare is an error, except for the accept-anything
//! schema used by parameter tags.

use strum::{AsRefStr, Display, EnumString};

use crate::types::{ErrorKind, TemplateError};
use crate::utils::is_identifier;
use crate::value::Value;

/// The type tag of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PropType {
    /// A name: letters, digits, `_` and `-`, not starting with a digit.
    #[strum(to_string = "id", serialize = "identifier")]
    Id,
    /// Free text.
    #[strum(to_string = "text", serialize = "string")]
    Text,
    /// A number.
    Number,
    /// A boolean (`true`/`1`/`yes`/`on`, `false`/`0`/`no`/`off`/empty).
    #[strum(to_string = "bool", serialize = "boolean")]
    Bool,
    /// An ordered list of parameter nodes (`<p:name>` repeated).
    Params,
    /// A nested node set.
    Content,
    /// An opaque record or record sequence.
    Data,
    /// Only settable through a binding expression.
    Binding,
    /// A nested bag of name/value pairs.
    Metadata,
}

impl PropType {
    /// Whether values of this type are nested node sets written as parameter
    /// tags.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Params | Self::Content | Self::Metadata)
    }
}

/// Declaration of one property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropSpec {
    /// Property name.
    pub name: String,
    /// Type tag.
    pub ty: PropType,
    /// Value used when the property is not supplied.
    pub default: Option<Value>,
    /// Allowed string forms, when enumerated.
    pub values: Option<Vec<String>>,
    /// Whether omitting the property is an error (template parameters only).
    pub required: bool,
}

impl PropSpec {
    /// A property with no default and no enumeration.
    pub fn new<S: Into<String>>(name: S, ty: PropType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            values: None,
            required: false,
        }
    }

    /// Set the default value.
    #[must_use]
    pub fn with_default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict the property to an enumerated set of values.
    #[must_use]
    pub fn with_values(mut self, values: &[&str]) -> Self {
        self.values = Some(values.iter().map(|v| (*v).to_owned()).collect());
        self
    }

    /// Mark as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The property schema of a component kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// Declared properties.
    pub props: Vec<PropSpec>,
    /// Property that loose content is wrapped into when children are not
    /// allowed directly.
    pub default_param: Option<String>,
    /// Whether the component takes child nodes.
    pub allows_children: bool,
    /// Accept any property name as text (parameter tags).
    pub accepts_any: bool,
}

impl Schema {
    /// A schema with the given properties and no children.
    #[must_use]
    pub fn new(props: Vec<PropSpec>) -> Self {
        Self {
            props,
            ..Self::default()
        }
    }

    /// No properties, any children.
    #[must_use]
    pub fn content() -> Self {
        Self {
            allows_children: true,
            ..Self::default()
        }
    }

    /// Any properties, any children.
    #[must_use]
    pub fn any() -> Self {
        Self {
            allows_children: true,
            accepts_any: true,
            ..Self::default()
        }
    }

    /// Allow child nodes.
    #[must_use]
    pub const fn with_children(mut self) -> Self {
        self.allows_children = true;
        self
    }

    /// Wrap loose content into `name`.
    #[must_use]
    pub fn with_default_param(mut self, name: &str) -> Self {
        self.default_param = Some(name.to_owned());
        self
    }

    /// Look up a declared property.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&PropSpec> {
        self.props.iter().find(|p| p.name == name)
    }

    /// Look up a property for assignment, failing if it is not declared.
    ///
    /// Returns `None` for names accepted by an accept-anything schema.
    pub fn lookup(&self, component: &str, name: &str) -> Result<Option<&PropSpec>, TemplateError> {
        match self.prop(name) {
            Some(spec) => Ok(Some(spec)),
            None if self.accepts_any => Ok(None),
            None if self.props.is_empty() => Err(TemplateError::new(
                ErrorKind::PropertiesNotSupported {
                    component: component.to_owned(),
                },
            )),
            None => Err(TemplateError::new(ErrorKind::UndeclaredProperty {
                component: component.to_owned(),
                property: name.to_owned(),
            })),
        }
    }

    /// Validate and coerce `value` for the property `name`.
    pub fn coerce(&self, component: &str, name: &str, value: Value) -> Result<Value, TemplateError> {
        match self.lookup(component, name)? {
            Some(spec) => coerce(component, spec, value),
            None => Ok(value),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn mismatch(component: &str, spec: &PropSpec, expected: &'static str) -> TemplateError {
    TemplateError::new(ErrorKind::TypeMismatch {
        component: component.to_owned(),
        property: spec.name.clone(),
        expected,
    })
}

/// Coerce a value to the declared type of `spec` and check its enumeration.
///
/// `Null` passes through unchanged: it means "not supplied" and readers fall
/// back to the default.
pub fn coerce(component: &str, spec: &PropSpec, value: Value) -> Result<Value, TemplateError> {
    if value == Value::Null {
        return Ok(value);
    }

    let coerced = match spec.ty {
        PropType::Id => {
            let text = value.to_text();
            if !is_identifier(&text) {
                return Err(TemplateError::new(ErrorKind::InvalidIdentifier {
                    component: component.to_owned(),
                    property: spec.name.clone(),
                    value: text,
                }));
            }
            Value::Text(text)
        }
        PropType::Text => match value {
            Value::Text(_) | Value::Markup(_) => value,
            Value::Content(_) | Value::Data(_) => {
                return Err(mismatch(component, spec, "text"));
            }
            other => Value::Text(other.to_text()),
        },
        PropType::Number => match value {
            Value::Number(_) => value,
            Value::Bool(b) => Value::Number(f64::from(u8::from(b))),
            Value::Text(ref text) => {
                let n = text.trim().parse::<f64>().map_err(|_| {
                    TemplateError::new(ErrorKind::InvalidNumber {
                        component: component.to_owned(),
                        property: spec.name.clone(),
                        value: text.clone(),
                    })
                })?;
                Value::Number(n)
            }
            _ => return Err(mismatch(component, spec, "a number")),
        },
        PropType::Bool => match value {
            Value::Bool(_) => value,
            Value::Number(n) => Value::Bool(n != 0.0),
            Value::Text(ref text) => Value::Bool(parse_bool(text).ok_or_else(|| {
                TemplateError::new(ErrorKind::InvalidBoolean {
                    component: component.to_owned(),
                    property: spec.name.clone(),
                    value: text.clone(),
                })
            })?),
            _ => return Err(mismatch(component, spec, "a boolean")),
        },
        PropType::Params => match value {
            Value::List(ref items) if items.iter().all(|v| matches!(v, Value::Content(_))) => value,
            Value::Content(_) => Value::List(vec![value]),
            _ => return Err(mismatch(component, spec, "a parameter list")),
        },
        PropType::Metadata => match value {
            Value::Map(_) | Value::Content(_) => value,
            _ => return Err(mismatch(component, spec, "metadata")),
        },
        PropType::Content | PropType::Data | PropType::Binding => value,
    };

    if let Some(allowed) = &spec.values {
        let text = coerced.to_text();
        if !allowed.iter().any(|v| *v == text) {
            return Err(TemplateError::new(ErrorKind::ValueNotInEnum {
                component: component.to_owned(),
                property: spec.name.clone(),
                value: text,
                allowed: allowed.join(", "),
            }));
        }
    }

    Ok(coerced)
}
