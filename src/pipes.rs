//! Named value transforms applied by `|name:args` in binding expressions.
//!
//! Lookup order: explicitly registered pipes, then the built-in table, then
//! the fallback object (method `<name>_pipe`). A name none of them knows is a
//! [`ErrorKind::PipeNotFound`] error; there is no silent identity fallback.

use alloc::rc::Rc;
use core::fmt::Write;

use phf::phf_map;

use crate::namespace::KeyMap;
use crate::types::{ErrorKind, TemplateError};
use crate::value::Value;

/// A registered pipe.
pub type PipeFn = Rc<dyn Fn(&Value, &[String]) -> Result<Value, TemplateError>>;

/// Signature of the built-in pipes.
pub type StaticPipe = fn(&Value, &[String]) -> Result<Value, TemplateError>;

/// Catch-all pipe handler consulted after the registered and built-in pipes.
pub trait PipeFallback {
    /// Invoke `method` (`<name>_pipe`) if the object provides it.
    fn call(&self, method: &str, value: &Value, args: &[String])
    -> Option<Result<Value, TemplateError>>;
}

fn failed<S: Into<String>>(name: &str, reason: S) -> TemplateError {
    TemplateError::new(ErrorKind::PipeFailed {
        name: name.to_owned(),
        reason: reason.into(),
    })
}

fn pipe_upper(value: &Value, _: &[String]) -> Result<Value, TemplateError> {
    Ok(Value::Text(value.to_text().to_uppercase()))
}

fn pipe_lower(value: &Value, _: &[String]) -> Result<Value, TemplateError> {
    Ok(Value::Text(value.to_text().to_lowercase()))
}

fn pipe_trim(value: &Value, _: &[String]) -> Result<Value, TemplateError> {
    Ok(Value::Text(value.to_text().trim().to_owned()))
}

fn pipe_default(value: &Value, args: &[String]) -> Result<Value, TemplateError> {
    if value.is_set() {
        Ok(value.clone())
    } else {
        Ok(Value::Text(args.first().cloned().unwrap_or_default()))
    }
}

#[allow(clippy::cast_precision_loss)]
fn pipe_length(value: &Value, _: &[String]) -> Result<Value, TemplateError> {
    let len = match value {
        Value::Null => 0,
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => other.to_text().chars().count(),
    };
    Ok(Value::Number(len as f64))
}

fn pipe_join(value: &Value, args: &[String]) -> Result<Value, TemplateError> {
    let sep = args.first().map_or(", ", String::as_str);
    Ok(Value::Text(match value {
        Value::List(items) => items
            .iter()
            .map(Value::to_text)
            .collect::<Vec<_>>()
            .join(sep),
        other => other.to_text(),
    }))
}

fn pipe_json(value: &Value, _: &[String]) -> Result<Value, TemplateError> {
    Ok(Value::Text(value.to_json().to_string()))
}

fn pipe_raw(value: &Value, _: &[String]) -> Result<Value, TemplateError> {
    Ok(Value::Markup(value.to_text()))
}

fn pipe_not(value: &Value, _: &[String]) -> Result<Value, TemplateError> {
    Ok(Value::Bool(!value.is_truthy()))
}

fn pipe_fixed(value: &Value, args: &[String]) -> Result<Value, TemplateError> {
    let digits = match args.first() {
        Some(arg) => arg
            .parse::<usize>()
            .map_err(|_| failed("fixed", format!("'{arg}' is not a digit count")))?,
        None => 0,
    };
    let Some(n) = value.as_number() else {
        if *value == Value::Null {
            return Ok(Value::Null);
        }
        return Err(failed(
            "fixed",
            format!("cannot format {} as a number", value.type_name()),
        ));
    };
    let mut out = String::new();
    write!(out, "{n:.digits$}")?;
    Ok(Value::Text(out))
}

/// Pipes available in every registry.
pub static BUILTIN_PIPES: phf::Map<&'static str, StaticPipe> = phf_map! {
    "upper" => pipe_upper as StaticPipe,
    "lower" => pipe_lower as StaticPipe,
    "trim" => pipe_trim as StaticPipe,
    "default" => pipe_default as StaticPipe,
    "length" => pipe_length as StaticPipe,
    "join" => pipe_join as StaticPipe,
    "json" => pipe_json as StaticPipe,
    "raw" => pipe_raw as StaticPipe,
    "not" => pipe_not as StaticPipe,
    "fixed" => pipe_fixed as StaticPipe,
};

/// Pipe registry with an optional fallback handler.
#[derive(Clone, Default)]
pub struct PipeRegistry {
    pipes: KeyMap<String, PipeFn>,
    fallback: Option<Rc<dyn PipeFallback>>,
}

impl PipeRegistry {
    /// Register (or replace) one pipe.
    pub fn register<F>(&mut self, name: &str, pipe: F)
    where
        F: Fn(&Value, &[String]) -> Result<Value, TemplateError> + 'static,
    {
        self.pipes.insert(name.to_owned(), Rc::new(pipe));
    }

    /// Register a whole map of pipes at once.
    pub fn register_all<I>(&mut self, pipes: I)
    where
        I: IntoIterator<Item = (String, PipeFn)>,
    {
        self.pipes.extend(pipes);
    }

    /// Install the fallback handler, replacing any previous one.
    pub fn set_fallback<F: PipeFallback + 'static>(&mut self, fallback: F) {
        self.fallback = Some(Rc::new(fallback));
    }

    /// Whether `name` resolves through the registered or built-in pipes.
    /// The fallback is not consulted.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pipes.contains_key(name) || BUILTIN_PIPES.contains_key(name)
    }

    /// Apply the pipe `name` to `value`.
    pub fn apply(&self, name: &str, value: &Value, args: &[String]) -> Result<Value, TemplateError> {
        if let Some(pipe) = self.pipes.get(name) {
            return pipe(value, args);
        }
        if let Some(pipe) = BUILTIN_PIPES.get(name) {
            return pipe(value, args);
        }
        if let Some(fallback) = &self.fallback
            && let Some(result) = fallback.call(&format!("{name}_pipe"), value, args)
        {
            return result;
        }
        Err(TemplateError::new(ErrorKind::PipeNotFound {
            name: name.to_owned(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply<V: Into<Value>>(name: &str, value: V, args: &[&str]) -> Result<Value, TemplateError> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
        PipeRegistry::default().apply(name, &value.into(), &args)
    }

    #[test]
    fn test_builtin_pipes() {
        assert_eq!(apply("upper", "abc", &[]).unwrap(), Value::from("ABC"));
        assert_eq!(apply("trim", "  x ", &[]).unwrap(), Value::from("x"));
        assert_eq!(apply("default", "", &["n/a"]).unwrap(), Value::from("n/a"));
        assert_eq!(apply("default", "v", &["n/a"]).unwrap(), Value::from("v"));
        assert_eq!(apply("length", json!([1, 2, 3]), &[]).unwrap(), Value::Number(3.0));
        assert_eq!(apply("join", json!(["a", "b"]), &["/"]).unwrap(), Value::from("a/b"));
        assert_eq!(apply("json", json!({"a": [1]}), &[]).unwrap(), Value::from(r#"{"a":[1]}"#));
        assert_eq!(apply("raw", "<b>", &[]).unwrap(), Value::Markup("<b>".to_owned()));
        assert_eq!(apply("not", 0.0, &[]).unwrap(), Value::Bool(true));
        assert_eq!(apply("fixed", 1.23456, &["2"]).unwrap(), Value::from("1.23"));
        assert!(apply("fixed", "abc", &["2"]).is_err());
    }

    #[test]
    fn test_register_a_map_of_pipes() {
        let shout: PipeFn = Rc::new(|v: &Value, _: &[String]| Ok(Value::Text(format!("{v}!"))));
        let wrap: PipeFn = Rc::new(|v: &Value, args: &[String]| {
            let side = args.first().map_or("*", String::as_str);
            Ok(Value::Text(format!("{side}{v}{side}")))
        });
        let mut registry = PipeRegistry::default();
        registry.register_all([("shout".to_owned(), shout), ("wrap".to_owned(), wrap)]);
        assert!(registry.contains("shout"));
        assert!(registry.contains("wrap"));
        assert_eq!(
            registry.apply("shout", &Value::from("hi"), &[]).unwrap(),
            Value::from("hi!")
        );
        assert_eq!(
            registry.apply("wrap", &Value::from("x"), &["_".to_owned()]).unwrap(),
            Value::from("_x_")
        );
    }

    #[test]
    fn test_registered_pipes_override_builtins() {
        let mut registry = PipeRegistry::default();
        registry.register("upper", |v, _| Ok(Value::Text(format!("<{v}>"))));
        assert_eq!(
            registry.apply("upper", &Value::from("x"), &[]).unwrap(),
            Value::from("<x>")
        );
    }

    struct Shouter;

    impl PipeFallback for Shouter {
        fn call(
            &self,
            method: &str,
            value: &Value,
            _: &[String],
        ) -> Option<Result<Value, TemplateError>> {
            (method == "shout_pipe").then(|| Ok(Value::Text(format!("{value}!"))))
        }
    }

    #[test]
    fn test_fallback_and_not_found() {
        let mut registry = PipeRegistry::default();
        registry.set_fallback(Shouter);
        assert_eq!(
            registry.apply("shout", &Value::from("hey"), &[]).unwrap(),
            Value::from("hey!")
        );
        let err = registry.apply("whisper", &Value::Null, &[]).unwrap_err();
        assert!(matches!(err.kind.as_ref(), ErrorKind::PipeNotFound { name } if name == "whisper"));
        assert_eq!(err.category(), crate::types::ErrorCategory::Resolution);
    }
}
