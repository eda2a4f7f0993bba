//! Binding expressions: `{source.path|pipe:arg,...}` spans in attribute values
//! and text, resolved against ambient data at render time.
//!
//! A value that is exactly one `{...}` span is a [`Binding::Simple`] and keeps
//! the native type of what it references. Anything else containing a span is
//! a [`Binding::Composite`] and always produces text.
//!
//! Bindings are parsed once and evaluated on every render; nothing is cached
//! between evaluations.
//!
//! `{{` writes a literal `{`, so inline CSS or script such as
//! `p{{color:red}` does not open a span. A path starting at `$`
//! (`{$.user.name}`) always names ambient data, even inside a template body
//! where bare names are reserved for template parameters.

use alloc::borrow::Cow;
use core::{fmt, mem};

use crate::lexer::match_binding;
use crate::namespace::Namespace;
use crate::pipes::PipeRegistry;
use crate::types::{ErrorKind, TemplateError};
use crate::value::Value;

/// What an expression starts from.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Dotted reference: the first segment names an ambient data source (or,
    /// inside a template body, a template parameter), the rest walk into it.
    Path(Vec<String>),
    /// A constant: quoted string, number, `true`, `false` or `null`.
    Literal(Value),
    /// Text with embedded spans, produced when a composite attribute value is
    /// passed into a template parameter that the body pipes further. Always
    /// evaluates to text.
    Interpolated(Vec<Segment>),
}

/// One `|name:arg,arg` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeCall {
    /// Pipe name.
    pub name: String,
    /// Literal arguments.
    pub args: Vec<String>,
}

/// The contents of one `{...}` span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Starting value.
    pub operand: Operand,
    /// Transforms applied left to right.
    pub pipes: Vec<PipeCall>,
}

/// A piece of a composite binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text copied verbatim.
    Literal(String),
    /// An embedded `{...}` span.
    Ref(Expr),
}

/// A pending binding on a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Exactly one span, nothing around it.
    Simple(Expr),
    /// Text with one or more embedded spans.
    Composite(Vec<Segment>),
}

/// Split `s` at top-level occurrences of `sep`, ignoring separators inside
/// quotes.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut last = 0;
    for (idx, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == sep => {
                parts.push(&s[last..idx]);
                last = idx + c.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&s[last..]);
    parts
}

fn unquote(s: &str) -> Option<&str> {
    let first = s.chars().next()?;
    if matches!(first, '"' | '\'') && s.len() >= 2 && s.ends_with(first) {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

/// Path head that names the ambient data root explicitly.
pub const DATA_ROOT: &str = "$";

/// Replace each `{{` escape with a single literal brace.
#[must_use]
pub fn unescape_braces(text: &str) -> Cow<'_, str> {
    if text.contains("{{") {
        Cow::Owned(text.replace("{{", "{"))
    } else {
        Cow::Borrowed(text)
    }
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '$'))
}

impl Expr {
    /// Parse the inside of a `{...}` span.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let invalid = |reason| {
            TemplateError::new(ErrorKind::InvalidBinding {
                expr: source.to_owned(),
                reason,
            })
        };

        let mut parts = split_top_level(source, '|').into_iter();
        let head = parts.next().unwrap_or_default().trim();
        let operand = if let Some(text) = unquote(head) {
            Operand::Literal(Value::Text(text.to_owned()))
        } else if head.starts_with(|c: char| c.is_ascii_digit() || c == '-')
            && let Ok(n) = head.parse::<f64>()
        {
            Operand::Literal(Value::Number(n))
        } else {
            match head {
                "" => return Err(invalid("missing reference")),
                "true" => Operand::Literal(Value::Bool(true)),
                "false" => Operand::Literal(Value::Bool(false)),
                "null" => Operand::Literal(Value::Null),
                path => {
                    let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
                    if !segments.iter().all(|s| is_path_segment(s)) {
                        return Err(invalid("malformed reference path"));
                    }
                    Operand::Path(segments)
                }
            }
        };

        let mut pipes = Vec::new();
        for part in parts {
            let (name, args) = part.split_once(':').unwrap_or((part, ""));
            let name = name.trim();
            if !is_path_segment(name) {
                return Err(invalid("malformed pipe name"));
            }
            let args = if args.trim().is_empty() {
                Vec::new()
            } else {
                split_top_level(args, ',')
                    .into_iter()
                    .map(|a| {
                        let a = a.trim();
                        unquote(a).unwrap_or(a).to_owned()
                    })
                    .collect()
            };
            pipes.push(PipeCall {
                name: name.to_owned(),
                args,
            });
        }

        Ok(Self { operand, pipes })
    }

    /// An expression yielding a constant.
    #[must_use]
    pub const fn literal(value: Value) -> Self {
        Self {
            operand: Operand::Literal(value),
            pipes: Vec::new(),
        }
    }

    /// The first path segment, if the operand is a reference.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        match &self.operand {
            Operand::Path(path) => path.first().map(String::as_str),
            Operand::Literal(_) | Operand::Interpolated(_) => None,
        }
    }

    /// Resolve against ambient data and apply the pipe chain.
    ///
    /// A reference to a missing data source resolves to `Null`; an unknown
    /// pipe is an error.
    pub fn evaluate(
        &self,
        data: &Namespace<Value>,
        pipes: &PipeRegistry,
    ) -> Result<Value, TemplateError> {
        let mut value = match &self.operand {
            Operand::Literal(v) => v.clone(),
            Operand::Path(path) => {
                let path = match path.split_first() {
                    Some((head, rest)) if head == DATA_ROOT => rest,
                    _ => path.as_slice(),
                };
                match path.split_first() {
                    Some((head, rest)) => data.get(head).map_or(Value::Null, |v| v.lookup(rest)),
                    None => Value::Null,
                }
            }
            Operand::Interpolated(segments) => interpolate(segments, data, pipes)?,
        };
        for pipe in &self.pipes {
            value = pipes.apply(&pipe.name, &value, &pipe.args)?;
        }
        Ok(value)
    }
}

impl Binding {
    /// Parse a raw attribute value or text run.
    ///
    /// Returns `Ok(None)` when the text holds no binding span; such text is
    /// taken literally after [`unescape_braces`].
    pub fn parse(text: &str) -> Result<Option<Self>, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;
        while let Some(idx) = rest.find('{') {
            literal.push_str(&rest[..idx]);
            rest = &rest[idx..];
            if rest[1..].starts_with('{') {
                literal.push('{');
                rest = &rest[2..];
                continue;
            }
            match match_binding(rest).map_err(TemplateError::new)? {
                Some(len) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(mem::take(&mut literal)));
                    }
                    segments.push(Segment::Ref(Expr::parse(&rest[1..len - 1])?));
                    rest = &rest[len..];
                }
                None => {
                    literal.push('{');
                    rest = &rest[1..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Ref(_))) {
            return Ok(None);
        }
        if segments.len() == 1
            && let Some(Segment::Ref(expr)) = segments.pop()
        {
            return Ok(Some(Self::Simple(expr)));
        }
        Ok(Some(Self::Composite(segments)))
    }

    /// Every expression in the binding.
    pub fn exprs(&self) -> impl Iterator<Item = &Expr> {
        let (simple, segments) = match self {
            Self::Simple(expr) => (Some(expr), &[][..]),
            Self::Composite(segments) => (None, segments.as_slice()),
        };
        simple.into_iter().chain(segments.iter().filter_map(|s| match s {
            Segment::Ref(expr) => Some(expr),
            Segment::Literal(_) => None,
        }))
    }

    /// Resolve the binding. Simple bindings keep the native type; composite
    /// ones concatenate the string forms of their segments.
    pub fn evaluate(
        &self,
        data: &Namespace<Value>,
        pipes: &PipeRegistry,
    ) -> Result<Value, TemplateError> {
        match self {
            Self::Simple(expr) => expr.evaluate(data, pipes),
            Self::Composite(segments) => interpolate(segments, data, pipes),
        }
    }
}

fn interpolate(
    segments: &[Segment],
    data: &Namespace<Value>,
    pipes: &PipeRegistry,
) -> Result<Value, TemplateError> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Ref(expr) => out.push_str(&expr.evaluate(data, pipes)?.to_text()),
        }
    }
    Ok(Value::Text(out))
}

fn write_segments(f: &mut fmt::Formatter<'_>, segments: &[Segment]) -> fmt::Result {
    for segment in segments {
        match segment {
            Segment::Literal(text) => f.write_str(text)?,
            Segment::Ref(expr) => write!(f, "{{{expr}}}")?,
        }
    }
    Ok(())
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Text(s) | Value::Markup(s) => {
            let quote = if s.contains('"') { '\'' } else { '"' };
            write!(f, "{quote}{s}{quote}")
        }
        other => write!(f, "{other}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::Path(path) => f.write_str(&path.join("."))?,
            Operand::Literal(value) => write_literal(f, value)?,
            Operand::Interpolated(segments) => {
                f.write_str("`")?;
                write_segments(f, segments)?;
                f.write_str("`")?;
            }
        }
        for pipe in &self.pipes {
            write!(f, "|{}", pipe.name)?;
            if !pipe.args.is_empty() {
                write!(f, ":{}", pipe.args.join(","))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(expr) => write!(f, "{{{expr}}}"),
            Self::Composite(segments) => write_segments(f, segments),
        }
    }
}
