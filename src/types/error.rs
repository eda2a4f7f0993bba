//! Error handling for the template engine
//!
//! Every failure in the engine, whether it happens while tokenizing markup,
//! validating a property, expanding a template or writing output, is reported
//! as a [`TemplateError`]. The error carries a categorised [`ErrorKind`] and,
//! when known, the position of the offending text so that the message can
//! quote it.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;
#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

use strum::{AsRefStr, Display};
use thiserror::Error;

use crate::types::SourceLocation;

/// Main error type returned by every fallible operation of the engine.
///
/// There is no partial recovery anywhere in the core: the first error aborts
/// the current parse or render and is handed back to the caller.
#[derive(Debug, Error)]
#[error("Template error: {kind}{context}")]
pub struct TemplateError {
    /// Categorised reason for the failure.
    #[source]
    pub kind: Box<ErrorKind>,
    /// Start offset of the offending text, when known.
    pub position: Option<usize>,
    /// Length of the offending text, when known.
    pub length: Option<usize>,
    context: ErrorContext,
    /// Backtrace of the error stack
    #[cfg(feature = "backtrace")]
    pub backtrace: Box<Backtrace>,
}

impl TemplateError {
    /// Create a new error with the given kind and no location.
    pub fn new<T: Into<ErrorKind>>(kind: T) -> Self {
        Self::from_kind(kind.into(), ErrorContext::None, None, None)
    }

    /// Create a new error positioned at a token, node or source span.
    pub fn with_token<T: Into<ErrorKind>>(kind: T, token: &dyn ErrorLocationProvider) -> Self {
        let mut position = None;
        let mut length = None;
        let context = token.loc().filter(|loc| loc.start() <= loc.end()).map_or(
            ErrorContext::None,
            |loc| {
                position = Some(loc.start());
                length = Some(loc.end().saturating_sub(loc.start()));
                ErrorContext::Location(loc.clone())
            },
        );

        Self::from_kind(kind.into(), context, position, length)
    }

    /// Attach a location to an error that was raised without one.
    ///
    /// Errors that already carry a position keep it.
    #[must_use]
    pub fn or_at(self, token: &dyn ErrorLocationProvider) -> Self {
        if self.position.is_some() {
            return self;
        }
        let Self { kind, .. } = self;
        Self::with_token(*kind, token)
    }

    /// High-level class of the failure.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    fn from_kind(
        kind: ErrorKind,
        context: ErrorContext,
        position: Option<usize>,
        length: Option<usize>,
    ) -> Self {
        Self {
            kind: Box::new(kind),
            position,
            length,
            context,
            #[cfg(feature = "backtrace")]
            backtrace: Box::new(Backtrace::force_capture()),
        }
    }
}

impl From<fmt::Error> for TemplateError {
    fn from(_: fmt::Error) -> Self {
        Self::new(ErrorKind::MarkupWriteFailure)
    }
}

/// The four error families of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorCategory {
    /// Malformed or misplaced markup.
    Parse,
    /// A property value or name rejected by a component schema.
    Schema,
    /// A template, pipe or template file that could not be found.
    Resolution,
    /// Output sink failures and broken internal invariants.
    Render,
}

/// Describes the specific reason for a [`TemplateError`].
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ErrorKind {
    // Parse errors
    #[error("Unexpected closing tag </{found}>")]
    UnexpectedCloseTag { found: String },
    #[error("Mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedCloseTag { expected: String, found: String },
    #[error("Tag <{tag}> is never closed")]
    UnclosedTag { tag: String },
    #[error("Closing tag </{tag}> cannot have attributes")]
    AttributesOnCloseTag { tag: String },
    #[error("Malformed tag")]
    MalformedTag,
    #[error("Malformed attribute in <{tag}>")]
    MalformedAttribute { tag: String },
    #[error("Duplicate attribute '{attr}' in <{tag}>")]
    DuplicateAttribute { tag: String, attr: String },
    #[error("Unbalanced binding expression")]
    UnbalancedBinding,
    #[error("Invalid binding expression '{expr}': {reason}")]
    InvalidBinding { expr: String, reason: &'static str },
    #[error("Literal content is not allowed inside <{tag}>")]
    ContentNotAllowed { tag: String },
    #[error("Component tags are not allowed inside scalar parameter <p:{param}>")]
    TagInScalarParameter { param: String },
    #[error("Unknown tag <{tag}>")]
    UnknownTag { tag: String },
    #[error("Parameter <p:{param}> is not declared by <{component}>")]
    UndeclaredParameter { component: String, param: String },
    #[error("Parameter <p:{param}> must be placed directly inside a component")]
    ParameterOutsideComponent { param: String },
    #[error("Template definition is missing its name")]
    MissingTemplateName,
    #[error("Template '{template}' declares parameter '{param}' more than once")]
    DuplicateTemplateParam { template: String, param: String },
    #[error("A parameter of template '{template}' is missing its name")]
    MissingParamName { template: String },

    // Schema errors
    #[error("<{component}> has no property '{property}'")]
    UndeclaredProperty { component: String, property: String },
    #[error("<{component}> does not accept properties")]
    PropertiesNotSupported { component: String },
    #[error("Property '{property}' of <{component}> expects a number, got '{value}'")]
    InvalidNumber {
        component: String,
        property: String,
        value: String,
    },
    #[error("Property '{property}' of <{component}> expects a boolean, got '{value}'")]
    InvalidBoolean {
        component: String,
        property: String,
        value: String,
    },
    #[error("Property '{property}' of <{component}> expects an identifier, got '{value}'")]
    InvalidIdentifier {
        component: String,
        property: String,
        value: String,
    },
    #[error(
        "Property '{property}' of <{component}> must be one of [{allowed}], got '{value}'"
    )]
    ValueNotInEnum {
        component: String,
        property: String,
        value: String,
        allowed: String,
    },
    #[error("Property '{property}' of <{component}> expects {expected}")]
    TypeMismatch {
        component: String,
        property: String,
        expected: &'static str,
    },
    #[error("Property '{property}' of <{component}> only accepts a binding expression")]
    BindingRequired { component: String, property: String },
    #[error("Unknown property type '{name}'")]
    UnknownPropertyType { name: String },
    #[error("Template '{template}' requires parameter '{param}'")]
    MissingTemplateParam { template: String, param: String },

    // Resolution errors
    #[error("Undefined template '{name}'")]
    UndefinedTemplate { name: String },
    #[error(
        "Template '{template}' references undeclared parameter '{param}'; expected one of [{expected}]"
    )]
    UnknownTemplateParam {
        template: String,
        param: String,
        expected: String,
    },
    #[error("No pipe handler found for '{name}'")]
    PipeNotFound { name: String },
    #[error("Pipe '{name}' failed: {reason}")]
    PipeFailed { name: String, reason: String },
    #[error("Template file for '{name}' not found; searched [{searched}]")]
    TemplateFileNotFound { name: String, searched: String },
    #[error("Failed to read template file '{path}': {details}")]
    TemplateFileUnreadable { path: String, details: String },
    #[error("Template file nesting exceeds {limit} levels while loading '{name}'")]
    TemplateDepthExceeded { name: String, limit: usize },
    #[error("Template file '{path}' does not define template '{name}'")]
    TemplateNotDefinedInFile { name: String, path: String },
    #[error("Invalid regular expression '{pattern}': {details}")]
    InvalidRegex { pattern: String, details: String },
    #[error("Value of '{property}' is not iterable")]
    NotIterable { property: String },

    // Render errors
    #[error("Template instance <{tag}> reached the render pass unexpanded")]
    UnexpandedInstance { tag: String },
    #[error("Node does not exist in the tree")]
    DanglingNode,
    #[error("Failed to write markup")]
    MarkupWriteFailure,
    #[error("{0}")]
    Message(&'static str),
}

impl ErrorKind {
    /// Classify this error into one of the [`ErrorCategory`] families.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnexpectedCloseTag { .. }
            | Self::MismatchedCloseTag { .. }
            | Self::UnclosedTag { .. }
            | Self::AttributesOnCloseTag { .. }
            | Self::MalformedTag
            | Self::MalformedAttribute { .. }
            | Self::DuplicateAttribute { .. }
            | Self::UnbalancedBinding
            | Self::InvalidBinding { .. }
            | Self::ContentNotAllowed { .. }
            | Self::TagInScalarParameter { .. }
            | Self::UnknownTag { .. }
            | Self::UndeclaredParameter { .. }
            | Self::ParameterOutsideComponent { .. }
            | Self::MissingTemplateName
            | Self::DuplicateTemplateParam { .. }
            | Self::MissingParamName { .. } => ErrorCategory::Parse,
            Self::UndeclaredProperty { .. }
            | Self::PropertiesNotSupported { .. }
            | Self::InvalidNumber { .. }
            | Self::InvalidBoolean { .. }
            | Self::InvalidIdentifier { .. }
            | Self::ValueNotInEnum { .. }
            | Self::TypeMismatch { .. }
            | Self::BindingRequired { .. }
            | Self::UnknownPropertyType { .. }
            | Self::MissingTemplateParam { .. } => ErrorCategory::Schema,
            Self::UndefinedTemplate { .. }
            | Self::UnknownTemplateParam { .. }
            | Self::PipeNotFound { .. }
            | Self::PipeFailed { .. }
            | Self::TemplateFileNotFound { .. }
            | Self::TemplateFileUnreadable { .. }
            | Self::TemplateDepthExceeded { .. }
            | Self::TemplateNotDefinedInFile { .. }
            | Self::InvalidRegex { .. }
            | Self::NotIterable { .. } => ErrorCategory::Resolution,
            Self::UnexpandedInstance { .. }
            | Self::DanglingNode
            | Self::MarkupWriteFailure
            | Self::Message(_) => ErrorCategory::Render,
        }
    }
}

impl From<&'static str> for ErrorKind {
    fn from(message: &'static str) -> Self {
        Self::Message(message)
    }
}

#[derive(Debug)]
enum ErrorContext {
    None,
    Location(SourceLocation),
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Location(loc) => {
                let SourceLocation { input, start, end } = loc;
                let input_len = input.len();
                if *start == input_len {
                    write!(f, " at end of input: ")?;
                } else {
                    let (line, column) = loc.line_and_column();
                    write!(f, " at position {} (line {line}, column {column}): ", start + 1)?;
                }

                let mut prefix_start = start.saturating_sub(15);
                prefix_start = adjust_char_boundary(input, prefix_start, false);
                if prefix_start > 0 {
                    write!(f, "\u{2026}")?;
                }
                write!(f, "{}", &input[prefix_start..*start])?;
                if end > start {
                    for c in input[*start..*end].chars() {
                        write!(f, "{c}\u{0332}")?;
                    }
                }
                let mut suffix_end = (*end + 15).min(input_len);
                suffix_end = adjust_char_boundary(input, suffix_end, true);
                if suffix_end < input_len {
                    write!(f, "{}", &input[*end..suffix_end])?;
                    write!(f, "\u{2026}")?;
                } else {
                    write!(f, "{}", &input[*end..])?;
                }
                Ok(())
            }
        }
    }
}

const fn adjust_char_boundary(input: &str, mut index: usize, forward: bool) -> usize {
    if forward {
        while index < input.len() && !input.is_char_boundary(index) {
            index += 1;
        }
    } else {
        while index > 0 && !input.is_char_boundary(index) {
            index -= 1;
        }
    }
    index
}

/// Trait for types that can provide error location information for
/// [`TemplateError`]
pub trait ErrorLocationProvider {
    /// Get the source location if available
    fn loc(&self) -> Option<&SourceLocation>;
}
