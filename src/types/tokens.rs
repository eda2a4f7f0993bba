use core::fmt;

use strum::{AsRefStr, Display, EnumString};

use crate::types::{ErrorLocationProvider, SourceLocation};

/// The three tag namespaces recognised by the lexer.
///
/// Everything else that looks like a tag (plain HTML) is literal content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
pub enum TagNamespace {
    /// `<c:Name>`: a registered component, or a template resolved by name.
    #[strum(serialize = "c")]
    Component,
    /// `<p:name>`: a property of the enclosing component expressed as a tag.
    #[strum(serialize = "p")]
    Parameter,
    /// `<t:Name>`: an explicit template instantiation.
    #[strum(serialize = "t")]
    Instance,
}

/// Whether a tag opens, closes, or opens-and-closes an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagForm {
    /// `<ns:name ...>`
    Open,
    /// `</ns:name>`
    Close,
    /// `<ns:name .../>`
    SelfClosing,
}

/// A `name="value"` pair read from a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name exactly as written.
    pub name: String,
    /// Unquoted attribute value; `"true"` for a valueless attribute.
    pub value: String,
    /// Span of the whole attribute.
    pub loc: SourceLocation,
}

/// A recognised tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Namespace prefix.
    pub namespace: TagNamespace,
    /// Local name after the prefix.
    pub name: String,
    /// Opening, closing or self-closing.
    pub form: TagForm,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
}

impl Tag {
    /// `ns:name` as written in markup.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }
}

/// Payload of a [`Token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of literal text between tags.
    Text(String),
    /// A tag in one of the engine namespaces.
    Tag(Tag),
    /// End of input.
    Eof,
}

/// A lexed unit of markup together with its source span.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// What was lexed.
    pub kind: TokenKind,
    /// Where it was lexed from.
    pub loc: SourceLocation,
}

impl Token {
    /// Create a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, loc: SourceLocation) -> Self {
        Self { kind, loc }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Text(text) => write!(f, "Text({text:?})@{}", self.loc.start),
            TokenKind::Eof => write!(f, "EOF@{}", self.loc.start),
            TokenKind::Tag(tag) => write!(
                f,
                "Tag({:?} {} {:?})@{}",
                tag.form,
                tag.qualified_name(),
                tag.attributes
                    .iter()
                    .map(|a| (a.name.as_str(), a.value.as_str()))
                    .collect::<Vec<_>>(),
                self.loc.start
            ),
        }
    }
}

impl ErrorLocationProvider for Token {
    fn loc(&self) -> Option<&SourceLocation> {
        Some(&self.loc)
    }
}

impl ErrorLocationProvider for Attribute {
    fn loc(&self) -> Option<&SourceLocation> {
        Some(&self.loc)
    }
}
