//! Core type definitions shared by every stage of the engine

mod source_location;
pub use source_location::SourceLocation;

mod error;
pub use error::{ErrorCategory, ErrorKind, ErrorLocationProvider, TemplateError};

mod tokens;
pub use tokens::{Attribute, Tag, TagForm, TagNamespace, Token, TokenKind};

mod settings;
pub use settings::Settings;
