//! tagtree - a markup-driven component-tree templating engine
//!
//! Markup containing component tags (`<c:Name>`), parameter tags
//! (`<p:name>`) and template-instance tags (`<t:Name>`) is parsed into a tree
//! of typed components. Templates declared with `<c:Template>` are expanded
//! in place when their instances are parsed, and `{source.path|pipe}` binding
//! expressions are resolved against ambient data every time the tree is
//! rendered. Inline CSS or script that needs a literal brace directly
//! followed by text writes it doubled: `p{{color:red}`.
//!
//! ```rust
//! use tagtree::{Context, render_to_string};
//! use serde_json::json;
//!
//! let mut ctx = Context::default();
//! ctx.set_data("page", json!({"title": "Hello"}));
//! let html = render_to_string(
//!     &mut ctx,
//!     r#"<c:Template name="Card"><p:param name="title" default="Untitled"/><h1>{title}</h1></c:Template><c:Card title="{page.title}"/>"#,
//! )
//! .unwrap();
//! assert_eq!(html, "<h1>Hello</h1>");
//! ```
#![warn(missing_docs)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::str_to_string)]
#![warn(clippy::non_ascii_literal)]
#![warn(clippy::pointer_format)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::absolute_paths)]
#![warn(clippy::panic)]
#![warn(clippy::expect_used)]
#![warn(clippy::unwrap_in_result)]
#![warn(clippy::if_then_some_else_none)]
#![warn(clippy::unused_trait_names)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::impl_trait_in_params)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::unimplemented)]
#![warn(clippy::return_and_then)]
#![warn(clippy::needless_raw_strings)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::rc_buffer)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::map_with_unused_argument_over_ranges)]
#![warn(clippy::missing_asserts_for_indexing)]
#![warn(clippy::separated_literal_suffix)]
#![warn(clippy::ref_patterns)]
// Not sure
#![allow(clippy::indexing_slicing)]
#![allow(clippy::string_slice)]
#![allow(clippy::pub_use)]
// clippy exceptions
#![allow(clippy::float_cmp)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::default_numeric_fallback)]
#![allow(clippy::single_call_fn)]

extern crate alloc;
/// Binding expressions and their evaluation.
pub mod binding;
pub mod components;
pub mod context;
pub mod core;
pub mod data_source;
pub mod define_component;
pub mod lexer;
pub mod namespace;
/// Markup parsing into component trees.
pub mod parser;
pub mod pipes;
pub mod render;
pub mod schema;
pub mod template;
pub mod tree;
pub mod types;
pub mod utils;
pub mod value;

/// Per-request engine state: component and template registries, pipes,
/// ambient data and the node arena.
///
/// # Examples
///
/// ```rust
/// use tagtree::Context;
///
/// let mut ctx = Context::default();
/// ctx.set_data("user", serde_json::json!({"name": "Ada"}));
/// // Context is now ready with the built-in components
/// ```
pub use crate::context::Context;

/// Parses and renders markup, returning the output as a string.
///
/// Errors carry the offending span when one is known:
/// ```rust
/// use tagtree::{Context, render_to_string};
///
/// let mut ctx = Context::default();
/// match render_to_string(&mut ctx, "<c:If the=\"{x}\">") {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error at position {}: {}", e.position.unwrap_or(0), e),
/// }
/// ```
pub use crate::core::render_to_string;

/// Parse markup into a tree without rendering it.
pub use crate::core::parse;

/// Parse markup under an existing node.
pub use crate::core::parse_under;

/// Render a parsed tree into any `fmt::Write` sink.
pub use crate::core::render;

/// Render a parsed tree into a string.
pub use crate::core::render_tree_to_string;

pub use crate::data_source::{DataSource, RecordSource};
pub use crate::define_component::{ComponentDefSpec, ComponentSpec, Props};
pub use crate::pipes::{PipeFallback, PipeRegistry};
pub use crate::schema::{PropSpec, PropType, Schema};
pub use crate::template::{Asset, AssetKind, FsLoader, MemoryLoader, TemplateDef, TemplateLoader};
pub use crate::tree::{ComponentKind, Node, NodeId, Tree};
pub use crate::types::{ErrorCategory, ErrorKind, Settings, SourceLocation, TemplateError};
pub use crate::value::Value;
