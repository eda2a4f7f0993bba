use std::path::PathBuf;

use bon::bon;

/// Engine configuration shared by the parser, the template engine and the
/// render pass.
///
/// All fields are public so they can be adjusted directly, or the generated
/// builder (`Settings::builder()`) can be used to construct a value where
/// every unspecified option takes its default.
///
/// # Examples
///
/// ```rust
/// use tagtree::Settings;
///
/// let settings = Settings::builder()
///     .strict(true)
///     .condense_whitespace(true)
///     .build();
/// assert!(settings.strict);
/// assert_eq!(settings.template_extension, "tpl");
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    /// Fail with an unknown-tag error for unresolved component tags instead
    /// of looking for a template file.
    pub strict: bool,
    /// Collapse runs of whitespace inside literal text to a single space.
    pub condense_whitespace: bool,
    /// Ordered list of directories consulted by template-file discovery.
    pub template_dirs: Vec<PathBuf>,
    /// File extension (without the dot) of template files.
    pub template_extension: String,
    /// HTML-escape binding output written into literal text.
    pub escape_bindings: bool,
    /// Maximum nesting of template files loading other template files.
    pub max_template_depth: usize,
}

#[bon]
impl Settings {
    /// Creates a new [`Settings`] instance from optional configuration values.
    ///
    /// # Default Values
    /// - `strict`: `false`
    /// - `condense_whitespace`: `false`
    /// - `template_dirs`: empty
    /// - `template_extension`: `"tpl"`
    /// - `escape_bindings`: `true`
    /// - `max_template_depth`: `32`
    #[must_use]
    #[builder]
    pub fn new(
        /// Fail on unknown component tags.
        strict: Option<bool>,
        /// Collapse whitespace in literal text.
        condense_whitespace: Option<bool>,
        /// Template search path.
        template_dirs: Option<Vec<PathBuf>>,
        /// Template file extension.
        #[builder(into)]
        template_extension: Option<String>,
        /// Escape binding output.
        escape_bindings: Option<bool>,
        /// Template file nesting limit.
        max_template_depth: Option<usize>,
    ) -> Self {
        Self {
            strict: strict.unwrap_or(false),
            condense_whitespace: condense_whitespace.unwrap_or(false),
            template_dirs: template_dirs.unwrap_or_default(),
            template_extension: template_extension.unwrap_or_else(|| "tpl".to_owned()),
            escape_bindings: escape_bindings.unwrap_or(true),
            max_template_depth: max_template_depth.unwrap_or(32),
        }
    }

    /// Candidate file paths for a template name, in search order.
    #[must_use]
    pub fn template_candidates(&self, name: &str) -> Vec<PathBuf> {
        self.template_dirs
            .iter()
            .map(|dir| dir.join(format!("{name}.{}", self.template_extension)))
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}
