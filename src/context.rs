//! Per-request engine state

use alloc::rc::Rc;
use core::fmt;

use regex::Regex;
use tracing::{debug, warn};

use crate::components;
use crate::define_component::{ComponentDefSpec, ComponentSpec};
use crate::namespace::{KeyMap, KeySet, Namespace};
use crate::pipes::PipeRegistry;
use crate::template::{Asset, FsLoader, TemplateDef, TemplateLoader};
use crate::tree::{ComponentKind, Tree};
use crate::types::{ErrorKind, Settings, TemplateError};
use crate::value::Value;

/// Everything one parse-and-render request works with.
///
/// The Context is the registry of component kinds and templates, the feed of
/// ambient data, the pipe table, and the owner of the node arena. Create one
/// per request and drop it afterwards; nothing is shared between contexts.
pub struct Context {
    /// Engine configuration.
    pub settings: Settings,
    /// Tag name (after `c:`) to component kind. Collaborators may add
    /// entries before parsing starts.
    pub tags: KeyMap<String, ComponentKind>,
    /// Behaviour of each component kind.
    pub components: KeyMap<ComponentKind, ComponentSpec>,
    /// Registered templates, first definition wins.
    pub templates: KeyMap<String, Rc<TemplateDef>>,
    /// Pipes available to binding expressions.
    pub pipes: PipeRegistry,
    /// Ambient named data sources, scoped by the iteration components.
    pub data: Namespace<Value>,
    /// Node arena.
    pub tree: Tree,
    assets: Vec<Asset>,
    asset_names: KeySet<String>,
    counters: KeyMap<String, usize>,
    regexes: KeyMap<String, Regex>,
    loader: Box<dyn TemplateLoader>,
    /// Template names whose files are currently being loaded, innermost last.
    pub(crate) loading: Vec<String>,
}

impl Context {
    /// A context with the built-in components and the filesystem loader.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let mut ctx = Self {
            settings,
            tags: KeyMap::default(),
            components: KeyMap::default(),
            templates: KeyMap::default(),
            pipes: PipeRegistry::default(),
            data: Namespace::new(),
            tree: Tree::default(),
            assets: Vec::new(),
            asset_names: KeySet::default(),
            counters: KeyMap::default(),
            regexes: KeyMap::default(),
            loader: Box::new(FsLoader),
            loading: Vec::new(),
        };
        components::define_builtins(&mut ctx);
        ctx
    }

    /// Replace the template-file loader.
    #[must_use]
    pub fn with_loader<L: TemplateLoader + 'static>(mut self, loader: L) -> Self {
        self.set_loader(loader);
        self
    }

    /// Replace the template-file loader in place.
    pub fn set_loader<L: TemplateLoader + 'static>(&mut self, loader: L) {
        self.loader = Box::new(loader);
    }

    /// The template-file loader.
    #[must_use]
    pub fn loader(&self) -> &dyn TemplateLoader {
        self.loader.as_ref()
    }

    /// Register a component kind under its tag names.
    pub fn define_component(&mut self, spec: ComponentDefSpec) {
        for name in spec.names {
            self.tags.insert((*name).to_owned(), spec.kind);
        }
        self.components.insert(spec.kind, spec.into());
    }

    /// Map an additional tag name onto an already registered kind.
    pub fn register_tag(&mut self, name: &str, kind: ComponentKind) {
        self.tags.insert(name.to_owned(), kind);
    }

    /// The component kind a `c:` tag name resolves to, if registered.
    #[must_use]
    pub fn resolve_tag(&self, name: &str) -> Option<ComponentKind> {
        self.tags.get(name).copied()
    }

    /// Behaviour of a component kind.
    pub fn component(&self, kind: ComponentKind) -> Result<&ComponentSpec, TemplateError> {
        self.components.get(&kind).ok_or_else(|| {
            TemplateError::new(ErrorKind::UnknownTag {
                tag: kind.to_string(),
            })
        })
    }

    /// Register a template. Returns `false`, leaving the existing definition
    /// in place, when the name is already taken.
    pub fn define_template(&mut self, def: TemplateDef) -> bool {
        if self.templates.contains_key(&def.name) {
            warn!(template = %def.name, "template already defined, keeping the first definition");
            return false;
        }
        debug!(template = %def.name, params = def.params.len(), "template defined");
        self.templates.insert(def.name.clone(), Rc::new(def));
        true
    }

    /// A registered template.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<Rc<TemplateDef>> {
        self.templates.get(name).cloned()
    }

    /// Publish a named data source for bindings to read.
    pub fn set_data<V: Into<Value>>(&mut self, name: &str, value: V) {
        self.data.set(name, Some(value.into()), true);
    }

    /// Read a named data source.
    #[must_use]
    pub fn data(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Next unique identifier for `kind`: `script1`, `script2`, ...
    pub fn auto_id(&mut self, kind: &str) -> String {
        let counter = self.counters.entry(kind.to_owned()).or_insert(0);
        *counter += 1;
        format!("{kind}{counter}")
    }

    /// Add a page asset unless one with the same name was already added.
    pub fn add_asset(&mut self, asset: Asset) -> bool {
        if !self.asset_names.insert(asset.name.clone()) {
            return false;
        }
        self.assets.push(asset);
        true
    }

    /// Hoisted page assets in the order they were first added.
    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Compile `pattern` once per context.
    pub fn regex(&mut self, pattern: &str) -> Result<Regex, TemplateError> {
        if let Some(re) = self.regexes.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern).map_err(|err| {
            TemplateError::new(ErrorKind::InvalidRegex {
                pattern: pattern.to_owned(),
                details: err.to_string(),
            })
        })?;
        self.regexes.insert(pattern.to_owned(), re.clone());
        Ok(re)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("tags", &self.tags.len())
            .field("templates", &self.templates.len())
            .field("nodes", &self.tree.len())
            .field("assets", &self.assets.len())
            .finish_non_exhaustive()
    }
}
