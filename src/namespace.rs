//! Named values with nested-group semantics
//!
//! A `Namespace` refers to a space of nameable things, here the ambient data
//! sources visible to binding expressions, which can be set either globally
//! or local to a nested group using an undo stack. Iteration components open a
//! group per repetition so that loop variables disappear (and shadowed values
//! reappear) when the repetition ends.

use rapidhash::{RapidHashMap, RapidHashSet};

use crate::types::{ErrorKind, TemplateError};

/// Make it easier to switch between different hash backends.
pub type KeyMap<K, V> = RapidHashMap<K, V>;
/// Alias for the default hash set.
pub type KeySet<K> = RapidHashSet<K>;
/// Mapping type alias
pub type Mapping<V> = KeyMap<String, V>;

/// A `Namespace` implements scoped definitions with begin/end group semantics.
///
/// - `get` and local `set` are O(1)
/// - global `set` is O(depth), where depth is the group nesting level
#[derive(Debug, Clone)]
pub struct Namespace<V: Clone> {
    /// Current mapping. Local changes modify it directly, with undos recorded
    /// on the stack.
    current: Mapping<V>,
    /// Stack of undo maps for nested groups. The stored value is the previous
    /// value of a name (or `None` to indicate deletion) to restore on pop.
    undef_stack: Vec<KeyMap<String, Option<V>>>,
}

impl<V: Clone> Default for Namespace<V> {
    fn default() -> Self {
        Self {
            current: Mapping::default(),
            undef_stack: Vec::new(),
        }
    }
}

impl<V: Clone> Namespace<V> {
    /// Create an empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new nested group, affecting future local `set`s.
    pub fn begin_group(&mut self) {
        self.undef_stack.push(KeyMap::default());
    }

    fn restore_changes<I>(&mut self, undefs: I)
    where
        I: IntoIterator<Item = (String, Option<V>)>,
    {
        for (name, previous) in undefs {
            match previous {
                Some(v) => {
                    self.current.insert(name, v);
                }
                None => {
                    self.current.remove(&name);
                }
            }
        }
    }

    /// End current nested group, restoring values before the group began.
    pub fn end_group(&mut self) -> Result<(), TemplateError> {
        let undefs = self.undef_stack.pop().ok_or_else(|| {
            TemplateError::new(ErrorKind::Message(
                "Unbalanced namespace group: attempt to pop the global level",
            ))
        })?;
        self.restore_changes(undefs);
        Ok(())
    }

    /// Ends all currently nested groups (if any), restoring values before the
    /// groups began.
    pub fn end_groups(&mut self) -> usize {
        let mut count = 0;
        while let Some(undefs) = self.undef_stack.pop() {
            self.restore_changes(undefs);
            count += 1;
        }
        count
    }

    /// Current nesting depth; zero at the global level.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.undef_stack.len()
    }

    /// Detect whether `name` has a definition.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.current.contains_key(name)
    }

    /// Get the current value of a name, or `None` if there is no value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&V> {
        self.current.get(name)
    }

    /// Names currently defined, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.current.keys().map(String::as_str)
    }

    /// Set the current value of a name, and optionally set it globally too.
    ///
    /// Local `set` sets the current value and (when appropriate) adds an undo
    /// operation to the undo stack. Global `set` may change the undo operation
    /// at every level, so takes time linear in the number of nested groups.
    /// A value of `None` means to delete existing definitions.
    pub fn set(&mut self, name: &str, value: Option<V>, global: bool) {
        if global {
            // Equivalent to setting in every group: drop any scheduled undo
            // for the name, then record the new value as the undo target.
            for level in &mut self.undef_stack {
                level.remove(name);
            }
            if let Some(top) = self.undef_stack.last_mut() {
                top.insert(name.to_owned(), value.clone());
            }
        } else if let Some(top) = self.undef_stack.last_mut()
            && !top.contains_key(name)
        {
            // An older undo already holds the correct value to restore.
            let prev = self.current.get(name).cloned();
            top.insert(name.to_owned(), prev);
        }

        match value {
            Some(v) => {
                self.current.insert(name.to_owned(), v);
            }
            None => {
                self.current.remove(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_set_is_undone() {
        let mut ns = Namespace::new();
        ns.set("item", Some(1), false);
        ns.begin_group();
        ns.set("item", Some(2), false);
        ns.set("index", Some(0), false);
        assert_eq!(ns.get("item"), Some(&2));
        ns.end_group().unwrap();
        assert_eq!(ns.get("item"), Some(&1));
        assert!(!ns.has("index"));
    }

    #[test]
    fn test_global_set_survives_groups() {
        let mut ns = Namespace::new();
        ns.begin_group();
        ns.begin_group();
        ns.set("page", Some("home"), true);
        assert_eq!(ns.end_groups(), 2);
        assert_eq!(ns.get("page"), Some(&"home"));
    }

    #[test]
    fn test_unbalanced_end_group_fails() {
        let mut ns: Namespace<u8> = Namespace::new();
        assert!(ns.end_group().is_err());
        assert_eq!(ns.depth(), 0);
    }
}
