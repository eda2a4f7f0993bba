//! Arena-backed component tree.
//!
//! Nodes live in a [`Tree`] owned by the [`Context`](crate::Context) and refer
//! to each other through [`NodeId`] handles. A node owns its children and the
//! parameter nodes stored in its sub-content properties; the `parent` field is
//! a navigation aid only and is cleared whenever a node is detached.

use alloc::rc::Rc;
use core::{fmt, mem};

use strum::AsRefStr;

use crate::binding::Binding;
use crate::namespace::KeyMap;
use crate::schema::Schema;
use crate::types::{ErrorKind, ErrorLocationProvider, SourceLocation, TemplateError};
use crate::value::Value;

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Slot index inside the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Which behaviour a node has.
///
/// The built-in kinds cover the document structure and the control
/// components; `Custom` kinds are registered by collaborators through
/// [`Context::define_component`](crate::Context::define_component).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
pub enum ComponentKind {
    /// Document root and expanded template bodies: renders its children.
    Fragment,
    /// Literal text, possibly bound.
    Literal,
    /// A `<p:name>` parameter node holding sub-content.
    Param,
    /// A template instance placeholder awaiting expansion.
    Instance,
    /// A template definition.
    Template,
    /// Conditional rendering.
    If,
    /// Iteration over a data source.
    For,
    /// Iteration over a data source or a fixed count.
    Repeat,
    /// Property injection into descendants.
    Apply,
    /// Output of hoisted page assets.
    Assets,
    /// A component supplied by a collaborator.
    Custom(&'static str),
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => f.write_str(name),
            other => f.write_str(other.as_ref()),
        }
    }
}

/// A component node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Tag name as written (or the template name for expanded bodies).
    pub tag: String,
    /// Behaviour.
    pub kind: ComponentKind,
    /// Ordered owned children.
    pub children: Vec<NodeId>,
    /// Current container, if attached.
    pub parent: Option<NodeId>,
    /// Property schema of the node's kind.
    pub schema: Rc<Schema>,
    /// Constant property values.
    pub props: KeyMap<String, Value>,
    /// Pending bindings, keyed by property name.
    pub bindings: KeyMap<String, Binding>,
    /// Where the node was parsed from.
    pub loc: Option<SourceLocation>,
}

impl Node {
    /// A detached node with no properties.
    pub fn new<S: Into<String>>(tag: S, kind: ComponentKind, schema: Rc<Schema>) -> Self {
        Self {
            tag: tag.into(),
            kind,
            children: Vec::new(),
            parent: None,
            schema,
            props: KeyMap::default(),
            bindings: KeyMap::default(),
            loc: None,
        }
    }

    /// Attach a source location.
    #[must_use]
    pub fn with_loc(mut self, loc: Option<SourceLocation>) -> Self {
        self.loc = loc;
        self
    }

    /// Node ids held in the sub-content properties.
    #[must_use]
    pub fn content_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for value in self.props.values() {
            collect_content(value, &mut ids);
        }
        ids.sort_unstable();
        ids
    }
}

impl ErrorLocationProvider for Node {
    fn loc(&self) -> Option<&SourceLocation> {
        self.loc.as_ref()
    }
}

fn collect_content(value: &Value, out: &mut Vec<NodeId>) {
    match value {
        Value::Content(id) => out.push(*id),
        Value::List(items) => items.iter().for_each(|v| collect_content(v, out)),
        Value::Map(map) => map.values().for_each(|v| collect_content(v, out)),
        _ => {}
    }
}

/// The node arena.
#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
}

fn dangling() -> TemplateError {
    TemplateError::new(ErrorKind::DanglingNode)
}

impl Tree {
    /// Store a node and return its handle.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(node);
            NodeId(index)
        } else {
            self.slots.push(Some(node));
            NodeId(self.slots.len() - 1)
        }
    }

    fn take_slot(&mut self, id: NodeId) -> Result<Node, TemplateError> {
        let node = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(dangling)?;
        self.free.push(id.0);
        Ok(node)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the arena holds no live node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> Result<&Node, TemplateError> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(dangling)
    }

    /// Mutably borrow a node.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, TemplateError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(dangling)
    }

    /// Children of a node, cloned so the tree can be mutated while iterating.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, TemplateError> {
        Ok(self.get(id)?.children.clone())
    }

    /// Append `child` to `parent`, detaching it from any previous container.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TemplateError> {
        self.detach(child)?;
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Record `owner` as the container of a parameter node stored in one of
    /// its properties.
    pub fn adopt(&mut self, owner: NodeId, param: NodeId) -> Result<(), TemplateError> {
        self.detach(param)?;
        self.get_mut(param)?.parent = Some(owner);
        Ok(())
    }

    /// Remove a node from its container's child list and clear its parent.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TemplateError> {
        let Some(parent) = self.get_mut(id)?.parent.take() else {
            return Ok(());
        };
        let siblings = &mut self.get_mut(parent)?.children;
        if let Some(pos) = siblings.iter().position(|c| *c == id) {
            siblings.remove(pos);
        }
        Ok(())
    }

    /// Move the replacement's data into the slot of `target`, keeping the
    /// target's position in its container. The target's previous subtree is
    /// freed and `replacement` stops being a valid handle.
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) -> Result<(), TemplateError> {
        self.detach(replacement)?;
        let mut data = self.take_slot(replacement)?;

        let old = self
            .slots
            .get_mut(target.0)
            .and_then(Option::take)
            .ok_or_else(dangling)?;
        for owned in old.children.iter().chain(old.content_ids().iter()) {
            self.free_subtree(*owned)?;
        }

        data.parent = old.parent;
        let owned: Vec<NodeId> = data
            .children
            .iter()
            .copied()
            .chain(data.content_ids())
            .collect();
        self.slots[target.0] = Some(data);
        for id in owned {
            self.get_mut(id)?.parent = Some(target);
        }
        Ok(())
    }

    /// Copy a node and everything it owns into fresh slots. The copy is
    /// detached and shares no state with the original.
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId, TemplateError> {
        let mut node = self.get(id)?.clone();
        node.parent = None;
        let children = mem::take(&mut node.children);
        let props = mem::take(&mut node.props);
        let copy = self.alloc(node);

        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.get_mut(child_copy)?.parent = Some(copy);
            self.get_mut(copy)?.children.push(child_copy);
        }
        let mut cloned_props = KeyMap::default();
        for (name, value) in props {
            let value = self.clone_value(&value, copy)?;
            cloned_props.insert(name, value);
        }
        self.get_mut(copy)?.props = cloned_props;
        Ok(copy)
    }

    /// Clone a value, deep-cloning any subtrees it references and recording
    /// `owner` as their container.
    pub fn clone_value(&mut self, value: &Value, owner: NodeId) -> Result<Value, TemplateError> {
        Ok(match value {
            Value::Content(id) => {
                let copy = self.deep_clone(*id)?;
                self.get_mut(copy)?.parent = Some(owner);
                Value::Content(copy)
            }
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|v| self.clone_value(v, owner))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), self.clone_value(v, owner)?)))
                    .collect::<Result<_, TemplateError>>()?,
            ),
            other => other.clone(),
        })
    }

    /// Detach a node and free it with everything it owns.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TemplateError> {
        self.detach(id)?;
        self.free_subtree(id)
    }

    fn free_subtree(&mut self, id: NodeId) -> Result<(), TemplateError> {
        let node = self.take_slot(id)?;
        for owned in node.children.iter().chain(node.content_ids().iter()) {
            self.free_subtree(*owned)?;
        }
        Ok(())
    }

    /// All nodes below `root` in document order: children first-to-last,
    /// with each node's parameter subtrees visited before its children.
    pub fn descendants(&self, root: NodeId) -> Result<Vec<NodeId>, TemplateError> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id != root {
                out.push(id);
            }
            let node = self.get(id)?;
            stack.extend(node.children.iter().rev());
            stack.extend(node.content_ids().iter().rev());
        }
        Ok(out)
    }
}
