//! Read-only semantic model consumed by the resolver and the normalizer.
//!
//! Containers live in an append-only arena so parent back-references are plain
//! indices. Typed values mirror the compiler's value kinds one-to-one.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

// ————————————————————————————————————————————————————————————————————————————
// CONTAINER GRAPH
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) usize);

impl ContainerId {
    pub fn index(self) -> usize { self.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Namespace,
    Interface,
}

#[derive(Debug, Clone)]
pub struct Container {
    pub name: String,
    pub kind: ContainerKind,
    pub operations: Vec<String>,
    pub namespaces: Vec<ContainerId>,   // declaration order
    pub interfaces: Vec<ContainerId>,   // declaration order
    pub parent: Option<ContainerId>,
    pub service: bool,
    pub client: bool,                   // explicit client boundary
}

impl Container {
    fn new(name: impl Into<String>, kind: ContainerKind, parent: Option<ContainerId>) -> Self {
        Self {
            name: name.into(),
            kind,
            operations: Vec::new(),
            namespaces: Vec::new(),
            interfaces: Vec::new(),
            parent,
            service: false,
            client: false,
        }
    }

    /// No operations and no nested namespaces/interfaces.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.namespaces.is_empty() && self.interfaces.is_empty()
    }
}

/// Arena of containers. Children can only be appended under an existing
/// parent, so the nesting is always a finite tree rooted at `root()`.
#[derive(Debug, Clone)]
pub struct SemanticGraph {
    containers: Vec<Container>,
}

impl SemanticGraph {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self { containers: vec![Container::new(root_name, ContainerKind::Namespace, None)] }
    }

    pub fn root(&self) -> ContainerId { ContainerId(0) }
    pub fn len(&self) -> usize { self.containers.len() }
    pub fn is_empty(&self) -> bool { self.containers.is_empty() }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(id.0)
    }

    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &Container)> {
        self.containers.iter().enumerate().map(|(i, c)| (ContainerId(i), c))
    }

    /// # Panics
    ///
    /// If `parent` does not belong to this graph. The graph is left unchanged.
    pub fn add_namespace(&mut self, parent: ContainerId, name: impl Into<String>) -> ContainerId {
        self.add_child(parent, name, ContainerKind::Namespace)
    }

    /// # Panics
    ///
    /// Same as [`SemanticGraph::add_namespace`].
    pub fn add_interface(&mut self, parent: ContainerId, name: impl Into<String>) -> ContainerId {
        self.add_child(parent, name, ContainerKind::Interface)
    }

    // add_operation / mark_* panic on an id from another graph, like slice indexing
    pub fn add_operation(&mut self, container: ContainerId, name: impl Into<String>) {
        self.container_mut(container).operations.push(name.into());
    }

    pub fn mark_service(&mut self, id: ContainerId) {
        self.container_mut(id).service = true;
    }

    pub fn mark_client(&mut self, id: ContainerId) {
        self.container_mut(id).client = true;
    }

    /// Walks parent links upwards, nearest first. Does not yield `id` itself.
    pub fn ancestors(&self, id: ContainerId) -> impl Iterator<Item = ContainerId> + '_ {
        std::iter::successors(self.container(id).and_then(|c| c.parent), move |p| {
            self.container(*p).and_then(|c| c.parent)
        })
    }

    fn container_mut(&mut self, id: ContainerId) -> &mut Container {
        let len = self.containers.len();
        match self.containers.get_mut(id.0) {
            Some(c) => c,
            None => panic!("container {id:?} is not part of this graph ({len} containers)"),
        }
    }

    fn add_child(&mut self, parent: ContainerId, name: impl Into<String>, kind: ContainerKind) -> ContainerId {
        let id = ContainerId(self.containers.len());
        // link into the parent first so a foreign id cannot leave an orphan behind
        let slot = self.container_mut(parent);
        match kind {
            ContainerKind::Namespace => slot.namespaces.push(id),
            ContainerKind::Interface => slot.interfaces.push(id),
        }
        self.containers.push(Container::new(name, kind, Some(parent)));
        id
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPED VALUES
// ————————————————————————————————————————————————————————————————————————————

/// Numeric literal. Integers stay exact; floats keep the literal's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Integer(i64),
    Float(OrderedFloat<f64>),
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self { Numeric::Integer(n) }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self { Numeric::Float(OrderedFloat(n)) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    String(String),
    Number(Numeric),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EnumValue>,
}

/// A literal or constant value as tracked by the semantic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypedValue {
    StringLiteral { value: String },
    BooleanLiteral { value: bool },
    Null,
    NumericLiteral { value: Numeric },
    EnumMemberReference { member: EnumMember },
    ArrayLiteral { values: Vec<TypedValue> },
    ObjectLiteral { properties: IndexMap<String, TypedValue> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<TypedValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDecl {
    pub name: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDecl>,   // declaration order
}
