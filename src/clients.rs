//! Client nodes: which namespaces/interfaces become generated client objects.
//!
//! A `ClientTree` borrows the semantic graph read-only and indexes every client
//! by the container it came from, so the resolver can find already-built
//! clients by identity instead of rebuilding them.
use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::semantic::{Container, ContainerId, SemanticGraph};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub container: ContainerId,
    pub parent: Option<ClientId>,   // None for roots
}

/// Decides whether a nested namespace/interface is promoted to a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PromotionRule {
    /// every nested namespace and interface, empty ones included
    #[default]
    AllNested,
    /// only containers with operations or nested children, or marked service/client
    NonEmpty,
}

impl PromotionRule {
    pub fn qualifies(self, container: &Container) -> bool {
        match self {
            PromotionRule::AllNested => true,
            PromotionRule::NonEmpty => {
                !container.is_empty() || container.service || container.client
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("client at position {position} carries id {found:?}")]
    IdMismatch { position: usize, found: ClientId },
    #[error("client `{client}` refers to container {container:?} which is not in the graph")]
    UnknownContainer { client: String, container: ContainerId },
    #[error("container {container:?} has more than one client (`{first}` and `{second}`)")]
    DuplicateClient { container: ContainerId, first: String, second: String },
    #[error("client `{client}` has parent {parent:?} which is not a client in this tree")]
    DanglingParent { client: String, parent: ClientId },
}

#[derive(Debug, Clone)]
pub struct ClientTree<'g> {
    pub(crate) graph: &'g SemanticGraph,
    pub(crate) rule: PromotionRule,
    pub(crate) clients: Vec<Client>,
    pub(crate) by_container: HashMap<ContainerId, ClientId>,
}

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

impl<'g> ClientTree<'g> {
    /// Promote containers to clients, breadth-first from the service roots.
    ///
    /// Roots are the `service` containers with no `service` ancestor; a graph
    /// with no service marker has its root container as the single root.
    pub fn build(graph: &'g SemanticGraph, rule: PromotionRule) -> Self {
        let mut tree = ClientTree {
            graph,
            rule,
            clients: Vec::new(),
            by_container: HashMap::new(),
        };

        let mut roots: Vec<ContainerId> = graph
            .containers()
            .filter(|(id, c)| {
                c.service && !graph.ancestors(*id).any(|a| graph.container(a).is_some_and(|p| p.service))
            })
            .map(|(id, _)| id)
            .collect();
        if roots.is_empty() {
            roots.push(graph.root());
        }

        let mut queue = VecDeque::new();
        for root in roots {
            if let Some(id) = tree.push(root, None) {
                queue.push_back(id);
            }
        }

        while let Some(parent) = queue.pop_front() {
            let Some(container) = graph.container(tree.clients[parent.0].container) else { continue };
            for &child in container.namespaces.iter().chain(&container.interfaces) {
                let Some(c) = graph.container(child) else { continue };
                if !rule.qualifies(c) {
                    tracing::trace!(container = %c.name, "not promoted to a client");
                    continue;
                }
                if let Some(id) = tree.push(child, Some(parent)) {
                    queue.push_back(id);
                }
            }
        }

        tracing::debug!(clients = tree.clients.len(), ?rule, "built client tree");
        tree
    }

    /// Adopt client nodes built elsewhere. Ids must be positional and every
    /// container may back at most one client.
    pub fn from_parts(
        graph: &'g SemanticGraph,
        rule: PromotionRule,
        clients: Vec<Client>,
    ) -> Result<Self, BuildError> {
        let mut by_container = HashMap::with_capacity(clients.len());
        for (position, client) in clients.iter().enumerate() {
            if client.id != ClientId(position) {
                return Err(BuildError::IdMismatch { position, found: client.id });
            }
            if graph.container(client.container).is_none() {
                return Err(BuildError::UnknownContainer {
                    client: client.name.clone(),
                    container: client.container,
                });
            }
            if let Some(parent) = client.parent {
                if parent.0 >= clients.len() || parent == client.id {
                    return Err(BuildError::DanglingParent { client: client.name.clone(), parent });
                }
            }
            if let Some(prev) = by_container.insert(client.container, client.id) {
                return Err(BuildError::DuplicateClient {
                    container: client.container,
                    first: clients[prev.0].name.clone(),
                    second: client.name.clone(),
                });
            }
        }
        Ok(ClientTree { graph, rule, clients, by_container })
    }

    fn push(&mut self, container: ContainerId, parent: Option<ClientId>) -> Option<ClientId> {
        let name = self.graph.container(container)?.name.clone();
        let id = ClientId(self.clients.len());
        self.clients.push(Client { id, name, container, parent });
        self.by_container.insert(container, id);
        Some(id)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOOKUP
// ————————————————————————————————————————————————————————————————————————————

impl<'g> ClientTree<'g> {
    pub fn graph(&self) -> &'g SemanticGraph { self.graph }
    pub fn rule(&self) -> PromotionRule { self.rule }
    pub fn len(&self) -> usize { self.clients.len() }
    pub fn is_empty(&self) -> bool { self.clients.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Client> { self.clients.iter() }

    pub fn roots(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter().filter(|c| c.parent.is_none())
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id.0)
    }

    pub fn client_for(&self, container: ContainerId) -> Option<&Client> {
        self.by_container.get(&container).and_then(|id| self.client(*id))
    }

    pub fn parent(&self, id: ClientId) -> Option<&Client> {
        self.client(id)?.parent.and_then(|p| self.client(p))
    }

    /// Dot-joined names from the root client down, e.g. `A.AA.AAB`.
    pub fn qualified_name(&self, id: ClientId) -> Option<String> {
        let mut names = Vec::new();
        let mut cursor = self.client(id);
        while let Some(c) = cursor {
            names.push(c.name.as_str());
            // from_parts does not reject parent cycles
            if names.len() > self.clients.len() { return None; }
            cursor = c.parent.and_then(|p| self.client(p));
        }
        names.reverse();
        Some(names.join("."))
    }

    pub fn find(&self, qualified_name: &str) -> Option<&Client> {
        self.clients
            .iter()
            .find(|c| self.qualified_name(c.id).as_deref() == Some(qualified_name))
    }
}
