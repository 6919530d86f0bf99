use serde::{Deserialize, Serialize};

use crate::semantic::{ContainerId, SemanticGraph};

/// Document form of a namespace or interface. Which list a child sits in
/// decides its kind; the top-level declaration is always a namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerDecl {
    pub name: String,
    #[serde(default)]
    pub service: bool,
    #[serde(default)]
    pub client: bool,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub namespaces: Vec<ContainerDecl>,
    #[serde(default)]
    pub interfaces: Vec<ContainerDecl>,
}

pub fn lower_description(decl: &ContainerDecl) -> SemanticGraph {
    let mut graph = SemanticGraph::new(decl.name.clone());
    let root = graph.root();
    lower_body(&mut graph, root, decl);
    graph
}

fn lower_body(graph: &mut SemanticGraph, id: ContainerId, decl: &ContainerDecl) {
    if decl.service { graph.mark_service(id); }
    if decl.client { graph.mark_client(id); }
    for op in &decl.operations {
        graph.add_operation(id, op.clone());
    }
    for ns in &decl.namespaces {
        let child = graph.add_namespace(id, ns.name.clone());
        lower_body(graph, child, ns);
    }
    for iface in &decl.interfaces {
        let child = graph.add_interface(id, iface.name.clone());
        lower_body(graph, child, iface);
    }
}
