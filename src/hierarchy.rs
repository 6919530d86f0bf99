//! Sub-client discovery over an already-built `ClientTree`.
//!
//! Ordering rule: nested namespaces first, then nested interfaces, each bucket
//! in declaration order. The recursive form is a level-order flattening that
//! applies the same rule within every level.
use std::collections::VecDeque;

use thiserror::Error;

use crate::clients::{Client, ClientId, ClientTree};
use crate::semantic::ContainerId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("client {0:?} is not part of this client tree")]
    UnknownClient(ClientId),
    #[error("container {0:?} is not part of the semantic graph")]
    UnknownContainer(ContainerId),
    #[error("nested container `{container}` qualifies as a client but none was built for it")]
    MissingClient { container: String },
    #[error("client `{client}` was found under `{expected}` but its parent link points elsewhere")]
    ParentMismatch { client: String, expected: String },
}

impl<'g> ClientTree<'g> {
    /// Sub-clients of `client`: its direct children, or every descendant in
    /// level order when `recursive` is set. The client itself is never included.
    pub fn list_sub_clients(&self, client: ClientId, recursive: bool) -> Result<Vec<&Client>, HierarchyError> {
        let start = self.client(client).ok_or(HierarchyError::UnknownClient(client))?;
        if !recursive {
            return self.direct_sub_clients(start);
        }

        let mut out = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(next) = queue.pop_front() {
            let level = self.direct_sub_clients(next)?;
            queue.extend(level.iter().copied());
            out.extend(level);
        }
        tracing::debug!(client = %start.name, found = out.len(), "listed sub-clients recursively");
        Ok(out)
    }

    fn direct_sub_clients(&self, client: &Client) -> Result<Vec<&Client>, HierarchyError> {
        let container = self
            .graph
            .container(client.container)
            .ok_or(HierarchyError::UnknownContainer(client.container))?;

        let mut out = Vec::with_capacity(container.namespaces.len() + container.interfaces.len());
        for &child_id in container.namespaces.iter().chain(&container.interfaces) {
            let child = self
                .graph
                .container(child_id)
                .ok_or(HierarchyError::UnknownContainer(child_id))?;
            // a client built for the child is emitted whatever the rule says;
            // the rule only decides whether a missing one is an error
            let sub = match self.client_for(child_id) {
                Some(sub) => sub,
                None if self.rule.qualifies(child) => {
                    return Err(HierarchyError::MissingClient { container: child.name.clone() });
                }
                None => continue,
            };
            if sub.parent != Some(client.id) {
                return Err(HierarchyError::ParentMismatch {
                    client: sub.name.clone(),
                    expected: client.name.clone(),
                });
            }
            out.push(sub);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::PromotionRule;
    use crate::lower::{lower_description, ContainerDecl};
    use crate::semantic::SemanticGraph;
    use serde_json::json;

    fn names(xs: &[&Client]) -> Vec<String> {
        xs.iter().map(|c| c.name.clone()).collect()
    }

    fn hierarchy() -> SemanticGraph {
        let decl: ContainerDecl = serde_json::from_value(json!({
            "name": "A",
            "service": true,
            "operations": ["a_o1", "a_o2"],
            "interfaces": [
                { "name": "AG", "operations": ["a_g_o1", "a_g_o2"] }
            ],
            "namespaces": [{
                "name": "AA",
                "operations": ["aa_o1", "aa_o2"],
                "interfaces": [
                    { "name": "AAG", "operations": ["aa_g_o1", "aa_g_o2"] }
                ],
                "namespaces": [
                    { "name": "AAA" },
                    {
                        "name": "AAB",
                        "operations": ["aab_o1", "aab_o2"],
                        "interfaces": [
                            { "name": "AABGroup1", "operations": ["aab_g1_o1", "aab_g1_o2"] },
                            { "name": "AABGroup2" }
                        ]
                    }
                ]
            }]
        })).unwrap();
        lower_description(&decl)
    }

    #[test]
    fn no_sub_clients() {
        let g = SemanticGraph::new("MyClient");
        let tree = ClientTree::build(&g, PromotionRule::AllNested);
        let root = tree.roots().next().unwrap();
        assert!(tree.list_sub_clients(root.id, false).unwrap().is_empty());
        assert!(tree.list_sub_clients(root.id, true).unwrap().is_empty());
    }

    #[test]
    fn one_sub_client() {
        let mut g = SemanticGraph::new("MyClient");
        g.mark_service(g.root());
        g.add_namespace(g.root(), "SubClient");
        let tree = ClientTree::build(&g, PromotionRule::AllNested);
        let root = tree.roots().next().unwrap();
        assert_eq!(names(&tree.list_sub_clients(root.id, false).unwrap()), vec!["SubClient"]);
    }

    #[test]
    fn namespaces_precede_interfaces_at_each_level() {
        let g = hierarchy();
        let tree = ClientTree::build(&g, PromotionRule::AllNested);
        let root = tree.roots().next().unwrap();

        let subs = tree.list_sub_clients(root.id, false).unwrap();
        assert_eq!(names(&subs), vec!["AA", "AG"]);
        let (aa, ag) = (subs[0], subs[1]);

        assert!(tree.list_sub_clients(ag.id, false).unwrap().is_empty());

        let subs = tree.list_sub_clients(aa.id, false).unwrap();
        assert_eq!(names(&subs), vec!["AAA", "AAB", "AAG"]);
        let (aaa, aab, aag) = (subs[0], subs[1], subs[2]);
        assert!(tree.list_sub_clients(aaa.id, false).unwrap().is_empty());
        assert!(tree.list_sub_clients(aag.id, false).unwrap().is_empty());

        let subs = tree.list_sub_clients(aab.id, false).unwrap();
        assert_eq!(names(&subs), vec!["AABGroup1", "AABGroup2"]);
        for sub in subs {
            assert!(tree.list_sub_clients(sub.id, false).unwrap().is_empty());
        }
    }

    #[test]
    fn recursive_listing_is_level_order() {
        let g = hierarchy();
        let tree = ClientTree::build(&g, PromotionRule::AllNested);
        let root = tree.roots().next().unwrap();
        let all = tree.list_sub_clients(root.id, true).unwrap();
        assert_eq!(
            names(&all),
            vec!["AA", "AG", "AAA", "AAB", "AAG", "AABGroup1", "AABGroup2"]
        );

        let aa = tree.find("A.AA").unwrap();
        assert_eq!(
            names(&tree.list_sub_clients(aa.id, true).unwrap()),
            vec!["AAA", "AAB", "AAG", "AABGroup1", "AABGroup2"]
        );
    }

    #[test]
    fn non_empty_rule_is_applied_consistently() {
        let g = hierarchy();
        let tree = ClientTree::build(&g, PromotionRule::NonEmpty);
        let root = tree.roots().next().unwrap();
        assert_eq!(
            names(&tree.list_sub_clients(root.id, true).unwrap()),
            vec!["AA", "AG", "AAB", "AAG", "AABGroup1"]
        );
    }

    #[test]
    fn repeated_calls_agree() {
        let g = hierarchy();
        let tree = ClientTree::build(&g, PromotionRule::AllNested);
        let root = tree.roots().next().unwrap().id;
        assert_eq!(tree.list_sub_clients(root, true), tree.list_sub_clients(root, true));
    }

    #[test]
    fn unknown_client_is_an_error() {
        let g = hierarchy();
        let tree = ClientTree::build(&g, PromotionRule::AllNested);
        assert_eq!(
            tree.list_sub_clients(ClientId(99), false),
            Err(HierarchyError::UnknownClient(ClientId(99)))
        );
    }

    #[test]
    fn missing_prebuilt_client_fails_loudly() {
        let mut g = SemanticGraph::new("A");
        g.add_namespace(g.root(), "AA");
        let clients = vec![Client { id: ClientId(0), name: "A".into(), container: g.root(), parent: None }];
        let tree = ClientTree::from_parts(&g, PromotionRule::AllNested, clients).unwrap();
        assert_eq!(
            tree.list_sub_clients(ClientId(0), false),
            Err(HierarchyError::MissingClient { container: "AA".into() })
        );
    }

    #[test]
    fn prebuilt_client_is_kept_even_if_rule_rejects_it() {
        let mut g = SemanticGraph::new("A");
        g.add_operation(g.root(), "a_o1");
        let aa = g.add_namespace(g.root(), "AA");
        let ab = g.add_namespace(g.root(), "AB");
        let clients = vec![
            Client { id: ClientId(0), name: "A".into(), container: g.root(), parent: None },
            Client { id: ClientId(1), name: "AA".into(), container: aa, parent: Some(ClientId(0)) },
        ];
        let tree = ClientTree::from_parts(&g, PromotionRule::NonEmpty, clients).unwrap();
        assert!(!PromotionRule::NonEmpty.qualifies(g.container(aa).unwrap()));

        // AA is empty but was built; AB is empty and was not, which is fine under NonEmpty
        let subs = tree.list_sub_clients(ClientId(0), false).unwrap();
        assert_eq!(names(&subs), vec!["AA"]);
        assert!(g.container(ab).unwrap().is_empty());

        let strict = ClientTree::from_parts(
            &g,
            PromotionRule::AllNested,
            tree.iter().cloned().collect(),
        ).unwrap();
        assert_eq!(
            strict.list_sub_clients(ClientId(0), true),
            Err(HierarchyError::MissingClient { container: "AB".into() })
        );
    }

    #[test]
    fn misparented_client_is_reported() {
        let mut g = SemanticGraph::new("A");
        let aa = g.add_namespace(g.root(), "AA");
        let ab = g.add_namespace(g.root(), "AB");
        let clients = vec![
            Client { id: ClientId(0), name: "A".into(), container: g.root(), parent: None },
            Client { id: ClientId(1), name: "AA".into(), container: aa, parent: Some(ClientId(0)) },
            Client { id: ClientId(2), name: "AB".into(), container: ab, parent: Some(ClientId(1)) },
        ];
        let tree = ClientTree::from_parts(&g, PromotionRule::AllNested, clients).unwrap();
        assert_eq!(
            tree.list_sub_clients(ClientId(0), false),
            Err(HierarchyError::ParentMismatch { client: "AB".into(), expected: "A".into() })
        );
    }
}
