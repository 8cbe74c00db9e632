//! Ordered navigation tree of a collection's published documents.
//!
//! Every traversal is depth-first, parent before children, and sibling order is
//! the literal order of each `children` array. An "index" always means a
//! position within the immediate sibling array.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Document, NavigationNode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentStructure(Vec<NavigationNode>);

impl DocumentStructure {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_nodes(nodes: Vec<NavigationNode>) -> Self {
        Self(nodes)
    }

    #[must_use]
    pub fn nodes(&self) -> &[NavigationNode] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts `node` (with its subtree) as a child of `parent_id`, or as a
    /// root when `parent_id` is `None`. `index` defaults to the end of the
    /// sibling list and is clamped to its length.
    pub fn insert(
        &mut self,
        node: NavigationNode,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<()> {
        let present: HashSet<String> = self.ids().into_iter().collect();
        if let Some(duplicate) = first_present_id(&node, &present) {
            return Err(Error::InvariantViolation(format!(
                "document {duplicate} is already in the structure"
            )));
        }

        tracing::debug!(document_id = %node.id, parent_id, index, "inserting node");
        match parent_id {
            None => {
                insert_at(&mut self.0, node, index);
                Ok(())
            }
            Some(parent_id) => place(&mut self.0, parent_id, node, index).map_err(|_| {
                Error::InvariantViolation(format!(
                    "parent document {parent_id} is not in the structure"
                ))
            }),
        }
    }

    /// Detaches the subtree rooted at `id`, returning it with the index it
    /// occupied among its siblings. Returns `None` and leaves the tree
    /// untouched when `id` is absent.
    pub fn remove(&mut self, id: &str) -> Option<(NavigationNode, usize)> {
        detach(&mut self.0, id)
    }

    /// Idempotent removal of a document. When the document was never recorded
    /// in the tree, a childless node is synthesized from the row so callers can
    /// re-insert it elsewhere.
    pub fn remove_document(&mut self, document: &Document) -> (NavigationNode, Option<usize>) {
        match self.remove(&document.id) {
            Some((node, index)) => (node, Some(index)),
            None => {
                tracing::warn!(
                    document_id = %document.id,
                    "document missing from structure during remove"
                );
                (document.to_navigation_node(), None)
            }
        }
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&NavigationNode> {
        find_node(&self.0, id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Immediate parent of `id`, or `None` when `id` is a root or absent.
    #[must_use]
    pub fn find_parent_id(&self, id: &str) -> Option<String> {
        parent_of(&self.0, None, id).flatten().map(str::to_string)
    }

    /// Ids of the subtree rooted at `id` in pre-order, excluding `id`.
    #[must_use]
    pub fn collect_descendant_ids(&self, id: &str) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(node) = self.find(id) {
            for child in &node.children {
                collect_ids(child, &mut ids);
            }
        }
        ids
    }

    /// Every id in the tree in pre-order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for node in &self.0 {
            collect_ids(node, &mut ids);
        }
        ids
    }

    /// Compares the tree against document rows. `documents` should contain
    /// every non-deleted document of the collection and any document the tree
    /// references.
    #[must_use]
    pub fn check_consistency(
        &self,
        collection_id: &str,
        documents: &[Document],
    ) -> Vec<Inconsistency> {
        let by_id: HashMap<&str, &Document> =
            documents.iter().map(|d| (d.id.as_str(), d)).collect();
        let mut seen = HashSet::new();
        let mut problems = Vec::new();

        check_nodes(&self.0, None, collection_id, &by_id, &mut seen, &mut problems);

        for document in documents {
            if document.collection_id.as_deref() == Some(collection_id)
                && document.is_tree_member()
                && !seen.contains(document.id.as_str())
            {
                problems.push(Inconsistency::MissingNode {
                    document_id: document.id.clone(),
                });
            }
        }

        problems
    }
}

impl From<Vec<NavigationNode>> for DocumentStructure {
    fn from(nodes: Vec<NavigationNode>) -> Self {
        Self(nodes)
    }
}

/// A way in which a collection tree disagrees with its document rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// A node references a document that does not exist.
    MissingDocument { document_id: String },
    /// A node's document belongs to another collection.
    WrongCollection { document_id: String },
    /// A node's document is a draft, template, archived or deleted.
    NotTreeMember { document_id: String },
    /// A node's position disagrees with the document's parent pointer.
    ParentMismatch {
        document_id: String,
        in_tree: Option<String>,
        on_document: Option<String>,
    },
    /// The same id appears more than once.
    DuplicateNode { document_id: String },
    /// A published document of the collection is absent from the tree.
    MissingNode { document_id: String },
}

fn check_nodes<'a>(
    nodes: &'a [NavigationNode],
    parent_id: Option<&'a str>,
    collection_id: &str,
    documents: &HashMap<&str, &Document>,
    seen: &mut HashSet<&'a str>,
    problems: &mut Vec<Inconsistency>,
) {
    for node in nodes {
        let document_id = node.id.clone();

        if !seen.insert(node.id.as_str()) {
            problems.push(Inconsistency::DuplicateNode { document_id });
            continue;
        }

        match documents.get(node.id.as_str()) {
            None => problems.push(Inconsistency::MissingDocument { document_id }),
            Some(document) => {
                if document.collection_id.as_deref() != Some(collection_id) {
                    problems.push(Inconsistency::WrongCollection {
                        document_id: document_id.clone(),
                    });
                } else if !document.is_tree_member() {
                    problems.push(Inconsistency::NotTreeMember {
                        document_id: document_id.clone(),
                    });
                }
                if document.parent_document_id.as_deref() != parent_id {
                    problems.push(Inconsistency::ParentMismatch {
                        document_id,
                        in_tree: parent_id.map(str::to_string),
                        on_document: document.parent_document_id.clone(),
                    });
                }
            }
        }

        check_nodes(
            &node.children,
            Some(node.id.as_str()),
            collection_id,
            documents,
            seen,
            problems,
        );
    }
}

fn insert_at(siblings: &mut Vec<NavigationNode>, node: NavigationNode, index: Option<usize>) {
    let index = index.map_or(siblings.len(), |i| i.min(siblings.len()));
    siblings.insert(index, node);
}

fn place(
    nodes: &mut [NavigationNode],
    parent_id: &str,
    node: NavigationNode,
    index: Option<usize>,
) -> std::result::Result<(), NavigationNode> {
    let mut node = node;
    for candidate in nodes.iter_mut() {
        if candidate.id == parent_id {
            insert_at(&mut candidate.children, node, index);
            return Ok(());
        }
        node = match place(&mut candidate.children, parent_id, node, index) {
            Ok(()) => return Ok(()),
            Err(node) => node,
        };
    }
    Err(node)
}

fn detach(nodes: &mut Vec<NavigationNode>, id: &str) -> Option<(NavigationNode, usize)> {
    let mut index = 0;
    while index < nodes.len() {
        if nodes[index].id == id {
            return Some((nodes.remove(index), index));
        }
        if let Some(found) = detach(&mut nodes[index].children, id) {
            return Some(found);
        }
        index += 1;
    }
    None
}

fn find_node<'a>(nodes: &'a [NavigationNode], id: &str) -> Option<&'a NavigationNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

// Outer `Some` means found; the inner option is the parent.
fn parent_of<'a>(
    nodes: &'a [NavigationNode],
    parent: Option<&'a str>,
    id: &str,
) -> Option<Option<&'a str>> {
    for node in nodes {
        if node.id == id {
            return Some(parent);
        }
        if let Some(found) = parent_of(&node.children, Some(node.id.as_str()), id) {
            return Some(found);
        }
    }
    None
}

fn collect_ids(node: &NavigationNode, ids: &mut Vec<String>) {
    ids.push(node.id.clone());
    for child in &node.children {
        collect_ids(child, ids);
    }
}

fn first_present_id(node: &NavigationNode, present: &HashSet<String>) -> Option<String> {
    if present.contains(&node.id) {
        return Some(node.id.clone());
    }
    node.children
        .iter()
        .find_map(|child| first_present_id(child, present))
}
