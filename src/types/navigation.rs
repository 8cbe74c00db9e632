use serde::{Deserialize, Serialize};

/// A document reference inside a collection's navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationNode {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub children: Vec<NavigationNode>,
}

impl NavigationNode {
    /// Number of nodes in this subtree, including the node itself.
    #[must_use]
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(NavigationNode::subtree_size).sum::<usize>()
    }
}
