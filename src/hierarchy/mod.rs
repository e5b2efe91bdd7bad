//! Document hierarchy reconstruction.
//!
//! Documents arrive as a flat list with parent pointers. [`Hierarchy::build`]
//! links them into a forest stored in an arena: children are owned through the
//! arena, and parent links are plain [`NodeId`] indices, so no ownership cycle
//! exists.

use std::collections::HashMap;

use tracing::warn;

use crate::document::Document;

/// Index of a node inside a [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A document placed in the forest.
#[derive(Debug, Clone)]
pub struct Node {
    document: Document,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Forest of documents for one collection.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
    orphans: Vec<NodeId>,
}

impl Hierarchy {
    /// Build the forest in two passes: allocate and index every document, then
    /// link each one to its declared parent.
    ///
    /// A parent id missing from the input makes the document a root and is
    /// recorded as an orphan. A parent link that would close a cycle is dropped
    /// the same way. Duplicate ids keep their first occurrence.
    pub fn build(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut hierarchy = Self::default();

        for document in documents {
            if hierarchy.index.contains_key(&document.id) {
                warn!(id = %document.id, title = %document.title, "Duplicate document id, keeping first");
                continue;
            }
            let id = NodeId(hierarchy.nodes.len());
            hierarchy.index.insert(document.id.clone(), id);
            hierarchy.nodes.push(Node {
                document,
                parent: None,
                children: Vec::new(),
            });
        }

        for position in 0..hierarchy.nodes.len() {
            let id = NodeId(position);
            let Some(parent_ref) = hierarchy.nodes[position].document.parent_document_id.clone()
            else {
                hierarchy.roots.push(id);
                continue;
            };

            match hierarchy.index.get(&parent_ref).copied() {
                Some(parent) if !hierarchy.is_ancestor_or_self(id, parent) => {
                    hierarchy.nodes[position].parent = Some(parent);
                    hierarchy.nodes[parent.0].children.push(id);
                }
                Some(_) => {
                    let node = &hierarchy.nodes[position].document;
                    warn!(id = %node.id, title = %node.title, parent = %parent_ref, "Parent link would form a cycle, treating document as root");
                    hierarchy.roots.push(id);
                    hierarchy.orphans.push(id);
                }
                None => {
                    let node = &hierarchy.nodes[position].document;
                    warn!(id = %node.id, title = %node.title, parent = %parent_ref, "Parent not in collection, treating document as root");
                    hierarchy.roots.push(id);
                    hierarchy.orphans.push(id);
                }
            }
        }

        hierarchy
    }

    /// Whether `candidate` is reachable from `start` through parent links
    /// established so far (including `start` itself).
    fn is_ancestor_or_self(&self, candidate: NodeId, start: NodeId) -> bool {
        let mut current = Some(start);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Look up a node by document id.
    pub fn get(&self, document_id: &str) -> Option<&Node> {
        self.index.get(document_id).map(|id| self.node(*id))
    }

    /// Every document, in input order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.nodes.iter().map(|node| &node.document)
    }

    pub fn roots(&self) -> impl Iterator<Item = &Node> + '_ {
        self.roots.iter().map(|id| self.node(*id))
    }

    /// Documents whose declared parent was missing or would have formed a cycle.
    pub fn orphans(&self) -> impl Iterator<Item = &Node> + '_ {
        self.orphans.iter().map(|id| self.node(*id))
    }

    pub fn children(&self, document_id: &str) -> Vec<&Node> {
        self.get(document_id)
            .map(|node| node.children.iter().map(|id| self.node(*id)).collect())
            .unwrap_or_default()
    }

    /// Nodes from the root down to and including `document_id`.
    /// Empty when the id is unknown.
    pub fn path(&self, document_id: &str) -> Vec<&Node> {
        let Some(&start) = self.index.get(document_id) else {
            return Vec::new();
        };

        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            let node = self.node(id);
            path.push(node);
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// [`Hierarchy::path`] without the node itself.
    pub fn ancestors(&self, document_id: &str) -> Vec<&Node> {
        let mut path = self.path(document_id);
        path.pop();
        path
    }

    /// Number of ancestors above `document_id` (0 for roots and unknown ids).
    pub fn depth(&self, document_id: &str) -> usize {
        self.path(document_id).len().saturating_sub(1)
    }

    /// Pre-order walk of the forest yielding `(depth, node)`.
    pub fn walk(&self) -> Vec<(usize, &Node)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NodeId)> =
            self.roots.iter().rev().map(|id| (0, *id)).collect();

        while let Some((depth, id)) = stack.pop() {
            let node = self.node(id);
            out.push((depth, node));
            stack.extend(node.children.iter().rev().map(|child| (depth + 1, *child)));
        }
        out
    }
}
