use rand::Rng;
use thiserror::Error;

const BASE_EDGE: f64 = 500.0;
const MIN_SCALE: f64 = 0.85;
const MAX_SCALE: f64 = 1.15;
const FULL_SCALE: f64 = 2.0;

/// Stable handle to a node in a [`HistoryChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// On-screen size of an image, picked once per node so consecutive images
/// don't all land in the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
    pub full_width: u32,
    pub full_height: u32,
}

impl DisplaySize {
    pub fn from_scale(scale: f64) -> Self {
        let edge = (BASE_EDGE * scale).round().max(1.0);
        let full = (edge * FULL_SCALE).round();

        Self {
            width: edge as u32,
            height: edge as u32,
            full_width: full as u32,
            full_height: full as u32,
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::from_scale(rng.random_range(MIN_SCALE..MAX_SCALE))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    pub url: String,
    pub display_size: DisplaySize,
    previous: Option<NodeId>,
    next: Option<NodeId>,
}

impl ImageNode {
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChainError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} already has a successor")]
    AlreadyLinked(NodeId),
}

/// Every image visited during a session. Nodes are only ever appended and
/// forward links are written once, so a `NodeId` stays valid for the life
/// of the chain.
#[derive(Debug, Default)]
pub struct HistoryChain {
    nodes: Vec<ImageNode>,
}

impl HistoryChain {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node with no neighbours.
    pub fn push_root(&mut self, url: String, display_size: DisplaySize) -> NodeId {
        self.nodes.push(ImageNode {
            url,
            display_size,
            previous: None,
            next: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Add a node as the successor of `after`.
    pub fn link_next(
        &mut self,
        after: NodeId,
        url: String,
        display_size: DisplaySize,
    ) -> Result<NodeId, ChainError> {
        let prev = self.nodes.get(after.0).ok_or(ChainError::UnknownNode(after))?;
        if prev.next.is_some() {
            return Err(ChainError::AlreadyLinked(after));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ImageNode {
            url,
            display_size,
            previous: Some(after),
            next: None,
        });
        self.nodes[after.0].next = Some(id);
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&ImageNode> {
        self.nodes.get(id.0)
    }

    pub fn next_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.next)
    }

    pub fn previous_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.previous)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when every forward link has a matching back link and vice versa.
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, node)| {
            let forward_ok = node
                .next
                .map(|n| self.previous_of(n) == Some(NodeId(i)))
                .unwrap_or(true);
            let backward_ok = node
                .previous
                .map(|p| self.next_of(p) == Some(NodeId(i)))
                .unwrap_or(true);
            forward_ok && backward_ok
        })
    }
}
