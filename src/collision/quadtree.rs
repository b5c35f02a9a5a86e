//! Region quadtree rebuilt from scratch every pass.
//!
//! Nodes live in an arena and are recycled through a free list, so a rebuild
//! after the first few steps allocates nothing. Bodies whose AABB straddles
//! quadrant boundaries stay in the parent node instead of being duplicated.

use hashbrown::HashSet;
use tracing::{debug, trace};

use super::aabb::AABB;
use super::broad_phase::{should_pair, BodyPair, BroadPhaseEntry};
use crate::config::QuadtreeConfig;

type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    bounds: AABB,
    level: usize,
    entries: Vec<BroadPhaseEntry>,
    children: Option<[NodeId; 4]>,
}

impl Node {
    fn new(bounds: AABB, level: usize) -> Self {
        Self {
            bounds,
            level,
            entries: Vec::new(),
            children: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Quadtree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    config: QuadtreeConfig,
    inserted: Vec<BroadPhaseEntry>,
    total_nodes_created: usize,
}

impl Quadtree {
    /// Creates an empty tree whose root covers `bounds`.
    pub fn new(bounds: AABB, config: QuadtreeConfig) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: 0,
            config,
            inserted: Vec::new(),
            total_nodes_created: 0,
        };
        tree.root = tree.acquire_node(bounds, 0);
        tree
    }

    pub fn bounds(&self) -> AABB {
        self.nodes[self.root].bounds
    }

    /// Takes a node from the pool, or grows the arena when the pool is empty.
    fn acquire_node(&mut self, bounds: AABB, level: usize) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                let node = &mut self.nodes[id];
                node.bounds = bounds;
                node.level = level;
                node.entries.clear();
                node.children = None;
                id
            }
            None => {
                self.nodes.push(Node::new(bounds, level));
                self.total_nodes_created += 1;
                self.nodes.len() - 1
            }
        }
    }

    /// Returns a node and its whole subtree to the pool.
    fn release_node(&mut self, id: NodeId) {
        if let Some(children) = self.nodes[id].children.take() {
            for child in children {
                self.release_node(child);
            }
        }
        self.nodes[id].entries.clear();
        self.free.push(id);
    }

    /// Grows the pool so that at least `count` nodes are available.
    pub fn preallocate(&mut self, count: usize) {
        let before = self.total_nodes_created;
        while self.free.len() < count {
            self.nodes.push(Node::new(self.bounds(), 0));
            self.total_nodes_created += 1;
            self.free.push(self.nodes.len() - 1);
        }
        if self.total_nodes_created > before {
            debug!(added = self.total_nodes_created - before, pool = self.free.len(), "quadtree pool grown");
        }
    }

    /// Nodes waiting in the pool.
    pub fn pool_size(&self) -> usize {
        self.free.len()
    }

    /// Nodes ever allocated by this tree.
    pub fn total_nodes_created(&self) -> usize {
        self.total_nodes_created
    }

    /// Nodes currently part of the tree.
    pub fn active_node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Empties the tree, recycling every node except the root.
    pub fn clear(&mut self) {
        if let Some(children) = self.nodes[self.root].children.take() {
            for child in children {
                self.release_node(child);
            }
        }
        self.nodes[self.root].entries.clear();
        self.inserted.clear();
    }

    /// Clears the tree and inserts every entry whose AABB touches the root bounds.
    pub fn rebuild(&mut self, entries: &[BroadPhaseEntry]) {
        self.clear();
        let bounds = self.bounds();
        let before = self.total_nodes_created;
        for entry in entries {
            if bounds.intersects(&entry.aabb) {
                self.insert(*entry);
            }
        }
        let excluded = entries.len() - self.inserted.len();
        trace!(
            inserted = self.inserted.len(),
            excluded,
            nodes = self.active_node_count(),
            grown = self.total_nodes_created - before,
            "quadtree rebuilt"
        );
    }

    /// Inserts one entry. Entries outside the root bounds are still stored at
    /// the root; [`rebuild`](Self::rebuild) filters them beforehand.
    pub fn insert(&mut self, entry: BroadPhaseEntry) {
        self.inserted.push(entry);
        self.insert_into(self.root, entry);
    }

    fn insert_into(&mut self, id: NodeId, entry: BroadPhaseEntry) {
        if let Some(children) = self.nodes[id].children {
            match self.fitting_child(&children, &entry.aabb) {
                Some(child) => self.insert_into(child, entry),
                None => self.nodes[id].entries.push(entry),
            }
            return;
        }

        self.nodes[id].entries.push(entry);
        let node = &self.nodes[id];
        if node.entries.len() > self.config.max_objects && node.level < self.config.max_levels {
            let children = self.subdivide(id);
            let pending = std::mem::take(&mut self.nodes[id].entries);
            let mut kept = Vec::with_capacity(pending.len());
            for e in pending {
                match self.fitting_child(&children, &e.aabb) {
                    Some(child) => self.insert_into(child, e),
                    None => kept.push(e),
                }
            }
            self.nodes[id].entries = kept;
        }
    }

    fn subdivide(&mut self, id: NodeId) -> [NodeId; 4] {
        let level = self.nodes[id].level + 1;
        let quadrants = self.nodes[id].bounds.quadrants();
        let children = quadrants.map(|q| self.acquire_node(q, level));
        self.nodes[id].children = Some(children);
        children
    }

    /// The single child that fully contains `aabb`, if exactly one does.
    fn fitting_child(&self, children: &[NodeId; 4], aabb: &AABB) -> Option<NodeId> {
        let mut fitting = children
            .iter()
            .copied()
            .filter(|&c| self.nodes[c].bounds.contains(aabb));
        match (fitting.next(), fitting.next()) {
            (Some(child), None) => Some(child),
            _ => None,
        }
    }

    /// Collects every entry stored in nodes whose bounds intersect `query`.
    pub fn retrieve(&self, query: &AABB, out: &mut Vec<BroadPhaseEntry>) {
        self.retrieve_from(self.root, query, out);
    }

    fn retrieve_from(&self, id: NodeId, query: &AABB, out: &mut Vec<BroadPhaseEntry>) {
        let node = &self.nodes[id];
        out.extend_from_slice(&node.entries);
        if let Some(children) = node.children {
            for child in children {
                if self.nodes[child].bounds.intersects(query) {
                    self.retrieve_from(child, query, out);
                }
            }
        }
    }

    /// Adds every pruned candidate pair among the inserted entries to `pairs`.
    pub fn potential_pairs(&self, pairs: &mut HashSet<BodyPair>) {
        let mut candidates = Vec::new();
        for entry in &self.inserted {
            candidates.clear();
            self.retrieve(&entry.aabb, &mut candidates);
            for other in &candidates {
                if should_pair(entry, other) {
                    pairs.insert(BodyPair::new(entry.handle, other.handle));
                }
            }
        }
    }

    /// Bounds of every node in the tree, root first.
    pub fn node_bounds(&self) -> Vec<AABB> {
        let mut out = Vec::with_capacity(self.active_node_count());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            out.push(node.bounds);
            if let Some(children) = node.children {
                stack.extend(children.iter().rev());
            }
        }
        out
    }

    /// Depth of the deepest node (root is 0).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            deepest = deepest.max(node.level);
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        deepest
    }
}
