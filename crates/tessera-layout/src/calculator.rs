//! Depth-capped layout calculation with optional per-node memoization and a
//! per-node diff feeding paint invalidation.

use ahash::AHashMap;

use crate::flex;
use crate::node::{LayoutNode, NodeId, Rect};

const DEFAULT_DEPTH_CAP: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    viewport: Rect,
}

struct CacheEntry {
    key: CacheKey,
    computed: Rect,
}

/// Walks a [`LayoutNode`] tree, optionally memoizing `(available) ->
/// computed_layout` per node, and reports which nodes moved or resized
/// since the previous run.
pub struct Calculator {
    depth_cap: usize,
    cache_enabled: bool,
    cache: AHashMap<NodeId, CacheEntry>,
    previous: AHashMap<NodeId, Rect>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_CAP, true)
    }
}

impl Calculator {
    pub fn new(depth_cap: usize, cache_enabled: bool) -> Self {
        Self {
            depth_cap,
            cache_enabled,
            cache: AHashMap::new(),
            previous: AHashMap::new(),
        }
    }

    /// Invalidate every cached result. Call after any style/tree change so
    /// the next `compute` doesn't serve stale geometry.
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    pub fn invalidate(&mut self, id: NodeId) {
        self.cache.remove(&id);
    }

    /// Recompute the tree rooted at `root` against `viewport`, returning the
    /// set of node ids whose box changed since the previous call.
    pub fn compute(&mut self, root: &mut LayoutNode, viewport: Rect) -> Vec<NodeId> {
        if self.cache_enabled {
            if let Some(entry) = self.cache.get(&root.id) {
                if entry.key == (CacheKey { viewport }) {
                    root.computed = entry.computed;
                    root.valid = true;
                    return self.diff(root);
                }
            }
        }

        flex::compute(root, viewport, self.depth_cap);

        if self.cache_enabled {
            self.cache.insert(
                root.id,
                CacheEntry {
                    key: CacheKey { viewport },
                    computed: root.computed,
                },
            );
        }

        self.diff(root)
    }

    fn diff(&mut self, root: &LayoutNode) -> Vec<NodeId> {
        let mut changed = Vec::new();
        let mut seen = AHashMap::new();
        self.diff_node(root, &mut changed, &mut seen);
        self.previous = seen;
        changed
    }

    fn diff_node(&self, node: &LayoutNode, changed: &mut Vec<NodeId>, seen: &mut AHashMap<NodeId, Rect>) {
        seen.insert(node.id, node.computed);
        let moved_or_resized = match self.previous.get(&node.id) {
            Some(prev) => *prev != node.computed,
            None => true,
        };
        if moved_or_resized {
            changed.push(node.id);
        }
        for child in &node.children {
            self.diff_node(child, changed, seen);
        }
    }
}
