//! Fiber Arena
//!
//! Both fiber trees (the committed tree and the work-in-progress tree) live
//! in one arena and refer to each other by [`FiberId`]. Dropping a tree is a
//! sweep over the arena rather than a walk through owning pointers.
//!
//! # Traversal
//!
//! Work and commit both walk a subtree in preorder, one fiber at a time:
//! a fiber's child comes next, otherwise the first sibling found while
//! climbing back towards the subtree root.

use std::collections::HashSet;
use std::fmt::Write;

use slotmap::SlotMap;

use super::node::{Fiber, FiberId, FiberKind, MutationTag};

/// Storage for every live fiber.
pub struct FiberArena<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> FiberArena<N> {
    pub fn new() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// The child chain of `id`, in order.
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut children = Vec::new();
        let mut cursor = self.get(id).and_then(|fiber| fiber.child);
        while let Some(child) = cursor {
            children.push(child);
            cursor = self.get(child).and_then(|fiber| fiber.sibling);
        }
        children
    }

    /// The fiber after `id` in a preorder walk of the subtree rooted at
    /// `root`, or `None` once the walk climbs back to `root`.
    pub fn next_in_subtree(&self, id: FiberId, root: FiberId) -> Option<FiberId> {
        if let Some(child) = self.get(id)?.child {
            return Some(child);
        }
        let mut cursor = id;
        loop {
            if cursor == root {
                return None;
            }
            let fiber = self.get(cursor)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent?;
        }
    }

    /// Every fiber of the subtree rooted at `root`, in preorder, `root`
    /// included.
    pub fn preorder(&self, root: FiberId) -> Vec<FiberId> {
        let mut order = Vec::new();
        if !self.contains(root) {
            return order;
        }
        let mut cursor = Some(root);
        while let Some(id) = cursor {
            order.push(id);
            cursor = self.next_in_subtree(id, root);
        }
        order
    }

    /// Free every fiber not reachable from `root`.
    ///
    /// Survivors have their commit bookkeeping reset: the `alternate` link
    /// is dropped and the mutation tag cleared. Returns the number of fibers
    /// freed.
    pub fn sweep(&mut self, root: FiberId) -> usize {
        let live: HashSet<FiberId> = self.preorder(root).into_iter().collect();
        let before = self.fibers.len();
        self.fibers.retain(|id, fiber| {
            if live.contains(&id) {
                fiber.alternate = None;
                fiber.tag = MutationTag::None;
                true
            } else {
                false
            }
        });
        before - self.fibers.len()
    }

    /// Indented outline of the subtree rooted at `root`.
    pub fn dump(&self, root: FiberId) -> String {
        let mut output = String::new();
        self.dump_fiber(&mut output, root, 0);
        output
    }

    fn dump_fiber(&self, output: &mut String, id: FiberId, depth: usize) {
        let Some(fiber) = self.get(id) else {
            let _ = writeln!(output, "{}(missing)", "  ".repeat(depth));
            return;
        };
        let _ = writeln!(output, "{}{}", "  ".repeat(depth), fiber);
        for child in self.children(id) {
            self.dump_fiber(output, child, depth + 1);
        }
    }
}

impl<N: Clone> FiberArena<N> {
    /// The nearest host node above `id`.
    pub fn host_parent(&self, id: FiberId) -> Option<N> {
        let mut cursor = self.get(id)?.parent;
        while let Some(ancestor) = cursor {
            let fiber = self.get(ancestor)?;
            if let Some(node) = fiber.host_node() {
                return Some(node.clone());
            }
            cursor = fiber.parent;
        }
        None
    }

    /// The first already-mounted host node that follows `id` under the same
    /// host parent. Placing `id` before it keeps host order equal to fiber
    /// order.
    pub fn host_sibling(&self, id: FiberId) -> Option<N> {
        let mut cursor = id;
        loop {
            let mut sibling = self.get(cursor)?.sibling;
            while let Some(next) = sibling {
                if let Some(node) = self.first_mounted_node(next) {
                    return Some(node);
                }
                sibling = self.get(next)?.sibling;
            }
            let parent = self.get(self.get(cursor)?.parent?)?;
            if !parent.is_function() {
                return None;
            }
            cursor = self.get(cursor)?.parent?;
        }
    }

    fn first_mounted_node(&self, id: FiberId) -> Option<N> {
        let fiber = self.get(id)?;
        if fiber.tag == MutationTag::Placement {
            return None;
        }
        match &fiber.kind {
            FiberKind::Host { node, .. } => node.clone(),
            FiberKind::Function(_) => self
                .children(id)
                .into_iter()
                .find_map(|child| self.first_mounted_node(child)),
        }
    }

    /// Host nodes directly owned by the subtree rooted at `id`: the fiber's
    /// own node, or the topmost nodes beneath a function fiber.
    pub fn host_roots(&self, id: FiberId) -> Vec<N> {
        let Some(fiber) = self.get(id) else {
            return Vec::new();
        };
        match fiber.host_node() {
            Some(node) => vec![node.clone()],
            None => self
                .children(id)
                .into_iter()
                .flat_map(|child| self.host_roots(child))
                .collect(),
        }
    }
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self::new()
    }
}
