//! Adaptive spatial index over body handles.
//!
//! Nodes live in a flat arena and reference children and parent by index, so
//! the parent back-references needed for pruning cannot form ownership
//! cycles. A body-to-node lookup gives O(1) relocation of moved bodies; the
//! stationary majority of a population is never touched by an update.

use std::collections::HashMap;

use log::trace;

use crate::aabb::Aabb;
use crate::types::BodyId;

const ROOT: u32 = 0;
const NIL: u32 = u32::MAX;

#[derive(Copy, Clone)]
struct Entry {
    id: BodyId,
    bounds: Aabb,
}

struct Node {
    bounds: Aabb,
    level: u32,
    parent: u32,
    children: Option<[u32; 4]>,
    members: Vec<Entry>,
    /// Objects stored in this node and its whole subtree. Zero lets pruning
    /// collapse the children back into a leaf.
    total: usize,
}

impl Node {
    fn leaf(bounds: Aabb, level: u32, parent: u32) -> Self {
        Self {
            bounds,
            level,
            parent,
            children: None,
            members: Vec::new(),
            total: 0,
        }
    }
}

/// Quadtree over body handles.
///
/// A node splits into four equal quadrants once its population exceeds
/// `max_objects` (below `max_levels`); an object stays at the lowest node
/// whose bounds strictly contain its box, so straddlers live at the parent
/// and are never duplicated across children.
pub struct QuadTree {
    nodes: Vec<Node>,
    free: Vec<u32>,
    body_node: HashMap<BodyId, u32>,
    max_objects: usize,
    max_levels: u32,
}

impl QuadTree {
    pub fn new(bounds: Aabb, max_objects: usize, max_levels: u32) -> Self {
        Self {
            nodes: vec![Node::leaf(bounds, 0, NIL)],
            free: Vec::new(),
            body_node: HashMap::new(),
            max_objects: max_objects.max(1),
            max_levels,
        }
    }

    /// Region covered by the root node.
    pub fn bounds(&self) -> &Aabb {
        &self.nodes[ROOT as usize].bounds
    }

    /// Number of indexed bodies.
    pub fn len(&self) -> usize {
        self.body_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body_node.is_empty()
    }

    /// Live node count (arena minus the free list).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// True if `id` is currently indexed.
    pub fn contains(&self, id: BodyId) -> bool {
        self.body_node.contains_key(&id)
    }

    /// Index a body. Boxes that do not intersect the root bounds are
    /// discarded and `false` is returned.
    pub fn insert(&mut self, id: BodyId, bounds: &Aabb) -> bool {
        debug_assert!(
            !self.body_node.contains_key(&id),
            "body inserted twice without removal"
        );
        if !self.nodes[ROOT as usize].bounds.intersects(bounds) {
            return false;
        }
        self.add_entry(ROOT, Entry { id, bounds: *bounds });
        true
    }

    /// Drop a body from the index. Returns false if it was never indexed.
    pub fn remove(&mut self, id: BodyId) -> bool {
        let node_idx = match self.body_node.get(&id) {
            Some(&n) => n,
            None => return false,
        };
        let pos = {
            let members = &self.nodes[node_idx as usize].members;
            match members.iter().position(|e| e.id == id) {
                Some(p) => p,
                None => unreachable!("lookup table points at a node missing the body"),
            }
        };
        self.detach_at(node_idx, pos);
        self.prune_from(node_idx);
        true
    }

    /// Re-index a moved body: remove it from its recorded node, then
    /// re-insert from the root. Returns false if the new bounds left the
    /// world (the body drops out of the index).
    pub fn relocate(&mut self, id: BodyId, bounds: &Aabb) -> bool {
        self.remove(id);
        self.insert(id, bounds)
    }

    /// Collect candidate bodies for `bounds`. The visited nodes' own members
    /// are always candidates; children are descended only when their quadrant
    /// intersects the query box (a straddling query can reach several).
    pub fn retrieve(&self, bounds: &Aabb, out: &mut Vec<BodyId>) {
        self.collect(ROOT, bounds, out);
    }

    /// Ordered node boundary rectangles for debug drawing (preorder).
    pub fn node_rects(&self, out: &mut Vec<Aabb>) {
        self.collect_rects(ROOT, out);
    }

    fn add_entry(&mut self, node_idx: u32, entry: Entry) {
        if let Some(children) = self.nodes[node_idx as usize].children {
            match self.quadrant_index(&children, &entry.bounds) {
                Some(q) => self.add_entry(children[q], entry),
                // Straddles a split line: stays at this level.
                None => self.attach(node_idx, entry),
            }
            return;
        }

        self.attach(node_idx, entry);
        let node = &self.nodes[node_idx as usize];
        if node.members.len() > self.max_objects && node.level < self.max_levels {
            self.split(node_idx);
        }
    }

    fn split(&mut self, node_idx: u32) {
        let (bounds, level) = {
            let n = &self.nodes[node_idx as usize];
            (n.bounds, n.level)
        };
        let half_w = bounds.width() * 0.5;
        let half_h = bounds.height() * 0.5;
        let (x, y) = (bounds.x(), bounds.y());
        // Child order: top-right, top-left, bottom-left, bottom-right.
        let quads = [
            Aabb::new(x + half_w, y, half_w, half_h),
            Aabb::new(x, y, half_w, half_h),
            Aabb::new(x, y + half_h, half_w, half_h),
            Aabb::new(x + half_w, y + half_h, half_w, half_h),
        ];
        let mut children = [0u32; 4];
        for (i, quad) in quads.into_iter().enumerate() {
            children[i] = self.alloc(Node::leaf(quad, level + 1, node_idx));
        }
        self.nodes[node_idx as usize].children = Some(children);
        trace!("quadtree: split level {} node at ({}, {})", level, x, y);

        // Redistribute members that fit entirely inside one quadrant, in
        // reverse so swap-removal does not skip entries.
        let mut i = self.nodes[node_idx as usize].members.len();
        while i > 0 {
            i -= 1;
            let entry = self.nodes[node_idx as usize].members[i];
            if let Some(q) = self.quadrant_index(&children, &entry.bounds) {
                self.detach_at(node_idx, i);
                self.add_entry(children[q], entry);
            }
        }
    }

    /// Index of the child quadrant strictly containing `bounds`, or None for
    /// boxes spanning a split line or exceeding the node.
    fn quadrant_index(&self, children: &[u32; 4], bounds: &Aabb) -> Option<usize> {
        children
            .iter()
            .position(|&c| self.nodes[c as usize].bounds.contains(bounds))
    }

    fn attach(&mut self, node_idx: u32, entry: Entry) {
        self.nodes[node_idx as usize].members.push(entry);
        self.body_node.insert(entry.id, node_idx);
        self.adjust_totals(node_idx, 1);
    }

    fn detach_at(&mut self, node_idx: u32, i: usize) {
        let entry = self.nodes[node_idx as usize].members.swap_remove(i);
        self.body_node.remove(&entry.id);
        self.adjust_totals(node_idx, -1);
    }

    fn adjust_totals(&mut self, start: u32, delta: isize) {
        let mut node_idx = start;
        loop {
            let n = &mut self.nodes[node_idx as usize];
            n.total = (n.total as isize + delta) as usize;
            if n.parent == NIL {
                break;
            }
            node_idx = n.parent;
        }
    }

    fn prune_from(&mut self, start: u32) {
        let mut node_idx = start;
        loop {
            let (total, has_children, parent) = {
                let n = &self.nodes[node_idx as usize];
                (n.total, n.children.is_some(), n.parent)
            };
            if total == 0 && has_children {
                self.free_children(node_idx);
                trace!("quadtree: pruned empty subtree under node {}", node_idx);
            }
            if parent == NIL {
                break;
            }
            node_idx = parent;
        }
    }

    fn free_children(&mut self, node_idx: u32) {
        if let Some(children) = self.nodes[node_idx as usize].children.take() {
            for c in children {
                self.free_children(c);
                debug_assert!(self.nodes[c as usize].members.is_empty());
                self.free.push(c);
            }
        }
    }

    fn alloc(&mut self, node: Node) -> u32 {
        match self.free.pop() {
            Some(i) => {
                self.nodes[i as usize] = node;
                i
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn collect(&self, node_idx: u32, bounds: &Aabb, out: &mut Vec<BodyId>) {
        let n = &self.nodes[node_idx as usize];
        if n.total == 0 {
            return;
        }
        out.extend(n.members.iter().map(|e| e.id));
        if let Some(children) = n.children {
            for c in children {
                if self.nodes[c as usize].bounds.intersects(bounds) {
                    self.collect(c, bounds, out);
                }
            }
        }
    }

    fn collect_rects(&self, node_idx: u32, out: &mut Vec<Aabb>) {
        let n = &self.nodes[node_idx as usize];
        out.push(n.bounds);
        if let Some(children) = n.children {
            for c in children {
                self.collect_rects(c, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> QuadTree {
        QuadTree::new(Aabb::new(0.0, 0.0, 100.0, 100.0), 5, 5)
    }

    fn cluster_boxes() -> Vec<Aabb> {
        // Six small boxes strictly inside (0,0,25,25).
        (0..6).map(|i| Aabb::new(1.0 + 3.0 * i as f32, 2.0, 2.0, 2.0)).collect()
    }

    #[test]
    fn test_insert_outside_world_is_discarded() {
        let mut t = tree();
        assert!(!t.insert(BodyId(0), &Aabb::new(200.0, 200.0, 10.0, 10.0)));
        assert_eq!(t.len(), 0);
        assert!(!t.contains(BodyId(0)));
    }

    #[test]
    fn test_cluster_splits_and_stays_retrievable() {
        let mut t = tree();
        for (i, b) in cluster_boxes().iter().enumerate() {
            assert!(t.insert(BodyId(i as u32), b));
        }
        assert_eq!(t.len(), 6);
        assert!(t.node_count() > 1, "six clustered bodies must split the node");

        let mut found = Vec::new();
        t.retrieve(&Aabb::new(0.0, 0.0, 25.0, 25.0), &mut found);
        for i in 0..6 {
            assert!(found.contains(&BodyId(i)), "body {} lost after split", i);
        }
    }

    #[test]
    fn test_query_equal_to_body_box_finds_it() {
        let mut t = tree();
        for (i, b) in cluster_boxes().iter().enumerate() {
            t.insert(BodyId(i as u32), b);
        }
        let probe = cluster_boxes()[3];
        let mut found = Vec::new();
        t.retrieve(&probe, &mut found);
        assert!(found.contains(&BodyId(3)));
    }

    #[test]
    fn test_straddler_stays_above_split_lines() {
        let mut t = tree();
        for (i, b) in cluster_boxes().iter().enumerate() {
            t.insert(BodyId(i as u32), b);
        }
        // Crosses the root's center: cannot descend into any quadrant.
        t.insert(BodyId(10), &Aabb::new(45.0, 45.0, 10.0, 10.0));
        let mut found = Vec::new();
        t.retrieve(&Aabb::new(80.0, 80.0, 5.0, 5.0), &mut found);
        assert!(found.contains(&BodyId(10)));
        assert!(!found.contains(&BodyId(0)));
    }

    #[test]
    fn test_relocate_moves_between_quadrants() {
        let mut t = tree();
        for (i, b) in cluster_boxes().iter().enumerate() {
            t.insert(BodyId(i as u32), b);
        }
        assert!(t.relocate(BodyId(0), &Aabb::new(75.0, 75.0, 2.0, 2.0)));
        assert!(t.contains(BodyId(0)));

        let mut bottom_right = Vec::new();
        t.retrieve(&Aabb::new(70.0, 70.0, 20.0, 20.0), &mut bottom_right);
        assert!(bottom_right.contains(&BodyId(0)));

        let mut top_left = Vec::new();
        t.retrieve(&Aabb::new(0.0, 0.0, 25.0, 25.0), &mut top_left);
        assert!(!top_left.contains(&BodyId(0)));
        for i in 1..6 {
            assert!(top_left.contains(&BodyId(i)));
        }
    }

    #[test]
    fn test_relocate_out_of_world_drops_from_index() {
        let mut t = tree();
        t.insert(BodyId(0), &Aabb::new(10.0, 10.0, 5.0, 5.0));
        assert!(!t.relocate(BodyId(0), &Aabb::new(500.0, 500.0, 5.0, 5.0)));
        assert!(!t.contains(BodyId(0)));
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn test_removal_prunes_back_to_a_single_leaf() {
        let mut t = tree();
        for (i, b) in cluster_boxes().iter().enumerate() {
            t.insert(BodyId(i as u32), b);
        }
        assert!(t.node_count() > 1);
        for i in 0..6 {
            assert!(t.remove(BodyId(i)));
        }
        assert_eq!(t.len(), 0);
        assert_eq!(t.node_count(), 1);

        // Freed nodes are reused on the next split.
        for (i, b) in cluster_boxes().iter().enumerate() {
            t.insert(BodyId(i as u32), b);
        }
        assert!(t.node_count() > 1);
    }

    #[test]
    fn test_node_rects_start_at_root() {
        let mut t = tree();
        for (i, b) in cluster_boxes().iter().enumerate() {
            t.insert(BodyId(i as u32), b);
        }
        let mut rects = Vec::new();
        t.node_rects(&mut rects);
        assert_eq!(rects.len(), t.node_count());
        assert_eq!(rects[0].width(), 100.0);
    }
}
