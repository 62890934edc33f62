//! Persistent physics world: body storage, index upkeep, query surface.
//!
//! One logical thread drives integrate, index update, then query/resolve once
//! per tick. The world owns its bodies in a free-listed slab addressed by
//! `BodyId`; the quadtree holds only handles.

use glam::Vec2;
use log::{debug, error};

use crate::aabb::Aabb;
use crate::api::PhysicsWorldApi;
use crate::body::Body;
use crate::motion::{PlatformRef, integrate};
use crate::quadtree::QuadTree;
use crate::resolve::resolve;
use crate::tilemap::TileGrid;
use crate::types::{BodyId, CollideCallback, Sides, TickCtx, WorldConfig, WorldStats};

struct Slot {
    body: Body,
    /// Position the quadtree last saw; only bodies that drifted from it are
    /// relocated on `step`, which also catches external `set_position` calls
    /// and resolver corrections from the previous tick.
    indexed_at: Vec2,
}

/// Resolving physics world over a quadtree broad phase.
pub struct PhysicsWorld {
    pub cfg: WorldConfig,
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    tree: QuadTree,
    moved_last_step: usize,
}

impl PhysicsWorldApi for PhysicsWorld {
    fn new(cfg: WorldConfig) -> Self {
        let tree = QuadTree::new(cfg.bounds, cfg.max_objects, cfg.max_levels);
        Self {
            cfg,
            slots: Vec::new(),
            free: Vec::new(),
            tree,
            moved_last_step: 0,
        }
    }

    fn insert(&mut self, body: Body) -> BodyId {
        let id = match self.free.pop() {
            Some(i) => BodyId(i),
            None => {
                self.slots.push(None);
                BodyId((self.slots.len() - 1) as u32)
            }
        };
        self.tree.insert(id, body.bounds());
        let indexed_at = body.position();
        self.slots[id.0 as usize] = Some(Slot { body, indexed_at });
        id
    }

    fn remove(&mut self, id: BodyId) -> Body {
        let slot = match self.slots.get_mut(id.0 as usize).and_then(Option::take) {
            Some(s) => s,
            None => Self::stale(id),
        };
        self.tree.remove(id);
        self.free.push(id.0);
        slot.body
    }

    fn body(&self, id: BodyId) -> &Body {
        match self.slots.get(id.0 as usize).and_then(Option::as_ref) {
            Some(s) => &s.body,
            None => Self::stale(id),
        }
    }

    fn body_mut(&mut self, id: BodyId) -> &mut Body {
        match self.slots.get_mut(id.0 as usize).and_then(Option::as_mut) {
            Some(s) => &mut s.body,
            None => Self::stale(id),
        }
    }

    fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn step(&mut self, ctx: &TickCtx) {
        // Snapshot platform motion first so the per-body pass borrows one
        // body at a time.
        let count = self.slots.len();
        let mut rides: Vec<Option<PlatformRef>> = vec![None; count];
        for i in 0..count {
            let platform_id = match &self.slots[i] {
                Some(slot) => slot.body.riding(),
                None => None,
            };
            if let Some(pid) = platform_id {
                rides[i] = self
                    .slots
                    .get(pid.0 as usize)
                    .and_then(Option::as_ref)
                    .map(|p| PlatformRef {
                        velocity: p.body.velocity,
                        acceleration: p.body.acceleration,
                    });
            }
        }

        let mut moved = 0usize;
        for i in 0..count {
            let relocated = {
                let slot = match self.slots[i].as_mut() {
                    Some(s) => s,
                    None => continue,
                };
                integrate(&mut slot.body, rides[i], ctx);
                if slot.body.position() != slot.indexed_at {
                    slot.indexed_at = slot.body.position();
                    Some(*slot.body.bounds())
                } else {
                    None
                }
            };
            if let Some(bounds) = relocated {
                self.tree.relocate(BodyId(i as u32), &bounds);
                moved += 1;
            }
        }
        self.moved_last_step = moved;
        debug!("step: {} bodies, {} relocated", self.len(), moved);
    }

    fn retrieve(&self, bounds: &Aabb) -> Vec<BodyId> {
        let mut out = Vec::new();
        self.tree.retrieve(bounds, &mut out);
        out
    }

    fn overlap(
        &mut self,
        id: BodyId,
        mut callback: Option<&mut CollideCallback<'_>>,
        separate: bool,
        collidable_edges: Sides,
    ) -> bool {
        let query = *self.body(id).movement_bounds();
        let mut candidates = Vec::new();
        self.tree.retrieve(&query, &mut candidates);

        let mut any = false;
        for other in candidates {
            if other == id {
                continue;
            }
            let (a, b) = self.pair_mut(id, other);
            any |= resolve(
                a,
                b,
                Some(id),
                Some(other),
                separate,
                collidable_edges,
                callback.as_deref_mut(),
            );
        }
        any
    }

    fn collide_tiles(
        &mut self,
        id: BodyId,
        tiles: &mut TileGrid,
        callback: Option<&mut CollideCallback<'_>>,
    ) -> bool {
        let slot = match self.slots.get_mut(id.0 as usize).and_then(Option::as_mut) {
            Some(s) => s,
            None => Self::stale(id),
        };
        tiles.collide(&mut slot.body, callback)
    }

    fn debug_rects(&self) -> Vec<Aabb> {
        let mut out = Vec::new();
        self.tree.node_rects(&mut out);
        out
    }

    fn stats(&self) -> WorldStats {
        WorldStats {
            bodies: self.len(),
            nodes: self.tree.node_count(),
            moved_last_step: self.moved_last_step,
        }
    }
}

impl PhysicsWorld {
    /// Distinct mutable borrows of two bodies; both handles must be live.
    fn pair_mut(&mut self, a: BodyId, b: BodyId) -> (&mut Body, &mut Body) {
        let (ai, bi) = (a.0 as usize, b.0 as usize);
        debug_assert_ne!(ai, bi);
        let (low, high) = if ai < bi { (ai, bi) } else { (bi, ai) };
        let (head, tail) = self.slots.split_at_mut(high);
        let low_body = match head[low].as_mut() {
            Some(s) => &mut s.body,
            None => Self::stale(if ai < bi { a } else { b }),
        };
        let high_body = match tail[0].as_mut() {
            Some(s) => &mut s.body,
            None => Self::stale(if ai < bi { b } else { a }),
        };
        if ai < bi { (low_body, high_body) } else { (high_body, low_body) }
    }

    fn stale(id: BodyId) -> ! {
        error!("stale body handle {:?}", id);
        panic!("body {:?} is not present in this world", id);
    }
}
