use std::ops::{BitOr, BitOrAssign};

use crate::aabb::Aabb;
use crate::body::Body;

/// Directional flag set: which sides of a body are in contact, or which edges
/// of a tile accept collisions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sides(u8);

impl Sides {
    pub const NONE: Sides = Sides(0);
    pub const LEFT: Sides = Sides(1 << 0);
    pub const RIGHT: Sides = Sides(1 << 1);
    pub const UP: Sides = Sides(1 << 2);
    pub const DOWN: Sides = Sides(1 << 3);
    pub const ANY: Sides = Sides(0b1111);

    /// True if every bit of `other` is set in `self`.
    pub fn contains(self, other: Sides) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if no bits are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Sides) {
        self.0 |= other.0;
    }

    /// The matching side on the other body of the same contact
    /// (LEFT <-> RIGHT, UP <-> DOWN).
    pub fn opposite(self) -> Sides {
        let lr = ((self.0 & 0b0001) << 1) | ((self.0 & 0b0010) >> 1);
        let ud = ((self.0 & 0b0100) << 1) | ((self.0 & 0b1000) >> 1);
        Sides(lr | ud)
    }
}

impl BitOr for Sides {
    type Output = Sides;

    fn bitor(self, rhs: Sides) -> Sides {
        Sides(self.0 | rhs.0)
    }
}

impl BitOrAssign for Sides {
    fn bitor_assign(&mut self, rhs: Sides) {
        self.0 |= rhs.0;
    }
}

/// Stable handle for a body inserted into a `PhysicsWorld`.
///
/// Slots are reused after removal; using a handle past `remove` is a
/// programmer error and fails fast.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// Per-tick context passed explicitly into stepping calls. There is no
/// ambient clock; the external fixed-rate loop owns time.
#[derive(Copy, Clone, Debug)]
pub struct TickCtx {
    /// Fixed timestep for this tick (e.g. 1/60).
    pub dt: f32,
}

impl TickCtx {
    pub fn new(dt: f32) -> Self {
        Self { dt }
    }
}

/// World-level configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Region covered by the spatial index; bodies outside it are not indexed.
    pub bounds: Aabb,
    /// Node population that triggers a split into four quadrants.
    pub max_objects: usize,
    /// Maximum split depth; nodes at this level never split.
    pub max_levels: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: Aabb::new(0.0, 0.0, 2048.0, 2048.0),
            max_objects: 4,
            max_levels: 5,
        }
    }
}

/// Debug/performance counters for the world.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub bodies: usize,
    /// Live quadtree nodes.
    pub nodes: usize,
    /// Bodies relocated in the index during the last `step`.
    pub moved_last_step: usize,
}

/// Synchronous collision callback: both bodies after resolution, plus the
/// side each was touched on.
pub type CollideCallback<'a> = dyn FnMut(&Body, &Body, Sides, Sides) + 'a;
