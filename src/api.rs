use crate::aabb::Aabb;
use crate::body::Body;
use crate::tilemap::TileGrid;
use crate::types::{BodyId, CollideCallback, Sides, TickCtx, WorldConfig, WorldStats};

/// Public API contract for the resolving physics world.
pub trait PhysicsWorldApi {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Body lifecycle ----------------------------------------------------

    /// Add a body and return its stable handle. Bodies outside the world
    /// bounds are stored but not indexed until they move inside.
    fn insert(&mut self, body: Body) -> BodyId;

    /// Take a body back out of the world. The handle becomes stale.
    fn remove(&mut self, id: BodyId) -> Body;

    /// Borrow a body. Stale handles fail fast.
    fn body(&self, id: BodyId) -> &Body;

    /// Mutably borrow a body. Position changes are picked up by the index on
    /// the next `step`.
    fn body_mut(&mut self, id: BodyId) -> &mut Body;

    /// Number of live bodies.
    fn len(&self) -> usize;

    // --- Tick --------------------------------------------------------------

    /// Integrate every body, then re-index the ones that moved.
    fn step(&mut self, ctx: &TickCtx);

    // --- Queries -----------------------------------------------------------

    /// Broad-phase candidates whose node regions intersect `bounds`.
    fn retrieve(&self, bounds: &Aabb) -> Vec<BodyId>;

    /// Narrow-phase every candidate pair for `id`'s movement bounds,
    /// separating when `separate` is set. Returns whether anything collided.
    fn overlap(
        &mut self,
        id: BodyId,
        callback: Option<&mut CollideCallback<'_>>,
        separate: bool,
        collidable_edges: Sides,
    ) -> bool;

    /// Resolve `id` against a static tile grid, honoring per-tile open-edge
    /// masks. Returns whether any tile collided.
    fn collide_tiles(
        &mut self,
        id: BodyId,
        tiles: &mut TileGrid,
        callback: Option<&mut CollideCallback<'_>>,
    ) -> bool;

    // --- Debug -------------------------------------------------------------

    /// Ordered quadtree node rectangles for external line drawing.
    fn debug_rects(&self) -> Vec<Aabb>;

    /// Counters for the current world state.
    fn stats(&self) -> WorldStats;
}
