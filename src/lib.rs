//! thud: resolving physics engine (persistent bodies, quadtree broadphase, tile-aware separation)

pub mod types;
pub mod api;
pub mod aabb;
pub mod body;
pub mod motion;
pub mod quadtree;
pub mod resolve;
pub mod tilemap;
pub mod world;

pub use crate::aabb::Aabb;
pub use crate::api::*;
pub use crate::body::Body;
pub use crate::motion::{PlatformRef, integrate};
pub use crate::quadtree::QuadTree;
pub use crate::resolve::resolve;
pub use crate::tilemap::{Tile, TileGrid};
pub use crate::types::*;
pub use crate::world::PhysicsWorld;
