//! Static tile grid and its broad phase.
//!
//! Tiles are immovable solid bodies on a fixed-size grid. Each carries an
//! open-edge mask computed once at load: an edge is open iff the neighboring
//! cell in that direction holds no tile. The mask is handed to the resolver
//! as the collidable edges, so a body sliding across two adjacent solid tiles
//! is blocked only by their outer boundary, never by the interior seam.

use crate::body::Body;
use crate::resolve::resolve;
use crate::types::{CollideCallback, Sides};

/// One solid cell: an immovable body plus the mask of edges exposed to open
/// space.
pub struct Tile {
    body: Body,
    open_edges: Sides,
}

impl Tile {
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn open_edges(&self) -> Sides {
        self.open_edges
    }
}

/// Fixed grid of optional tiles with a uniform cell size, origin at (0, 0).
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_width: f32,
    tile_height: f32,
    tiles: Vec<Option<Tile>>,
}

impl TileGrid {
    /// Build a grid from row-major cell solidity (any non-zero cell is a
    /// solid tile). Open-edge masks are computed here, once; the grid is
    /// immutable afterwards.
    pub fn from_cells(
        width: usize,
        height: usize,
        tile_width: f32,
        tile_height: f32,
        cells: &[u8],
    ) -> Self {
        assert_eq!(cells.len(), width * height, "cell buffer must be width * height");
        let solid = |x: isize, y: isize| -> bool {
            x >= 0
                && y >= 0
                && (x as usize) < width
                && (y as usize) < height
                && cells[y as usize * width + x as usize] != 0
        };
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                if cells[y * width + x] == 0 {
                    tiles.push(None);
                    continue;
                }
                let (ix, iy) = (x as isize, y as isize);
                let mut open = Sides::NONE;
                if !solid(ix - 1, iy) {
                    open.insert(Sides::LEFT);
                }
                if !solid(ix + 1, iy) {
                    open.insert(Sides::RIGHT);
                }
                if !solid(ix, iy - 1) {
                    open.insert(Sides::UP);
                }
                if !solid(ix, iy + 1) {
                    open.insert(Sides::DOWN);
                }
                let body = Body::fixed(
                    x as f32 * tile_width,
                    y as f32 * tile_height,
                    tile_width,
                    tile_height,
                );
                tiles.push(Some(Tile { body, open_edges: open }));
            }
        }
        Self {
            width,
            height,
            tile_width,
            tile_height,
            tiles,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles[y * self.width + x].as_ref()
    }

    /// Resolve `body` against every tile its movement bounds cover. Ranges
    /// outside the grid are clamped away; empty cells are skipped. Returns
    /// whether any tile collided.
    pub fn collide(&mut self, body: &mut Body, mut callback: Option<&mut CollideCallback<'_>>) -> bool {
        let bounds = *body.movement_bounds();
        let left = (bounds.left() / self.tile_width).floor() as isize;
        let right = (bounds.right() / self.tile_width).ceil() as isize - 1;
        let top = (bounds.top() / self.tile_height).floor() as isize;
        let bottom = (bounds.bottom() / self.tile_height).ceil() as isize - 1;
        if right < 0 || bottom < 0 || left >= self.width as isize || top >= self.height as isize {
            return false;
        }
        let x0 = left.max(0) as usize;
        let x1 = right.min(self.width as isize - 1) as usize;
        let y0 = top.max(0) as usize;
        let y1 = bottom.min(self.height as isize - 1) as usize;

        let mut any = false;
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let tile = match self.tiles[ty * self.width + tx].as_mut() {
                    Some(t) => t,
                    None => continue,
                };
                let edges = tile.open_edges;
                any |= resolve(
                    body,
                    &mut tile.body,
                    None,
                    None,
                    true,
                    edges,
                    callback.as_deref_mut(),
                );
            }
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::motion::integrate;
    use crate::types::TickCtx;

    #[test]
    fn test_open_edges_close_interior_seams() {
        // Two tiles side by side in a 4x1 strip.
        let grid = TileGrid::from_cells(4, 1, 10.0, 10.0, &[0, 1, 1, 0]);
        let left = grid.tile(1, 0).map(|t| t.open_edges());
        let right = grid.tile(2, 0).map(|t| t.open_edges());
        assert_eq!(left, Some(Sides::LEFT | Sides::UP | Sides::DOWN));
        assert_eq!(right, Some(Sides::RIGHT | Sides::UP | Sides::DOWN));
        assert!(grid.tile(0, 0).is_none());
        assert!(grid.tile(9, 9).is_none());
    }

    #[test]
    fn test_grid_border_edges_are_open() {
        let grid = TileGrid::from_cells(1, 1, 10.0, 10.0, &[1]);
        assert_eq!(grid.tile(0, 0).map(|t| t.open_edges()), Some(Sides::ANY));
    }

    #[test]
    fn test_body_stops_at_tile_pair_without_seam_event() {
        // Solid pair in cells 5 and 6 of an 8x1 strip: world span 50..70.
        let mut cells = [0u8; 8];
        cells[5] = 1;
        cells[6] = 1;
        let mut grid = TileGrid::from_cells(8, 1, 10.0, 10.0, &cells);

        let mut body = Body::new(0.0, 0.0, 8.0, 10.0);
        body.velocity = Vec2::new(50.0, 0.0);
        integrate(&mut body, None, &TickCtx::new(1.0));
        assert_eq!(body.position().x, 50.0);

        let mut contacts = 0;
        let mut cb = |_: &Body, _: &Body, _: Sides, _: Sides| contacts += 1;
        assert!(grid.collide(&mut body, Some(&mut cb)));

        // Pushed back flush against the pair's outer boundary; the interior
        // seam fires nothing.
        assert_eq!(body.bounds().right(), 50.0);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(contacts, 1);
        assert!(body.is_touching(Sides::RIGHT));
    }

    #[test]
    fn test_falling_body_rests_on_tile_floor() {
        // Floor row at y 20..30 under a 3-cell ceiling-less column.
        let mut grid = TileGrid::from_cells(3, 3, 10.0, 10.0, &[0, 0, 0, 0, 0, 0, 1, 1, 1]);
        let mut body = Body::new(7.0, 0.0, 8.0, 8.0);
        body.velocity = Vec2::new(0.0, 13.0);
        integrate(&mut body, None, &TickCtx::new(1.0));
        // Sunk one unit into the floor, straddling the seam between two
        // floor tiles; resolution lifts it back out through the open tops.
        assert_eq!(body.bounds().bottom(), 21.0);
        assert!(grid.collide(&mut body, None));
        assert_eq!(body.bounds().bottom(), 20.0);
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.is_touching(Sides::DOWN));
    }

    #[test]
    fn test_out_of_grid_ranges_are_skipped() {
        let mut grid = TileGrid::from_cells(2, 2, 10.0, 10.0, &[1, 1, 1, 1]);
        let mut far = Body::new(500.0, 500.0, 10.0, 10.0);
        assert!(!grid.collide(&mut far, None));
        let mut negative = Body::new(-50.0, -50.0, 10.0, 10.0);
        assert!(!grid.collide(&mut negative, None));
    }
}
