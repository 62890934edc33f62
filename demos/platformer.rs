use glam::Vec2;
use thud::*;

fn main() {
    let mut world = PhysicsWorld::new(WorldConfig {
        bounds: Aabb::new(0.0, 0.0, 640.0, 480.0),
        max_objects: 4,
        max_levels: 5,
    });

    // Solid floor strip along the bottom row of a 20x15 tile layer.
    let (w, h) = (20usize, 15usize);
    let mut cells = vec![0u8; w * h];
    for x in 0..w {
        cells[(h - 1) * w + x] = 1;
    }
    let mut tiles = TileGrid::from_cells(w, h, 32.0, 32.0, &cells);

    // A falling crate and a drifting platform to land on later.
    let mut falling = Body::new(100.0, 50.0, 24.0, 24.0);
    falling.acceleration = Vec2::new(0.0, 600.0);
    falling.max_velocity = Vec2::new(0.0, 300.0);
    let crate_id = world.insert(falling);

    let mut platform = Body::fixed(280.0, 420.0, 96.0, 16.0);
    platform.velocity = Vec2::new(40.0, 0.0);
    let platform_id = world.insert(platform);

    let ctx = TickCtx::new(1.0 / 60.0);
    let mut tile_contacts = 0usize;
    for tick in 0..240 {
        world.step(&ctx);

        let mut cb = |_a: &Body, _b: &Body, _ta: Sides, _tb: Sides| tile_contacts += 1;
        world.collide_tiles(crate_id, &mut tiles, Some(&mut cb));
        world.overlap(crate_id, None, true, Sides::ANY);

        let body = world.body(crate_id);
        if body.just_touched(Sides::DOWN) {
            println!(
                "tick {:3}: landed, resting at bottom={:.1} vel_y={:.1}",
                tick,
                body.bounds().bottom(),
                body.velocity.y
            );
        }
    }
    println!("tile contacts over 240 ticks: {}", tile_contacts);

    let body = world.body(crate_id);
    println!(
        "final: pos=({:.1},{:.1}) vel=({:.1},{:.1}) grounded={} platform_pos={:.1}",
        body.position().x,
        body.position().y,
        body.velocity.x,
        body.velocity.y,
        body.is_touching(Sides::DOWN),
        world.body(platform_id).position().x
    );
    let stats = world.stats();
    println!(
        "world: bodies={} nodes={} moved_last_step={}",
        stats.bodies, stats.nodes, stats.moved_last_step
    );
}
