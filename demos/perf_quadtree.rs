use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use thud::*;

fn main() {
    let mut world = PhysicsWorld::new(WorldConfig {
        bounds: Aabb::new(0.0, 0.0, 2048.0, 2048.0),
        max_objects: 8,
        max_levels: 6,
    });

    // Scatter a population; roughly a quarter of it drifts, the rest sits
    // still so incremental relocation has something to skip.
    let mut rng = StdRng::seed_from_u64(42);
    let n_bodies = 2_000usize;
    let mut ids = Vec::with_capacity(n_bodies);
    for i in 0..n_bodies {
        let mut body = Body::new(
            rng.gen_range(0.0..2000.0),
            rng.gen_range(0.0..2000.0),
            rng.gen_range(4.0..24.0),
            rng.gen_range(4.0..24.0),
        );
        if i % 4 == 0 {
            body.velocity = Vec2::new(rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0));
        }
        ids.push(world.insert(body));
    }

    let ctx = TickCtx::new(1.0 / 60.0);
    let n_ticks = 600usize;

    let t0 = Instant::now();
    let mut relocations = 0usize;
    for _ in 0..n_ticks {
        world.step(&ctx);
        relocations += world.stats().moved_last_step;
    }
    let dt = t0.elapsed().as_secs_f64();
    println!(
        "step: ticks={} bodies={} secs={:.3} throughput={:.0} ticks/s relocations={}",
        n_ticks,
        n_bodies,
        dt,
        n_ticks as f64 / dt,
        relocations
    );

    let t1 = Instant::now();
    let mut collisions = 0usize;
    for _ in 0..20 {
        for &id in &ids {
            if world.overlap(id, None, true, Sides::ANY) {
                collisions += 1;
            }
        }
    }
    let dt2 = t1.elapsed().as_secs_f64();
    let n_queries = 20 * n_bodies;
    println!(
        "overlap: queries={} secs={:.3} throughput={:.0} queries/s collisions={}",
        n_queries,
        dt2,
        n_queries as f64 / dt2,
        collisions
    );

    let checksum: f32 = ids.iter().map(|&id| world.body(id).position().x).sum();
    let stats = world.stats();
    println!(
        "world: bodies={} nodes={} checksum={:.1}",
        stats.bodies, stats.nodes, checksum
    );
}
