//! Narrow-phase penetration test and response between two bodies.
//!
//! Resolution happens on the axis of shallowest overlap (the
//! minimum-translation heuristic); equal penetration on both axes resolves on
//! the x axis so corner hits stay deterministic.

use crate::body::Body;
use crate::types::{BodyId, CollideCallback, Sides};

/// Test `a` against `b` and, when they collide, separate them and merge the
/// colliding velocity component.
///
/// `a` is the moving perspective: an immovable `a` is a no-op (its partner
/// gets its own pass). The two references cannot alias, which covers the
/// same-body case. `collidable_edges` names the edges of `b` that accept
/// contacts; a tile's open-edge mask goes here so interior seams between
/// adjacent solid tiles never produce collisions. Positional and velocity
/// corrections are applied only when `separate` is set and both bodies are
/// solid; bodies already separating keep their motion (anti-sticking) but
/// still report the contact. `a_id`/`b_id`, when known, let a resting contact
/// register the platform for next tick's ride-along.
///
/// Returns whether a collision occurred.
pub fn resolve(
    a: &mut Body,
    b: &mut Body,
    a_id: Option<BodyId>,
    b_id: Option<BodyId>,
    separate: bool,
    collidable_edges: Sides,
    callback: Option<&mut CollideCallback<'_>>,
) -> bool {
    if a.immovable() {
        return false;
    }
    let depth = a.bounds().intersection_depth(b.bounds());
    if depth.x == 0.0 || depth.y == 0.0 {
        return false;
    }

    let on_x = depth.x.abs() <= depth.y.abs();
    let a_touch = if on_x {
        if depth.x > 0.0 { Sides::LEFT } else { Sides::RIGHT }
    } else if depth.y > 0.0 {
        Sides::UP
    } else {
        Sides::DOWN
    };
    let b_touch = a_touch.opposite();

    // The struck edge of `b` must accept contacts.
    if !collidable_edges.contains(b_touch) {
        return false;
    }

    let (axis_depth, rel_vel) = if on_x {
        (depth.x, a.velocity.x - b.velocity.x)
    } else {
        (depth.y, a.velocity.y - b.velocity.y)
    };
    // Unit normal from `b` into `a` is the push direction's sign.
    let normal = if axis_depth > 0.0 { 1.0 } else { -1.0 };

    a.touching.insert(a_touch);
    b.touching.insert(b_touch);
    if a_touch == Sides::DOWN {
        if let Some(id) = b_id {
            a.riding = Some(id);
        }
    } else if a_touch == Sides::UP {
        if let Some(id) = a_id {
            b.riding = Some(id);
        }
    }

    // Already moving apart: keep the contact on record but leave the motion
    // alone so resting pairs do not stick.
    let separating = rel_vel * normal > 0.0;

    if separate && !separating && a.solid && b.solid {
        let inv_a = a.inv_mass();
        let inv_b = b.inv_mass();
        let inv_sum = inv_a + inv_b;
        if inv_sum > 0.0 {
            // Inverse masses share the push; an immovable side absorbs
            // nothing and the whole displacement lands on the other body.
            let push_a = axis_depth * (inv_a / inv_sum);
            let push_b = -axis_depth * (inv_b / inv_sum);
            // Inelastic merge of the axis velocity: the heavier side
            // dominates, an infinite mass wins outright.
            let (vel_a, vel_b) = if on_x {
                (a.velocity.x, b.velocity.x)
            } else {
                (a.velocity.y, b.velocity.y)
            };
            let merged = (vel_a * inv_b + vel_b * inv_a) / inv_sum;

            if inv_a > 0.0 {
                let mut p = a.position();
                if on_x {
                    p.x += push_a;
                    a.set_position(p);
                    a.velocity.x = merged;
                } else {
                    p.y += push_a;
                    a.set_position(p);
                    a.velocity.y = merged;
                }
            }
            if inv_b > 0.0 {
                let mut p = b.position();
                if on_x {
                    p.x += push_b;
                    b.set_position(p);
                    b.velocity.x = merged;
                } else {
                    p.y += push_b;
                    b.set_position(p);
                    b.velocity.y = merged;
                }
            }
        }
    }

    if let Some(cb) = callback {
        cb(a, b, a_touch, b_touch);
    }
    true
}
