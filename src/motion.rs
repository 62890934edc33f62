//! Per-tick motion integration.
//!
//! Advances one body's velocity and position and produces the swept movement
//! bounds fed to the broad phase. The sweep is the union of the current box
//! and the box one velocity step ahead; it is a single-step linear
//! approximation for candidate selection and does not guarantee
//! tunneling-free resolution for very fast bodies.

use glam::Vec2;

use crate::body::Body;
use crate::types::{Sides, TickCtx};

/// Velocity/acceleration snapshot of the platform a body is riding, taken by
/// the world before the per-body pass so integration borrows one body at a
/// time.
#[derive(Copy, Clone, Debug)]
pub struct PlatformRef {
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

/// Advance `body` by one tick. Returns true if the position changed.
///
/// `platform` is the contact the previous resolution pass left the body
/// resting on, if any: it suppresses deceleration along axes the platform is
/// already carrying the body on, and feeds the ride-along velocity
/// inheritance after the position step.
pub fn integrate(body: &mut Body, platform: Option<PlatformRef>, ctx: &TickCtx) -> bool {
    let dt = ctx.dt;

    // Rotate contact state; this tick's resolution pass rebuilds it.
    body.touching_prev = body.touching;
    body.touching = Sides::NONE;
    body.riding = None;

    let mut vel = body.velocity;
    vel.x = advance_axis(
        vel.x,
        body.acceleration.x,
        body.deceleration.x,
        platform.map(|p| p.velocity.x),
        dt,
    );
    vel.y = advance_axis(
        vel.y,
        body.acceleration.y,
        body.deceleration.y,
        platform.map(|p| p.velocity.y),
        dt,
    );

    if body.max_velocity.x != 0.0 {
        vel.x = vel.x.clamp(-body.max_velocity.x, body.max_velocity.x);
    }
    if body.max_velocity.y != 0.0 {
        vel.y = vel.y.clamp(-body.max_velocity.y, body.max_velocity.y);
    }

    body.velocity = vel;
    body.prev_position = body.position;
    body.position += vel * dt;
    body.bounds.set_position(body.position);
    body.movement_bounds = body.bounds.span(&body.bounds.translated(vel * dt));
    let moved = body.position != body.prev_position;

    // Ride-along post-step: inherit the platform's motion for the next tick
    // unless the body already outruns it.
    if let Some(p) = platform {
        body.velocity.x = inherit_axis(body.velocity.x, p.velocity.x, p.acceleration.x, dt);
        body.velocity.y = inherit_axis(body.velocity.y, p.velocity.y, p.acceleration.y, dt);
    }

    moved
}

fn advance_axis(v: f32, accel: f32, decel: f32, platform_v: Option<f32>, dt: f32) -> f32 {
    if accel != 0.0 {
        return v + accel * dt;
    }
    if decel == 0.0 || v == 0.0 {
        return v;
    }
    // A platform moving the same direction at equal-or-greater speed keeps
    // the body from braking against its own ride.
    if let Some(pv) = platform_v {
        if pv != 0.0 && (pv > 0.0) == (v > 0.0) && pv.abs() >= v.abs() {
            return v;
        }
    }
    let drop = decel * dt;
    if v > 0.0 { (v - drop).max(0.0) } else { (v + drop).min(0.0) }
}

fn inherit_axis(v: f32, platform_v: f32, platform_a: f32, dt: f32) -> f32 {
    let ride = platform_v + platform_a * dt;
    if ride == 0.0 {
        return v;
    }
    // Already faster than the platform in its direction of travel.
    if v != 0.0 && (v > 0.0) == (ride > 0.0) && v.abs() > ride.abs() {
        return v;
    }
    ride
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick() -> TickCtx {
        TickCtx::new(1.0)
    }

    #[test]
    fn test_deceleration_clamps_at_zero() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0);
        b.velocity = Vec2::new(100.0, 0.0);
        b.deceleration = Vec2::new(50.0, 0.0);
        integrate(&mut b, None, &tick());
        assert_eq!(b.velocity.x, 50.0);
        integrate(&mut b, None, &tick());
        assert_eq!(b.velocity.x, 0.0);
        integrate(&mut b, None, &tick());
        assert_eq!(b.velocity.x, 0.0);
    }

    #[test]
    fn test_deceleration_never_flips_sign() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0);
        b.velocity = Vec2::new(-30.0, 0.0);
        b.deceleration = Vec2::new(50.0, 0.0);
        integrate(&mut b, None, &tick());
        assert_eq!(b.velocity.x, 0.0);
    }

    #[test]
    fn test_acceleration_wins_over_deceleration_and_clamps() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0);
        b.acceleration = Vec2::new(10.0, 0.0);
        b.deceleration = Vec2::new(50.0, 0.0);
        b.max_velocity = Vec2::new(15.0, 0.0);
        integrate(&mut b, None, &tick());
        assert_eq!(b.velocity.x, 10.0);
        integrate(&mut b, None, &tick());
        assert_eq!(b.velocity.x, 15.0);
    }

    #[test]
    fn test_position_step_and_movement_bounds() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0);
        b.velocity = Vec2::new(50.0, 0.0);
        let moved = integrate(&mut b, None, &tick());
        assert!(moved);
        assert_eq!(b.position(), Vec2::new(50.0, 0.0));
        assert_eq!(b.prev_position(), Vec2::ZERO);
        // Spans the post-step box and one further velocity step.
        assert_eq!(b.movement_bounds().left(), 50.0);
        assert_eq!(b.movement_bounds().right(), 110.0);
        assert_eq!(b.movement_bounds().bottom(), 10.0);
    }

    #[test]
    fn test_stationary_body_reports_unmoved() {
        let mut b = Body::new(5.0, 5.0, 10.0, 10.0);
        assert!(!integrate(&mut b, None, &tick()));
        assert_eq!(b.movement_bounds(), b.bounds());
    }

    #[test]
    fn test_platform_velocity_inheritance() {
        let platform = PlatformRef {
            velocity: Vec2::new(30.0, 0.0),
            acceleration: Vec2::new(2.0, 0.0),
        };
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0);
        b.velocity = Vec2::new(10.0, 0.0);
        integrate(&mut b, Some(platform), &tick());
        assert_eq!(b.velocity.x, 32.0);

        // A body already outrunning the platform keeps its own speed.
        let mut fast = Body::new(0.0, 0.0, 10.0, 10.0);
        fast.velocity = Vec2::new(40.0, 0.0);
        integrate(&mut fast, Some(platform), &tick());
        assert_eq!(fast.velocity.x, 40.0);
    }

    #[test]
    fn test_platform_suppresses_deceleration() {
        let platform = PlatformRef {
            velocity: Vec2::new(20.0, 0.0),
            acceleration: Vec2::ZERO,
        };
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0);
        b.velocity = Vec2::new(20.0, 0.0);
        b.deceleration = Vec2::new(50.0, 0.0);
        integrate(&mut b, Some(platform), &tick());
        assert_eq!(b.velocity.x, 20.0);

        // Without the platform the same tick would brake to zero.
        let mut alone = Body::new(0.0, 0.0, 10.0, 10.0);
        alone.velocity = Vec2::new(20.0, 0.0);
        alone.deceleration = Vec2::new(50.0, 0.0);
        integrate(&mut alone, None, &tick());
        assert_eq!(alone.velocity.x, 0.0);
    }

    #[test]
    fn test_touch_flags_rotate_and_ride_is_consumed() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0);
        b.touching.insert(Sides::DOWN);
        b.riding = Some(crate::types::BodyId(7));
        integrate(&mut b, None, &tick());
        assert!(b.touching().is_empty());
        assert!(b.was_touching(Sides::DOWN));
        assert!(b.riding().is_none());
    }
}
