//! Integrator systems - advance each entity kind by one fixed substep.
//!
//! Every moving kind uses semi-implicit (symplectic) Euler: acceleration at
//! the current position, velocity first, then position with the new
//! velocity. All field reads go through `MassField`, captured once at the
//! start of the substep, so no update within a substep sees another's
//! result.

use crate::components::*;
use crate::config::SimConfig;
use crate::field::{self, MassField, MassSample};
use crate::patch::photon_velocity;
use crate::systems::tick::DeltaTime;
use crate::vector::Vec3;
use bevy_ecs::prelude::*;

/// Capture the mass snapshot for this substep, ordered by id.
pub fn capture_mass_field_system(
    mut mass_field: ResMut<MassField>,
    query: Query<(&EntityId, &MassBody, &Position, &Velocity)>,
) {
    mass_field.bodies.clear();
    mass_field.bodies.extend(query.iter().map(|(id, body, pos, vel)| MassSample {
        id: *id,
        mass: body.mass,
        position: pos.0,
        velocity: vel.0,
        spin: body.spin,
        kind: body.kind,
    }));
    mass_field.bodies.sort_by_key(|b| b.id);
}

/// Photon: gravity bends the direction, speed stays at `C_SIM`.
pub fn step_photon(position: &mut Vec3, velocity: &mut Vec3, bodies: &[MassSample], dt: f64) {
    let a = field::acceleration(*position, bodies);
    let mut v = *velocity + a * dt;
    v += field::frame_dragging_delta_v(*position, v, bodies, dt);
    *velocity = photon_velocity(v, *velocity);
    *position += *velocity * dt;
}

/// Massive body: gravity from every other body.
pub fn step_mass(id: EntityId, position: &mut Vec3, velocity: &mut Vec3, bodies: &[MassSample], dt: f64) {
    let a = field::acceleration_excluding(*position, bodies, Some(id));
    *velocity += a * dt;
    *position += *velocity * dt;
}

/// Test body: gravity, optional precession term, then frame dragging.
pub fn step_test_body(
    position: &mut Vec3,
    velocity: &mut Vec3,
    bodies: &[MassSample],
    dt: f64,
    precession_strength: Option<f64>,
) {
    let mut a = field::acceleration(*position, bodies);
    if let Some(strength) = precession_strength {
        a += field::precession_acceleration(*position, *velocity, bodies, strength);
    }
    *velocity += a * dt;
    *velocity += field::frame_dragging_delta_v(*position, *velocity, bodies, dt);
    *position += *velocity * dt;
}

/// Clock: proper time advances at the local dilation rate.
pub fn step_clock(clock: &mut GravClock, position: Vec3, bodies: &[MassSample], dt: f64) {
    clock.proper_time += dt * field::time_dilation_factor(position, bodies);
}

pub fn photon_step_system(
    dt: Res<DeltaTime>,
    mass_field: Res<MassField>,
    mut query: Query<(&mut Position, &mut Velocity), With<Photon>>,
) {
    for (mut pos, mut vel) in query.iter_mut() {
        step_photon(&mut pos.0, &mut vel.0, &mass_field.bodies, dt.0);
    }
}

pub fn clock_step_system(
    dt: Res<DeltaTime>,
    mass_field: Res<MassField>,
    mut query: Query<(&mut GravClock, &Position)>,
) {
    for (mut clock, pos) in query.iter_mut() {
        step_clock(&mut clock, pos.0, &mass_field.bodies, dt.0);
    }
}

pub fn mass_step_system(
    dt: Res<DeltaTime>,
    mass_field: Res<MassField>,
    mut query: Query<(&EntityId, &mut Position, &mut Velocity), With<MassBody>>,
) {
    for (id, mut pos, mut vel) in query.iter_mut() {
        step_mass(*id, &mut pos.0, &mut vel.0, &mass_field.bodies, dt.0);
    }
}

pub fn test_body_step_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mass_field: Res<MassField>,
    mut query: Query<(&TestBody, &mut Position, &mut Velocity)>,
) {
    for (body, mut pos, mut vel) in query.iter_mut() {
        let strength = body
            .precesses(config.precession_enabled)
            .then_some(config.precession_strength);
        step_test_body(&mut pos.0, &mut vel.0, &mass_field.bodies, dt.0, strength);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::C_SIM;
    use crate::field::orbital_elements;

    fn central(mass: f64) -> Vec<MassSample> {
        vec![MassSample {
            id: EntityId(1),
            mass,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            spin: Vec3::ZERO,
            kind: BodyKind::Star,
        }]
    }

    #[test]
    fn test_photon_speed_invariant_under_deflection() {
        let mut bodies = central(50.0);
        bodies[0].spin = Vec3::new(0.0, 0.9, 0.0);
        let mut p = Vec3::new(-10.0, 0.0, 0.3);
        let mut v = Vec3::new(C_SIM, 0.0, 0.0);
        for _ in 0..500 {
            step_photon(&mut p, &mut v, &bodies, 0.01);
            assert!((v.length() - C_SIM).abs() < 1e-9);
        }
        // deflected toward the mass
        assert!(v.z.abs() > 1e-3);
    }

    #[test]
    fn test_semi_implicit_euler_order() {
        let bodies = central(20.0);
        let mut p = Vec3::new(5.0, 0.0, 0.0);
        let mut v = Vec3::ZERO;
        let a = field::acceleration(p, &bodies);
        step_test_body(&mut p, &mut v, &bodies, 0.1, None);
        assert_eq!(v, a * 0.1);
        // position moved with the updated velocity
        assert!((p - (Vec3::new(5.0, 0.0, 0.0) + a * 0.01)).length() < 1e-12);
    }

    #[test]
    fn test_mass_excludes_itself() {
        let bodies = central(20.0);
        let mut p = Vec3::ZERO;
        let mut v = Vec3::new(1.0, 0.0, 0.0);
        step_mass(EntityId(1), &mut p, &mut v, &bodies, 0.5);
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_clock_rate() {
        let bodies = central(20.0);
        let mut clock = GravClock::default();
        let pos = Vec3::new(5.0, 0.0, 0.0);
        step_clock(&mut clock, pos, &bodies, 0.016);
        let expected = 0.016 * field::time_dilation_factor(pos, &bodies);
        assert!((clock.proper_time - expected).abs() < 1e-15);
        assert!(clock.proper_time < 0.016);
    }

    #[test]
    fn test_precession_changes_orbit() {
        let bodies = central(20.0);
        let run = |strength: Option<f64>| {
            let mut p = Vec3::new(8.0, 0.0, 0.0);
            let mut v = Vec3::new(0.0, 0.0, 1.3);
            for _ in 0..4000 {
                step_test_body(&mut p, &mut v, &bodies, 0.005, strength);
            }
            orbital_elements(p, v, 20.0).unwrap().eccentricity_vector
        };
        let plain = run(None);
        let drifted = run(Some(0.1));
        assert!((drifted - plain).length() > 1e-3);
    }

    #[test]
    fn test_systems_read_pre_substep_snapshot() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.1));
        world.insert_resource(MassField::default());
        world.insert_resource(SimConfig::default());

        world.spawn((
            EntityId(1),
            MassBody::new("a", 10.0, BodyKind::Star),
            Position::new(-5.0, 0.0, 0.0),
            Velocity::default(),
        ));
        world.spawn((
            EntityId(2),
            MassBody::new("b", 10.0, BodyKind::Star),
            Position::new(5.0, 0.0, 0.0),
            Velocity::default(),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems((capture_mass_field_system, mass_step_system).chain());
        schedule.run(&mut world);

        // symmetric pair: both see the other's start position
        let mut query = world.query::<(&EntityId, &Velocity)>();
        let mut vels: Vec<_> = query.iter(&world).map(|(id, v)| (*id, v.0)).collect();
        vels.sort_by_key(|(id, _)| *id);
        assert!(vels[0].1.x > 0.0);
        assert!((vels[0].1.x + vels[1].1.x).abs() < 1e-15);
    }
}
