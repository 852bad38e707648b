//! Collision system - merger and disruption outcomes between massive bodies.
//!
//! Runs once per substep after integration. Bodies are scanned all-pairs in
//! ascending id order (O(n²), the body count stays small). A pair touches
//! when its separation is within the sum of the kind-dependent effective
//! radii. Each touching pair gets exactly one outcome based on its
//! unordered kind pair; a body consumed by an outcome takes no further part
//! in the substep.
//!
//! ## Outcome table
//!
//! | Pair                          | Outcome                                   |
//! |-------------------------------|-------------------------------------------|
//! | blackHole + blackHole         | merged black hole, `waveBurst`            |
//! | neutronStar + neutronStar     | black hole or neutron star, `kilonova`    |
//! | blackHole + star/planet       | partial accretion, `accretionDisk`        |
//! | star + star                   | merged star, `explosion`                  |
//! | planet + planet/star          | merged planet or star, `debrisRing`       |
//! | anything else                 | pass through                              |
//!
//! Mutations are applied through `Commands`, so they become visible to the
//! next substep.

use crate::components::*;
use crate::config::SimConfig;
use crate::constants::*;
use crate::effects::{Effect, EffectBus, EffectKind};
use crate::systems::tick::{IdAllocator, SimStats, SimTime};
use crate::vector::{midpoint, momentum_velocity, Vec3};
use bevy_ecs::prelude::*;

/// Outcome class for an unordered pair of body kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    BlackHoleMerger,
    NeutronStarMerger,
    TidalDisruption,
    StellarMerger,
    PlanetaryMerger,
    /// No rule for this pair; the bodies overlap without interacting.
    PassThrough,
}

pub fn classify(a: BodyKind, b: BodyKind) -> CollisionOutcome {
    use BodyKind::*;
    match (a, b) {
        (BlackHole, BlackHole) => CollisionOutcome::BlackHoleMerger,
        (NeutronStar, NeutronStar) => CollisionOutcome::NeutronStarMerger,
        (BlackHole, Star | Planet) | (Star | Planet, BlackHole) => CollisionOutcome::TidalDisruption,
        (Star, Star) => CollisionOutcome::StellarMerger,
        (Planet, Planet) | (Planet, Star) | (Star, Planet) => CollisionOutcome::PlanetaryMerger,
        _ => CollisionOutcome::PassThrough,
    }
}

/// A massive body as seen by the resolver.
#[derive(Debug, Clone)]
pub struct Participant {
    pub entity: Entity,
    pub id: EntityId,
    pub body: MassBody,
    pub position: Vec3,
    pub velocity: Vec3,
    pub color: String,
}

impl Participant {
    fn radius(&self) -> f64 {
        self.body.radius()
    }

    fn momentum(&self) -> Vec3 {
        self.velocity * self.body.mass
    }
}

/// A deferred change to the body population.
#[derive(Debug, Clone)]
pub enum Mutation {
    Despawn(Entity),
    Spawn {
        id: EntityId,
        body: MassBody,
        position: Vec3,
        velocity: Vec3,
        color: String,
    },
    /// In-place update of a surviving body.
    Update {
        entity: Entity,
        body: MassBody,
        velocity: Vec3,
    },
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub mutations: Vec<Mutation>,
    pub effects: Vec<Effect>,
    pub resolved: u64,
    pub unresolved: u64,
}

/// True when the two bodies are within the sum of their effective radii.
#[inline]
pub fn in_contact(a: &Participant, b: &Participant) -> bool {
    a.position.distance(b.position) <= a.radius() + b.radius()
}

/// Resolve every contact among `bodies`, which must be sorted by id.
pub fn resolve_collisions(
    bodies: &[Participant],
    config: &SimConfig,
    ids: &mut IdAllocator,
    now: f64,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut consumed = vec![false; bodies.len()];

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            if consumed[i] {
                break;
            }
            if consumed[j] {
                continue;
            }
            let (a, b) = (&bodies[i], &bodies[j]);
            if !in_contact(a, b) {
                continue;
            }

            let outcome = classify(a.body.kind, b.body.kind);
            let mut ctx = OutcomeContext {
                resolution: &mut resolution,
                ids: &mut *ids,
                now,
            };
            match outcome {
                CollisionOutcome::BlackHoleMerger => ctx.black_hole_merger(a, b),
                CollisionOutcome::NeutronStarMerger => ctx.neutron_star_merger(a, b, config.tov_threshold),
                CollisionOutcome::TidalDisruption if a.body.is_black_hole() => ctx.tidal_disruption(a, b),
                CollisionOutcome::TidalDisruption => ctx.tidal_disruption(b, a),
                CollisionOutcome::StellarMerger => ctx.stellar_merger(a, b),
                CollisionOutcome::PlanetaryMerger => ctx.planetary_merger(a, b),
                CollisionOutcome::PassThrough => {
                    tracing::trace!(a = %a.id, b = %b.id, kind_a = %a.body.kind, kind_b = %b.body.kind, "contact without outcome rule");
                    resolution.unresolved += 1;
                    continue;
                }
            }
            tracing::info!(
                ?outcome,
                a = %a.id,
                b = %b.id,
                kind_a = %a.body.kind,
                kind_b = %b.body.kind,
                mass_a = a.body.mass,
                mass_b = b.body.mass,
                "collision"
            );
            resolution.resolved += 1;
            consumed[i] = true;
            consumed[j] = true;
        }
    }
    resolution
}

struct OutcomeContext<'a> {
    resolution: &'a mut Resolution,
    ids: &'a mut IdAllocator,
    now: f64,
}

/// Spin rule for compact remnants: sum of the spin-Y components.
fn remnant_spin(a: &Participant, b: &Participant) -> Vec3 {
    clamp_spin(Vec3::new(0.0, a.body.spin.y + b.body.spin.y, 0.0))
}

impl OutcomeContext<'_> {
    fn emit(&mut self, ttl: f64, kind: EffectKind) {
        let id = self.ids.allocate();
        self.resolution.effects.push(Effect {
            id,
            created_at: self.now,
            ttl,
            kind,
        });
    }

    /// Remove both bodies and spawn a perfectly inelastic remnant at their
    /// midpoint. Name and color come from the heavier input.
    fn merge(&mut self, a: &Participant, b: &Participant, kind: BodyKind, spin: Vec3) -> (EntityId, MassBody, Vec3) {
        let total = a.body.mass + b.body.mass;
        let heavier = if b.body.mass > a.body.mass { b } else { a };
        let id = self.ids.allocate();
        let body = MassBody::new(heavier.body.name.clone(), total, kind).with_spin(spin);
        let position = midpoint(a.position, b.position);
        let velocity = (a.momentum() + b.momentum()) / total;

        self.resolution.mutations.push(Mutation::Despawn(a.entity));
        self.resolution.mutations.push(Mutation::Despawn(b.entity));
        self.resolution.mutations.push(Mutation::Spawn {
            id,
            body: body.clone(),
            position,
            velocity,
            color: heavier.color.clone(),
        });
        (id, body, position)
    }

    fn black_hole_merger(&mut self, a: &Participant, b: &Participant) {
        let (_, _, origin) = self.merge(a, b, BodyKind::BlackHole, remnant_spin(a, b));
        let reduced_mass = a.body.mass * b.body.mass / (a.body.mass + b.body.mass);
        self.emit(
            WAVE_BURST_TTL,
            EffectKind::WaveBurst {
                origin,
                amplitude: reduced_mass * WAVE_AMPLITUDE_SCALE,
            },
        );
    }

    fn neutron_star_merger(&mut self, a: &Participant, b: &Participant, tov_threshold: f64) {
        let total = a.body.mass + b.body.mass;
        let kind = if total >= tov_threshold {
            BodyKind::BlackHole
        } else {
            BodyKind::NeutronStar
        };
        let radius = a.radius() + b.radius();
        let (_, _, origin) = self.merge(a, b, kind, remnant_spin(a, b));
        self.emit(KILONOVA_TTL, EffectKind::Kilonova { origin, radius });
    }

    /// The black hole survives, accreting part of the victim.
    fn tidal_disruption(&mut self, hole: &Participant, victim: &Participant) {
        let velocity = momentum_velocity(hole.body.mass, hole.velocity, victim.body.mass, victim.velocity);
        let mut body = hole.body.clone();
        body.mass += ACCRETION_EFFICIENCY * victim.body.mass;
        body.set_spin(hole.body.spin + victim.body.spin * SPIN_TRANSFER);

        self.resolution.mutations.push(Mutation::Despawn(victim.entity));
        self.resolution.mutations.push(Mutation::Update {
            entity: hole.entity,
            body,
            velocity,
        });
        self.emit(
            ACCRETION_DISK_TTL,
            EffectKind::AccretionDisk {
                mass_id: hole.id,
                radius: victim.radius(),
            },
        );
        self.emit(
            TIDAL_STREAM_TTL,
            EffectKind::TidalStream {
                mass_id: hole.id,
                origin: victim.position,
                length: victim.position.distance(hole.position),
            },
        );
    }

    fn stellar_merger(&mut self, a: &Participant, b: &Participant) {
        let (_, body, origin) = self.merge(a, b, BodyKind::Star, Vec3::ZERO);
        self.emit(
            EXPLOSION_TTL,
            EffectKind::Explosion {
                origin,
                radius: body.radius(),
            },
        );
    }

    fn planetary_merger(&mut self, a: &Participant, b: &Participant) {
        let kind = if a.body.kind == BodyKind::Planet && b.body.kind == BodyKind::Planet {
            BodyKind::Planet
        } else {
            BodyKind::Star
        };
        let (id, body, _) = self.merge(a, b, kind, Vec3::ZERO);
        let r = body.radius();
        self.emit(
            DEBRIS_RING_TTL,
            EffectKind::DebrisRing {
                mass_id: id,
                inner: r * 1.2,
                outer: r * 2.0,
            },
        );
    }
}

/// System that detects contacts and applies merger outcomes.
pub fn collision_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    time: Res<SimTime>,
    mut ids: ResMut<IdAllocator>,
    mut bus: ResMut<EffectBus>,
    mut stats: ResMut<SimStats>,
    query: Query<(Entity, &EntityId, &MassBody, &Position, &Velocity, &ColorTag)>,
) {
    let mut bodies: Vec<Participant> = query
        .iter()
        .map(|(entity, id, body, pos, vel, color)| Participant {
            entity,
            id: *id,
            body: body.clone(),
            position: pos.0,
            velocity: vel.0,
            color: color.0.clone(),
        })
        .collect();
    if bodies.len() < 2 {
        return;
    }
    bodies.sort_by_key(|b| b.id);

    let resolution = resolve_collisions(&bodies, &config, &mut ids, time.elapsed);
    stats.resolved_collisions += resolution.resolved;
    stats.unresolved_contacts += resolution.unresolved;

    for mutation in resolution.mutations {
        match mutation {
            Mutation::Despawn(entity) => commands.entity(entity).despawn(),
            Mutation::Spawn {
                id,
                body,
                position,
                velocity,
                color,
            } => {
                commands.spawn(MassBundle {
                    id,
                    body,
                    position: Position(position),
                    velocity: Velocity(velocity),
                    color: ColorTag(color),
                });
            }
            Mutation::Update { entity, body, velocity } => {
                commands.entity(entity).insert((body, Velocity(velocity)));
            }
        }
    }
    for effect in resolution.effects {
        bus.push(effect);
    }
}
