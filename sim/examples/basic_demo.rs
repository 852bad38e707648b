//! Basic demonstration of the relativity sandbox.
//!
//! Run with: cargo run --example basic_demo
//!
//! Reads `RELSIM_*` overrides from the environment (or a `.env` file) and
//! honours `RUST_LOG` / `LOG_FORMAT=json`.

use relsim::{BodyKind, MassPatch, PhotonPatch, SimConfig, SimWorld, TestBodyPatch};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = SimConfig::from_env();
    tracing::info!(?config, "starting demo");
    let mut sim = SimWorld::with_config(config);

    // two black holes on a closing course
    sim.spawn_mass(
        MassPatch::new()
            .name("Primary")
            .mass(15.0)
            .kind(BodyKind::BlackHole)
            .position(-5.0, 0.0, 0.0)
            .velocity(1.0, 0.0, 0.0)
            .spin(0.0, 0.6, 0.0),
    );
    sim.spawn_mass(
        MassPatch::new()
            .name("Secondary")
            .mass(12.0)
            .kind(BodyKind::BlackHole)
            .position(5.0, 0.0, 0.0)
            .velocity(-1.0, 0.0, 0.0),
    );
    // a star falling in from further out
    sim.spawn_mass(
        MassPatch::new()
            .name("Wanderer")
            .mass(2.0)
            .kind(BodyKind::Star)
            .position(0.0, 0.0, 18.0)
            .velocity(0.0, 0.0, -1.5),
    );
    sim.spawn_photon(PhotonPatch::new().position(-15.0, 0.0, 1.5));
    sim.spawn_test_body(TestBodyPatch::new().position(0.0, 0.0, -12.0).velocity(1.6, 0.0, 0.0));

    // 20 seconds at 60 frames per second
    let frame = 1.0 / 60.0;
    for frame_index in 0..1200 {
        sim.advance(frame);

        // effects are played for their TTL then released
        for id in sim.expired_effects() {
            sim.remove_effect(id);
        }

        if (frame_index + 1) % 120 == 0 {
            print_summary(&mut sim);
        }
    }

    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::error!(%err, "failed to serialize snapshot"),
    }

    #[cfg(feature = "profile")]
    sim.profiler().log_summary();
}

fn print_summary(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    tracing::info!(
        tick = snapshot.tick,
        time = snapshot.time,
        masses = snapshot.masses.len(),
        effects = snapshot.effects.len(),
        collisions = snapshot.stats.resolved_collisions,
        "progress"
    );
    for mass in &snapshot.masses {
        if let Some(inspection) = sim.inspect_mass(mass.id) {
            tracing::info!(
                id = %mass.id,
                name = %mass.name,
                kind = %mass.kind,
                mass = mass.mass,
                bound = ?inspection.orbit.map(|o| o.is_bound),
                "body"
            );
        }
    }
}
