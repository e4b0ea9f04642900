//! Skyflight headless runner
//!
//! Builds a small demo scene and drives it with a fixed-timestep loop,
//! logging collisions and particle counts. Pass a settings JSON path as the
//! first argument to override the defaults.

use std::path::Path;

use skyflight::consts::*;
use skyflight::settings::SimSettings;
use skyflight::sim::{
    CrashBox, MovementPolicy, Object, ObjectKind, ObjectPart, ParticleEmitter, PhysicsState,
    ShipControls, Surface, SurfaceRegistry, TickInput, Triangle, Vec3, World, tick,
};

/// Simulated seconds the demo runs for
const DEMO_SECONDS: f32 = 10.0;
/// Wall-clock frame length fed to the accumulator (a 50 Hz display)
const FRAME_DT: f32 = 1.0 / 50.0;

fn quad(name: &str, half: f32, height: f32) -> ObjectPart {
    ObjectPart::new(
        name,
        vec![
            Triangle::new(Vec3::new(-half, 0.0, -half), Vec3::new(half, 0.0, -half), Vec3::new(half, -height, half)),
            Triangle::new(Vec3::new(-half, 0.0, -half), Vec3::new(half, -height, half), Vec3::new(-half, -height, half)),
        ],
    )
}

fn demo_scene(settings: &SimSettings) -> Result<World, skyflight::SceneError> {
    let mut surfaces = SurfaceRegistry::new();
    let tiles = (1..=4)
        .map(|id| {
            let x = id as f32 * 60.0;
            Triangle::new(Vec3::new(x, 40.0, 0.0), Vec3::new(x + 60.0, 40.0, 0.0), Vec3::new(x, 40.0, 60.0))
                .with_tile_id(id)
        })
        .collect();
    let ground = surfaces.insert(Surface::new(Vec3::new(0.0, 40.0, 0.0), tiles));

    let ship = Object::new("ship", ObjectKind::Ship)
        .with_part(quad("hull", 6.0, 3.0))
        .with_crash_box(CrashBox::new(Vec3::new(-6.0, -3.0, -6.0), Vec3::new(6.0, 0.0, 6.0)))
        .with_physics(PhysicsState {
            mass: 1.0,
            friction: 0.03,
            max_speed: 80.0,
            ..PhysicsState::default()
        })
        .with_movement(MovementPolicy::ship(60.0))
        .with_emitter(ParticleEmitter::new(1, settings.particles.clone(), settings.max_particles()));

    let house = Object::new("house", ObjectKind::House)
        .with_part(quad("walls", 15.0, 20.0))
        .with_crash_box(CrashBox::new(Vec3::new(-15.0, -20.0, -15.0), Vec3::new(15.0, 0.0, 15.0)))
        .with_movement(MovementPolicy::House)
        .attached_to(ground, 2);

    let tree = Object::new("tree", ObjectKind::Tree)
        .with_part(quad("crown", 5.0, 25.0))
        .with_crash_box(CrashBox::new(Vec3::new(-3.0, -25.0, -3.0), Vec3::new(3.0, 0.0, 3.0)))
        .with_movement(MovementPolicy::Tree {
            amplitude: 4.0,
            frequency: 0.3,
        })
        .attached_to(ground, 3);

    let seeder = Object::new("seeder", ObjectKind::Seeder)
        .with_part(quad("body", 4.0, 4.0))
        .with_crash_box(CrashBox::new(Vec3::splat(-4.0), Vec3::splat(4.0)))
        .with_movement(MovementPolicy::Seeder {
            heading: 0.0,
            turn_rate: 20.0,
            speed: 15.0,
        })
        .with_emitter(ParticleEmitter::new(2, settings.particles.clone(), settings.max_particles()))
        .roaming(ground, Vec3::new(-120.0, 0.0, -200.0));

    let star = Object::new("star", ObjectKind::Star)
        .with_part(quad("glow", 2.0, 2.0))
        .with_movement(MovementPolicy::Star {
            spin: Vec3::new(0.0, 0.0, 45.0),
        });

    World::new(vec![ship, house, tree, seeder, star], surfaces, settings.clone())
}

fn main() {
    env_logger::init();
    log::info!("Skyflight (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => SimSettings::load(Path::new(&path)),
        None => SimSettings::default(),
    };
    log::info!("Quality preset: {}", settings.quality);

    let mut world = match demo_scene(&settings) {
        Ok(world) => world,
        Err(e) => {
            log::error!("Invalid scene: {e}");
            std::process::exit(1);
        }
    };

    let mut accumulator = 0.0f32;
    let mut elapsed = 0.0f32;
    let mut collisions = 0usize;
    while elapsed < DEMO_SECONDS {
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        // Gentle climb, then a dive toward the house
        let input = TickInput {
            controls: ShipControls {
                pitch: if elapsed < 4.0 { -0.2 } else { 0.4 },
                yaw: 0.1,
                roll: 0.0,
                throttle: if elapsed < 8.0 { 0.8 } else { 0.0 },
            },
        };

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let frame = tick(&mut world, &input, SIM_DT);
            for &(a, b) in &frame.collisions.collided {
                log::info!(
                    "t={:.2}s collision: {} <-> {}",
                    frame.time,
                    world.objects[a].name,
                    world.objects[b].name
                );
            }
            collisions += frame.collisions.collided.len();
            accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    let particles: usize = world
        .objects
        .iter()
        .filter_map(|o| o.emitter.as_ref())
        .map(ParticleEmitter::len)
        .sum();
    log::info!(
        "Finished {} frames ({:.2}s): {collisions} collisions, {particles} live particles",
        world.frame,
        world.time
    );
}
