//! Per-frame simulation tick
//!
//! Stage order is fixed, each stage consuming what the previous one produced:
//! movement policies, placement, rotation, collision, physics, particles.

use super::collision::CollisionReport;
use super::geometry::{Triangle, Vec3};
use super::movement::{MovementContext, Pose, ShipControls};
use super::placement::{center_geometry, placement_target, resolve_world_anchor};
use super::rotation::{rotate_point_zyx, rotate_zyx_in_place};
use super::state::{ObjectKind, World};

/// Local forward axis of every object
pub const FORWARD: Vec3 = Vec3::Z;

/// Distance behind an object's center where exhaust appears
pub const EXHAUST_OFFSET: f32 = 12.0;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player controls, applied to every ship
    pub controls: ShipControls,
}

/// An object as the renderer should draw it this frame
#[derive(Debug, Clone)]
pub struct RenderedObject {
    /// Index into `World::objects`
    pub index: usize,
    pub anchor: Vec3,
    /// Rotated and anchored triangles of visible parts
    pub triangles: Vec<Triangle>,
    pub has_collided: bool,
}

/// Everything produced by one tick
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Simulation time at the end of the tick
    pub time: f64,
    /// Visible objects only
    pub objects: Vec<RenderedObject>,
    /// Render triangles of visible particles
    pub particles: Vec<Triangle>,
    pub collisions: CollisionReport,
}

/// Advance the world by `dt` seconds
pub fn tick(world: &mut World, input: &TickInput, dt: f32) -> Frame {
    world.time += dt as f64;
    world.frame += 1;
    let now = world.time;

    // Movement policies
    let ctx = MovementContext {
        dt,
        time: now,
        controls: input.controls,
    };
    for object in &mut world.objects {
        if let Some(policy) = object.movement.as_mut() {
            let pose = policy.advance(
                Pose {
                    position: object.position,
                    rotation: object.rotation,
                },
                &ctx,
            );
            object.position = pose.position;
            object.rotation = pose.rotation;
        }
    }

    // Placement
    let anchors: Vec<Option<Vec3>> = world
        .objects
        .iter()
        .map(|o| resolve_world_anchor(o, &world.surfaces, &world.settings))
        .collect();

    // Rotation
    let mut frame = Frame {
        time: now,
        ..Frame::default()
    };
    for (index, (object, anchor)) in world.objects.iter().zip(&anchors).enumerate() {
        let Some(anchor) = *anchor else {
            continue;
        };
        let mut triangles: Vec<Triangle> = object.visible_triangles().cloned().collect();
        rotate_zyx_in_place(&mut triangles, object.rotation);
        center_geometry(&mut triangles, placement_target(object, anchor));
        frame.objects.push(RenderedObject {
            index,
            anchor,
            triangles,
            has_collided: false,
        });
    }

    // Collision
    let was_collided: Vec<bool> = world.objects.iter().map(|o| o.has_collided).collect();
    frame.collisions = world
        .collision
        .detect_collisions(&mut world.objects, &anchors, now);
    for rendered in &mut frame.objects {
        rendered.has_collided = world.objects[rendered.index].has_collided;
    }

    // Physics
    let max_thrust = world.settings.max_thrust;
    for object in &mut world.objects {
        let impact = object.last_impact.take();
        let Some(physics) = object.physics.as_mut() else {
            continue;
        };
        if object.kind == ObjectKind::Ship {
            physics.thrust = if object.has_collided {
                0.0
            } else {
                input.controls.throttle.clamp(0.0, 1.0) * max_thrust
            };
        }
        if let Some(impact) = impact {
            physics.bounce(Vec3::ZERO, Some(impact));
        }
        let forward = rotate_point_zyx(FORWARD, object.rotation);
        let mut position = physics.apply_thrust(object.position, dt, forward);
        position = if physics.gravity_strength > 0.0 {
            physics.apply_forces(position, dt)
        } else {
            physics.apply_drag_force(position, dt)
        };
        object.position = position;
    }

    // Particles
    for (i, object) in world.objects.iter_mut().enumerate() {
        let center = anchors[i].map(|anchor| placement_target(object, anchor));
        let thrust = object.physics.as_ref().map_or(0.0, |p| p.thrust);
        let Some(emitter) = object.emitter.as_mut() else {
            continue;
        };
        if let Some(center) = center {
            if object.has_collided && !was_collided[i] {
                log::info!("{:?} exploded at {center}", object.name);
                emitter.spawn(Vec3::ZERO, center, object.world_offset, max_thrust, true);
            } else if !object.has_collided {
                let exhaust = -rotate_point_zyx(FORWARD, object.rotation);
                let start = center + exhaust * EXHAUST_OFFSET;
                emitter.spawn(exhaust, start, object.world_offset, thrust, false);
            }
        }
        emitter.advance(dt);
        frame
            .particles
            .extend(emitter.visible().map(|p| p.triangle.clone()));
    }

    log::trace!(
        "Frame {} t={now:.3}: {} objects, {} particles, {} collisions",
        world.frame,
        frame.objects.len(),
        frame.particles.len(),
        frame.collisions.collided.len()
    );
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::SimSettings;
    use crate::sim::geometry::{CrashBox, ObjectPart};
    use crate::sim::movement::MovementPolicy;
    use crate::sim::particles::ParticleEmitter;
    use crate::sim::physics::PhysicsState;
    use crate::sim::placement::SurfaceRegistry;
    use crate::sim::state::Object;

    fn ship() -> Object {
        let settings = SimSettings::default();
        Object::new("ship", ObjectKind::Ship)
            .with_part(ObjectPart::new(
                "hull",
                vec![Triangle::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 10.0))],
            ))
            .with_crash_box(CrashBox::new(Vec3::new(-5.0, -2.0, 0.0), Vec3::new(5.0, 2.0, 10.0)))
            .with_physics(PhysicsState {
                mass: 1.0,
                friction: 0.05,
                max_speed: 50.0,
                ..PhysicsState::default()
            })
            .with_movement(MovementPolicy::ship(90.0))
            .with_emitter(ParticleEmitter::new(3, settings.particles.clone(), settings.max_particles()))
    }

    #[test]
    fn test_throttle_moves_ship_and_emits_exhaust() {
        let mut world = World::new(vec![ship()], SurfaceRegistry::new(), SimSettings::default()).unwrap();
        let input = TickInput {
            controls: ShipControls {
                throttle: 1.0,
                ..Default::default()
            },
        };
        let mut frame = Frame::default();
        for _ in 0..30 {
            frame = tick(&mut world, &input, SIM_DT);
        }
        let ship = &world.objects[0];
        assert!(ship.position.z > 0.0);
        assert!(ship.physics.as_ref().unwrap().velocity.z > 0.0);
        assert!(!ship.emitter.as_ref().unwrap().is_empty());
        assert!(!frame.particles.is_empty());
        assert_eq!(frame.objects.len(), 1);
        assert_eq!(world.frame, 30);

        // Cutting the engine retires the exhaust at once
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert!(world.objects[0].emitter.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_rendered_geometry_follows_rotation() {
        let mut world = World::new(vec![ship()], SurfaceRegistry::new(), SimSettings::default()).unwrap();
        let input = TickInput {
            controls: ShipControls {
                yaw: 1.0,
                ..Default::default()
            },
        };
        let frame = tick(&mut world, &input, 1.0);
        assert_eq!(world.objects[0].rotation.y, 90.0);
        let tri = &frame.objects[0].triangles[0];
        // Nose (0,0,10) yawed 90 degrees points along +X
        assert!(tri.vert3.x > tri.vert1.x.max(tri.vert2.x));
        // Authoritative geometry is untouched
        assert_eq!(world.objects[0].parts[0].triangles[0].vert3, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_tick_is_deterministic() {
        let build = || World::new(vec![ship()], SurfaceRegistry::new(), SimSettings::default()).unwrap();
        let (mut a, mut b) = (build(), build());
        let input = TickInput {
            controls: ShipControls {
                throttle: 0.7,
                pitch: 0.3,
                ..Default::default()
            },
        };
        for _ in 0..20 {
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }
        assert_eq!(a.objects[0].position, b.objects[0].position);
        let ea = a.objects[0].emitter.as_ref().unwrap();
        let eb = b.objects[0].emitter.as_ref().unwrap();
        assert_eq!(ea.len(), eb.len());
    }
}
