//! Particle lifecycle
//!
//! Emitters spawn short-lived particles for exhaust and explosions, age them,
//! fade their size and color, and retire them once their life is spent.
//! Motion goes through the physics integrator's gravity step, which moves a
//! body *against* its velocity; spawn velocities are negated accordingly.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::geometry::{Rgb, Triangle, Vec3};
use super::physics::{ImpactDirection, PhysicsState};
use super::rotation::rotate_point_zyx;
use crate::consts::DRAG_BASELINE_HZ;
use crate::settings::ParticleSettings;

/// Color stops from ignition to burnout
const GRADIENT: [(f32, Rgb); 4] = [
    (0.0, Rgb::YELLOW),
    (1.0 / 3.0, Rgb::RED),
    (2.0 / 3.0, Rgb::DARK_RED),
    (1.0, Rgb::BLACK),
];

/// Unit render triangle, scaled by the particle size
const SHAPE: [Vec3; 3] = [
    Vec3::new(0.0, -0.5, 0.0),
    Vec3::new(0.5, 0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
];

/// Ignition boost for one step of `dt` seconds, normalized to the 60 Hz baseline
#[inline]
fn ignition_scale(boost: f32, dt: f32) -> f32 {
    boost.powf(dt * DRAG_BASELINE_HZ)
}

/// Color at `progress` (0 = just born, 1 = dead)
pub fn gradient_color(progress: f32) -> Rgb {
    let t = progress.clamp(0.0, 1.0);
    for pair in GRADIENT.windows(2) {
        let (start, from) = pair[0];
        let (end, to) = pair[1];
        if t <= end {
            return from.lerp(to, (t - start) / (end - start));
        }
    }
    Rgb::BLACK
}

/// A single particle
#[derive(Debug, Clone)]
pub struct Particle {
    /// Render triangle at the current position, size and orientation
    pub triangle: Triangle,
    pub physics: PhysicsState,
    pub position: Vec3,
    /// World position of the emitter when this particle was spawned
    pub world_position: Vec3,
    /// Emitter clock at spawn, seconds
    pub birth_time: f64,
    /// Seconds before the particle appears
    pub start_delay: f32,
    /// Seconds the particle lives once it appears
    pub life: f32,
    /// Size at birth
    pub base_size: f32,
    pub size: f32,
    pub color: Rgb,
    /// Orientation in degrees, applied Z then Y then X
    pub rotation: Option<Vec3>,
    /// Degrees per second
    pub rotation_speed: Option<Vec3>,
    pub visible: bool,
    /// Set by collision detection, consumed by the next advance
    pub last_impact: Option<ImpactDirection>,
}

impl Particle {
    pub fn new(position: Vec3, physics: PhysicsState, birth_time: f64, life: f32, size: f32) -> Self {
        let mut particle = Self {
            triangle: Triangle::new(SHAPE[0], SHAPE[1], SHAPE[2]),
            physics,
            position,
            world_position: Vec3::ZERO,
            birth_time,
            start_delay: 0.0,
            life,
            base_size: size,
            size,
            color: Rgb::YELLOW,
            rotation: None,
            rotation_speed: None,
            visible: false,
            last_impact: None,
        };
        particle.rebuild_triangle();
        particle
    }

    /// Time the particle is retired
    #[inline]
    pub fn death_time(&self) -> f64 {
        self.birth_time + self.start_delay as f64 + self.life as f64
    }

    #[inline]
    pub fn is_dead(&self, now: f64) -> bool {
        now >= self.death_time()
    }

    /// Seconds since the particle appeared (negative while delayed)
    #[inline]
    pub fn age(&self, now: f64) -> f64 {
        now - self.birth_time - self.start_delay as f64
    }

    fn rebuild_triangle(&mut self) {
        let rotation = self.rotation.unwrap_or(Vec3::ZERO);
        let [a, b, c] = SHAPE.map(|v| self.position + rotate_point_zyx(v, rotation) * self.size);
        self.triangle = Triangle::new(a, b, c).with_color(self.color);
    }
}

/// Spawns, advances and retires particles for one object
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    pub particles: Vec<Particle>,
    pub settings: ParticleSettings,
    /// Absolute particle ceiling
    pub ceiling: usize,
    /// Emitter clock, seconds
    clock: f64,
    rng: Pcg32,
}

impl ParticleEmitter {
    pub fn new(seed: u64, settings: ParticleSettings, ceiling: usize) -> Self {
        Self {
            particles: Vec::new(),
            settings,
            ceiling,
            clock: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particle cap for the given thrust, never above the ceiling
    pub fn dynamic_cap(&self, thrust: f32) -> usize {
        let cap = self.settings.cap_base as f32 + thrust.max(0.0) * self.settings.cap_per_thrust;
        (cap as usize).min(self.ceiling)
    }

    /// Spawn a burst.
    ///
    /// Steady emitters fire along `trajectory`; explosions scatter over an
    /// upward-biased sphere, twice as many, all appearing at once. A steady
    /// emitter with no thrust retires every particle immediately.
    ///
    /// Returns the number of particles spawned.
    pub fn spawn(
        &mut self,
        trajectory: Vec3,
        start_position: Vec3,
        world_position: Vec3,
        thrust: f32,
        is_explosion: bool,
    ) -> usize {
        if thrust <= 0.0 {
            if !is_explosion && !self.particles.is_empty() {
                log::debug!("Engine cut-off, retiring {} particles", self.particles.len());
                self.particles.clear();
            }
            return 0;
        }

        let mut count = (thrust * self.settings.per_thrust).round() as usize;
        if is_explosion {
            count *= 2;
        }
        let room = self.dynamic_cap(thrust).saturating_sub(self.particles.len());
        let count = count.min(room);

        let direction = trajectory.normalize_or_zero();
        for _ in 0..count {
            let particle = self.make_particle(direction, start_position, world_position, thrust, is_explosion);
            self.particles.push(particle);
        }
        if is_explosion {
            log::debug!("Explosion burst of {count} particles at {start_position}");
        }
        count
    }

    fn make_particle(
        &mut self,
        direction: Vec3,
        start_position: Vec3,
        world_position: Vec3,
        thrust: f32,
        is_explosion: bool,
    ) -> Particle {
        let s = &self.settings;
        let life = self.rng.random_range(s.life_min..=s.life_max);
        let size = self.rng.random_range(s.size_min..=s.size_max);
        let start_delay = if is_explosion {
            0.0
        } else {
            self.rng.random_range(s.delay_min..=s.delay_max)
        };

        let travel = if is_explosion {
            // Uniform point on the unit sphere, pushed up (-Y)
            let z: f32 = self.rng.random_range(-1.0..=1.0);
            let theta: f32 = self.rng.random_range(0.0..std::f32::consts::TAU);
            let r = (1.0 - z * z).max(0.0).sqrt();
            let point = Vec3::new(r * theta.cos(), r * theta.sin() - 0.5, z);
            point.normalize_or_zero() * s.explosion_speed * self.rng.random_range(0.5..=1.0)
        } else {
            let jitter = Vec3::new(
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
            ) * 0.15;
            (direction + jitter) * thrust * s.speed_per_thrust
        };
        let limit = Vec3::splat(s.max_axis_speed);
        let velocity = (-travel).clamp(-limit, limit);

        let physics = PhysicsState {
            velocity,
            gravity_strength: s.gravity,
            bounce_energy_loss_factor: s.bounce_energy,
            ..PhysicsState::default()
        };
        let mut particle = Particle::new(start_position, physics, self.clock, life, size);
        particle.world_position = world_position;
        particle.start_delay = start_delay;
        if is_explosion {
            particle.rotation = Some(Vec3::new(
                self.rng.random_range(0.0..360.0),
                self.rng.random_range(0.0..360.0),
                self.rng.random_range(0.0..360.0),
            ));
            particle.rotation_speed = Some(Vec3::new(
                self.rng.random_range(-180.0..=180.0),
                self.rng.random_range(-180.0..=180.0),
                self.rng.random_range(-180.0..=180.0),
            ));
        }
        particle
    }

    /// Age every particle by `dt` seconds, then sweep out the dead ones
    pub fn advance(&mut self, dt: f32) {
        self.clock += dt as f64;
        let now = self.clock;
        let s = &self.settings;

        let mut dead = vec![false; self.particles.len()];
        for (particle, dead) in self.particles.iter_mut().zip(dead.iter_mut()) {
            if particle.is_dead(now) {
                *dead = true;
                continue;
            }
            let age = particle.age(now);
            if age < 0.0 {
                particle.visible = false;
                continue;
            }
            particle.visible = true;

            let progress = (age / particle.life as f64).clamp(0.0, 1.0) as f32;
            particle.size = particle.base_size * (1.0 - progress);
            particle.color = gradient_color(progress);

            if let Some(impact) = particle.last_impact.take() {
                particle.physics.bounce(Vec3::ZERO, Some(impact));
                // Only the time left burns faster
                let remaining = particle.life as f64 - age;
                particle.life = (age + remaining * s.impact_life_factor as f64) as f32;
                if particle.is_dead(now) {
                    *dead = true;
                    continue;
                }
            } else {
                if age < s.ignition_window as f64 {
                    particle.physics.velocity *= ignition_scale(s.ignition_boost, dt);
                }
                particle.position = particle.physics.apply_gravity_force(particle.position, dt);
            }

            if let (Some(rotation), Some(speed)) = (particle.rotation, particle.rotation_speed) {
                particle.rotation = Some(rotation + speed * dt);
            }
            particle.rebuild_triangle();
        }

        let mut flags = dead.into_iter();
        self.particles.retain(|_| !flags.next().unwrap_or(false));
    }

    /// Particles that should be drawn this frame
    pub fn visible(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter() -> ParticleEmitter {
        ParticleEmitter::new(42, ParticleSettings::default(), 300)
    }

    fn still_particle(life: f32) -> Particle {
        Particle::new(Vec3::ZERO, PhysicsState::default(), 0.0, life, 4.0)
    }

    #[test]
    fn test_particle_retirement() {
        let mut e = emitter();
        e.particles.push(still_particle(1.0));
        e.advance(0.99);
        assert_eq!(e.len(), 1);
        e.advance(0.02);
        assert!(e.is_empty());
    }

    #[test]
    fn test_start_delay_hides_particle() {
        let mut e = emitter();
        let mut p = still_particle(1.0);
        p.start_delay = 0.5;
        e.particles.push(p);
        e.advance(0.25);
        assert!(!e.particles[0].visible);
        assert_eq!(e.visible().count(), 0);
        e.advance(0.5);
        assert!(e.particles[0].visible);
        // Delay pushes death back
        e.advance(0.7);
        assert_eq!(e.len(), 1);
        e.advance(0.1);
        assert!(e.is_empty());
    }

    #[test]
    fn test_size_and_color_fade() {
        let mut e = emitter();
        e.particles.push(still_particle(1.0));
        e.advance(0.5);
        let p = &e.particles[0];
        assert!((p.size - 2.0).abs() < 1e-4);
        assert_eq!(p.color, gradient_color(0.5));
        assert_ne!(p.color, Rgb::YELLOW);
    }

    #[test]
    fn test_gradient_stops() {
        assert_eq!(gradient_color(0.0), Rgb::YELLOW);
        assert_eq!(gradient_color(1.0 / 3.0), Rgb::RED);
        assert_eq!(gradient_color(2.0 / 3.0), Rgb::DARK_RED);
        assert_eq!(gradient_color(1.0), Rgb::BLACK);
        assert_eq!(gradient_color(7.0), Rgb::BLACK);
    }

    #[test]
    fn test_impact_bounces_and_shortens_life() {
        let mut e = emitter();
        let mut p = still_particle(1.0);
        p.physics.velocity = Vec3::new(0.0, -4.0, 0.0);
        p.physics.bounce_energy_loss_factor = 0.5;
        p.last_impact = Some(ImpactDirection::Bottom);
        e.particles.push(p);
        e.advance(0.1);
        let p = &e.particles[0];
        // 0.9 s left at impact, cut to 0.72
        assert!((p.life - 0.82).abs() < 1e-5, "{}", p.life);
        assert_eq!(p.physics.velocity.y, 2.0);
        assert_eq!(p.last_impact, None);
        // Impact frame does not integrate motion
        assert_eq!(p.position, Vec3::ZERO);
    }

    #[test]
    fn test_late_impact_shortens_remaining_life_only() {
        let mut e = emitter();
        e.particles.push(still_particle(1.0));
        e.advance(0.85);
        e.particles[0].last_impact = Some(ImpactDirection::Top);
        e.advance(0.01);
        assert_eq!(e.len(), 1);
        // 0.14 s left at impact becomes 0.112
        let p = &e.particles[0];
        assert!((p.life - 0.972).abs() < 1e-4, "{}", p.life);
        e.advance(0.1);
        assert_eq!(e.len(), 1);
        e.advance(0.02);
        assert!(e.is_empty());
    }

    #[test]
    fn test_ignition_boost_is_frame_rate_independent() {
        let at_60: f32 = (0..6).map(|_| ignition_scale(1.05, 1.0 / 60.0)).product();
        let at_120: f32 = (0..12).map(|_| ignition_scale(1.05, 1.0 / 120.0)).product();
        assert!((at_60 - at_120).abs() < 1e-4);
        assert!((at_60 - 1.05f32.powi(6)).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_scales_with_thrust_and_caps() {
        let mut e = emitter();
        let spawned = e.spawn(Vec3::Z, Vec3::ZERO, Vec3::ZERO, 20.0, false);
        assert_eq!(spawned, 10);

        let mut e = emitter();
        let spawned = e.spawn(Vec3::Z, Vec3::ZERO, Vec3::ZERO, 20.0, true);
        assert_eq!(spawned, 20);
        assert!(e.particles.iter().all(|p| p.start_delay == 0.0));

        // Dynamic cap at thrust 20 is 40 + 120 = 160
        let mut e = emitter();
        for _ in 0..100 {
            e.spawn(Vec3::Z, Vec3::ZERO, Vec3::ZERO, 20.0, false);
        }
        assert_eq!(e.len(), e.dynamic_cap(20.0));
        assert_eq!(e.len(), 160);

        // Ceiling wins at huge thrust
        let e = ParticleEmitter::new(1, ParticleSettings::default(), 100);
        assert_eq!(e.dynamic_cap(10_000.0), 100);
    }

    #[test]
    fn test_spawned_particles_are_randomized_and_clamped() {
        let mut e = emitter();
        e.spawn(Vec3::new(0.0, 0.0, -1.0), Vec3::ONE, Vec3::ZERO, 200.0, false);
        let s = ParticleSettings::default();
        for p in &e.particles {
            assert!(p.life >= s.life_min && p.life <= s.life_max);
            assert!(p.size >= s.size_min && p.size <= s.size_max);
            assert!(p.start_delay >= s.delay_min && p.start_delay <= s.delay_max);
            assert!(p.physics.velocity.abs().max_element() <= s.max_axis_speed);
            assert_eq!(p.position, Vec3::ONE);
        }
        let first = e.particles[0].life;
        assert!(e.particles.iter().any(|p| p.life != first));
    }

    #[test]
    fn test_explosion_biased_upward() {
        let mut e = ParticleEmitter::new(7, ParticleSettings::default(), 800);
        e.spawn(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, 100.0, true);
        // Upward travel is -Y; the gravity step moves against velocity
        let mean: f32 =
            e.particles.iter().map(|p| p.physics.velocity.y).sum::<f32>() / e.len() as f32;
        assert!(mean > 0.0, "{mean}");
        assert!(e.particles.iter().all(|p| p.rotation.is_some()));
    }

    #[test]
    fn test_zero_thrust_clears() {
        let mut e = emitter();
        e.spawn(Vec3::Z, Vec3::ZERO, Vec3::ZERO, 20.0, false);
        assert!(!e.is_empty());
        assert_eq!(e.spawn(Vec3::Z, Vec3::ZERO, Vec3::ZERO, 0.0, false), 0);
        assert!(e.is_empty());
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = emitter();
        let mut b = emitter();
        a.spawn(Vec3::Z, Vec3::ZERO, Vec3::ZERO, 30.0, false);
        b.spawn(Vec3::Z, Vec3::ZERO, Vec3::ZERO, 30.0, false);
        for _ in 0..10 {
            a.advance(1.0 / 60.0);
            b.advance(1.0 / 60.0);
        }
        assert_eq!(a.len(), b.len());
        for (x, y) in a.particles.iter().zip(&b.particles) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.color, y.color);
        }
    }

    #[test]
    fn test_tumbling_particle_rotates_triangle() {
        let mut e = emitter();
        let mut p = still_particle(5.0);
        p.rotation = Some(Vec3::ZERO);
        p.rotation_speed = Some(Vec3::new(0.0, 0.0, 90.0));
        e.particles.push(p);
        let before = e.particles[0].triangle.clone();
        e.advance(1.0);
        let after = &e.particles[0].triangle;
        assert_eq!(e.particles[0].rotation, Some(Vec3::new(0.0, 0.0, 90.0)));
        assert!((after.vert1 - before.vert1).length() > 0.1);
    }
}
