//! Physics integrator
//!
//! Step functions advance a position and mutate the body's velocity in place.
//! World convention: **+Y is down**. The gravity step subtracts velocity from
//! position, so a positive `velocity.y` moves a body up the screen.
//!
//! Nothing in here is random; identical inputs give identical outputs.

use serde::{Deserialize, Serialize};

use super::geometry::Vec3;
use crate::consts::*;

/// Which side of a body was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactDirection {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl ImpactDirection {
    /// Canonical unit normal for this side
    pub fn normal(self) -> Vec3 {
        match self {
            ImpactDirection::Top => Vec3::new(0.0, -1.0, 0.0),
            ImpactDirection::Bottom => Vec3::new(0.0, 1.0, 0.0),
            ImpactDirection::Left => Vec3::new(-1.0, 0.0, 0.0),
            ImpactDirection::Right => Vec3::new(1.0, 0.0, 0.0),
            ImpactDirection::Center => Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

/// Velocity and material state of one body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsState {
    pub velocity: Vec3,
    /// Externally supplied acceleration
    pub acceleration: Vec3,
    pub mass: f32,
    pub gravity_strength: f32,
    /// Fraction of velocity lost per 60 Hz step (0..1)
    pub friction: f32,
    /// Fraction of velocity kept by a bounce (0 = inelastic, 1 = elastic)
    pub bounce_energy_loss_factor: f32,
    /// Frames left with gravity suspended
    pub bounce_cooldown_frames: u32,
    /// Current thrust; zero or less disables the thrust step
    #[serde(default)]
    pub thrust: f32,
    /// Speed clamp for the thrust step
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
}

fn default_max_speed() -> f32 {
    f32::MAX
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mass: 1.0,
            gravity_strength: 0.0,
            friction: 0.0,
            bounce_energy_loss_factor: 1.0,
            bounce_cooldown_frames: 0,
            thrust: 0.0,
            max_speed: default_max_speed(),
        }
    }
}

impl PhysicsState {
    /// Gravity step.
    ///
    /// During a bounce cooldown gravity is suspended and the position only
    /// follows the existing velocity.
    pub fn apply_gravity_force(&mut self, position: Vec3, dt: f32) -> Vec3 {
        if self.bounce_cooldown_frames > 0 {
            self.bounce_cooldown_frames -= 1;
            return position - self.velocity;
        }
        self.velocity += self.acceleration;
        self.velocity.y -= self.gravity_strength * dt;
        self.velocity *= GRAVITY_DAMPING;
        position - self.velocity
    }

    /// Frame-rate independent drag: `(1 - friction)^(dt * 60)`
    pub fn apply_drag_force(&mut self, position: Vec3, dt: f32) -> Vec3 {
        let decay = (1.0 - self.friction).max(0.0).powf(dt * DRAG_BASELINE_HZ);
        self.velocity *= decay;
        position + self.velocity * dt
    }

    /// Gravity (down = +Y), external acceleration, then flat damping
    pub fn apply_forces(&mut self, position: Vec3, dt: f32) -> Vec3 {
        self.velocity.y += self.gravity_strength * dt;
        self.velocity += self.acceleration * dt;
        self.velocity *= 1.0 - self.friction;
        position + self.velocity * dt
    }

    /// Accelerate along `direction` by `thrust / mass`, clamped to `max_speed`
    pub fn apply_thrust(&mut self, position: Vec3, dt: f32, direction: Vec3) -> Vec3 {
        if self.thrust <= 0.0 {
            return position;
        }
        let accel = direction.normalize_or_zero() * (self.thrust / self.mass.max(f32::EPSILON));
        self.velocity = (self.velocity + accel * dt).clamp_length_max(self.max_speed);
        position + self.velocity * dt
    }

    /// Reflect velocity off a surface.
    ///
    /// Every axis with a nonzero normal component is negated and scaled by the
    /// energy factor. A symbolic impact direction overrides `normal`. Gravity
    /// is then suspended for [`BOUNCE_COOLDOWN_FRAMES`].
    pub fn bounce(&mut self, normal: Vec3, impact: Option<ImpactDirection>) {
        let normal = impact.map_or(normal, ImpactDirection::normal);
        let factor = self.bounce_energy_loss_factor;
        if normal.x != 0.0 {
            self.velocity.x = -self.velocity.x * factor;
        }
        if normal.y != 0.0 {
            self.velocity.y = -self.velocity.y * factor;
        }
        if normal.z != 0.0 {
            self.velocity.z = -self.velocity.z * factor;
        }
        self.bounce_cooldown_frames = BOUNCE_COOLDOWN_FRAMES;
    }
}
