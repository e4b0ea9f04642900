//! Movement policies
//!
//! Each object kind that moves on its own carries a policy. Once per frame,
//! before rotation, the policy turns the current pose into the next one.
//! Policy-specific state (accumulated angles, headings, phases) lives in the
//! variant, not on the object.

use serde::{Deserialize, Serialize};

use super::geometry::Vec3;
use crate::wrap_degrees;

/// Position and rotation (degrees) of an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Player control input for one frame, each axis in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipControls {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    /// Throttle in [0, 1]
    pub throttle: f32,
}

/// Inputs shared by all policies
#[derive(Debug, Clone, Copy)]
pub struct MovementContext {
    pub dt: f32,
    /// Simulation time in seconds
    pub time: f64,
    pub controls: ShipControls,
}

/// Per-kind movement behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MovementPolicy {
    /// Player craft steered by [`ShipControls`]
    Ship {
        /// Degrees per second at full stick
        turn_rate: f32,
        accumulated: Vec3,
    },
    /// Wandering drone that plants seeds
    Seeder {
        heading: f32,
        /// Degrees per second
        turn_rate: f32,
        speed: f32,
    },
    /// Sways gently about Z
    Tree { amplitude: f32, frequency: f32 },
    House,
    /// Slow terrain drift
    Ground { drift: Vec3 },
    /// Constant spin, degrees per second per axis
    Star { spin: Vec3 },
}

impl MovementPolicy {
    pub fn ship(turn_rate: f32) -> Self {
        MovementPolicy::Ship {
            turn_rate,
            accumulated: Vec3::ZERO,
        }
    }

    /// Produce the next pose
    pub fn advance(&mut self, pose: Pose, ctx: &MovementContext) -> Pose {
        let dt = ctx.dt;
        match self {
            MovementPolicy::Ship {
                turn_rate,
                accumulated,
            } => {
                let c = ctx.controls;
                let delta = Vec3::new(c.pitch, c.yaw, c.roll).clamp(Vec3::NEG_ONE, Vec3::ONE)
                    * *turn_rate
                    * dt;
                *accumulated = wrap_rotation(*accumulated + delta);
                Pose {
                    position: pose.position,
                    rotation: *accumulated,
                }
            }
            MovementPolicy::Seeder {
                heading,
                turn_rate,
                speed,
            } => {
                *heading = wrap_degrees(*heading + *turn_rate * dt);
                let (sin, cos) = crate::deg_to_rad(*heading).sin_cos();
                Pose {
                    position: pose.position + Vec3::new(sin, 0.0, cos) * *speed * dt,
                    rotation: Vec3::new(pose.rotation.x, *heading, pose.rotation.z),
                }
            }
            MovementPolicy::Tree {
                amplitude,
                frequency,
            } => {
                let phase = ctx.time as f32 * *frequency * std::f32::consts::TAU;
                Pose {
                    position: pose.position,
                    rotation: Vec3::new(pose.rotation.x, pose.rotation.y, phase.sin() * *amplitude),
                }
            }
            MovementPolicy::House => pose,
            MovementPolicy::Ground { drift } => Pose {
                position: pose.position + *drift * dt,
                rotation: pose.rotation,
            },
            MovementPolicy::Star { spin } => Pose {
                position: pose.position,
                rotation: wrap_rotation(pose.rotation + *spin * dt),
            },
        }
    }
}

fn wrap_rotation(r: Vec3) -> Vec3 {
    Vec3::new(wrap_degrees(r.x), wrap_degrees(r.y), wrap_degrees(r.z))
}
