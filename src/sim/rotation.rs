//! Rotation engine
//!
//! Rotates points and meshes about one principal axis at a time. After any
//! vertex change the triangle's normal and shading angle are re-derived.
//!
//! Whole-object rotation is always Z, then Y, then X. Crash-box alignment and
//! exhaust direction both depend on that order, so there is no combined
//! matrix shortcut here.

use super::geometry::{Axis, Triangle, Vec3, light_direction};
use crate::deg_to_rad;

/// Precomputed sine/cosine for one axis rotation
#[derive(Debug, Clone, Copy)]
struct AxisRotation {
    axis: Axis,
    cos: f32,
    sin: f32,
}

impl AxisRotation {
    fn new(angle_degrees: f32, axis: Axis) -> Self {
        let (sin, cos) = deg_to_rad(angle_degrees).sin_cos();
        Self { axis, cos, sin }
    }

    #[inline]
    fn apply(&self, p: Vec3) -> Vec3 {
        let (c, s) = (self.cos, self.sin);
        match self.axis {
            Axis::X => Vec3::new(p.x, p.y * c - p.z * s, p.z * c + p.y * s),
            Axis::Y => Vec3::new(p.x * c + p.z * s, p.y, p.z * c - p.x * s),
            Axis::Z => Vec3::new(p.x * c - p.y * s, p.y * c + p.x * s, p.z),
        }
    }
}

/// Rotate a single point about `axis`
pub fn rotate_point(point: Vec3, angle_degrees: f32, axis: Axis) -> Vec3 {
    AxisRotation::new(angle_degrees, axis).apply(point)
}

/// Rotate a point by a per-axis rotation (degrees), in Z, Y, X order
pub fn rotate_point_zyx(point: Vec3, rotation: Vec3) -> Vec3 {
    let p = rotate_point(point, rotation.z, Axis::Z);
    let p = rotate_point(p, rotation.y, Axis::Y);
    rotate_point(p, rotation.x, Axis::X)
}

/// Rotate every triangle of a mesh about `axis`
pub fn rotate(mesh: &[Triangle], angle_degrees: f32, axis: Axis) -> Vec<Triangle> {
    let mut out = mesh.to_vec();
    rotate_in_place(&mut out, angle_degrees, axis);
    out
}

/// Rotate a mesh in place about `axis`
pub fn rotate_in_place(mesh: &mut [Triangle], angle_degrees: f32, axis: Axis) {
    let rotation = AxisRotation::new(angle_degrees, axis);
    let light = light_direction();
    for tri in mesh.iter_mut() {
        tri.vert1 = rotation.apply(tri.vert1);
        tri.vert2 = rotation.apply(tri.vert2);
        tri.vert3 = rotation.apply(tri.vert3);
        tri.recompute_normal(light);
    }
}

/// Rotate a mesh by a per-axis rotation (degrees), in Z, Y, X order.
///
/// Zero angles are skipped; they would not move any vertex.
pub fn rotate_zyx(mesh: &[Triangle], rotation: Vec3) -> Vec<Triangle> {
    let mut out = mesh.to_vec();
    rotate_zyx_in_place(&mut out, rotation);
    out
}

pub fn rotate_zyx_in_place(mesh: &mut [Triangle], rotation: Vec3) {
    for (angle, axis) in [(rotation.z, Axis::Z), (rotation.y, Axis::Y), (rotation.x, Axis::X)] {
        if angle != 0.0 {
            rotate_in_place(mesh, angle, axis);
        }
    }
}
