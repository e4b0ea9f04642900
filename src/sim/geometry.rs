//! Vector and triangle primitives
//!
//! `Vec3` is glam's single-precision vector. Triangles carry their face normal
//! and shading angle, which are only ever derived from the vertices.

pub use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::{LIGHT_POSITION, NORMAL_EPSILON};

/// Principal rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const DARK_RED: Rgb = Rgb::new(139, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend toward `other` (t in [0, 1])
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Unit vector from the origin toward the scene light
#[inline]
pub fn light_direction() -> Vec3 {
    Vec3::from_array(LIGHT_POSITION).normalize_or_zero()
}

/// Face normal of three points: normalized `(b - a) x (c - a)`.
///
/// A degenerate triangle divides by `NORMAL_EPSILON` instead of its near-zero
/// length, so the result is always finite.
#[inline]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let cross = (b - a).cross(c - a);
    cross / cross.length().max(NORMAL_EPSILON)
}

/// A mesh triangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vert1: Vec3,
    pub vert2: Vec3,
    pub vert3: Vec3,
    /// Face normal, derived from the vertices
    pub normal1: Vec3,
    /// Dot of the face normal with the light direction
    pub shading_angle: f32,
    #[serde(default)]
    pub color: Option<Rgb>,
    /// Draw even when back-facing
    #[serde(default)]
    pub no_hidden: Option<bool>,
    /// Tile id when this triangle is part of a surface
    #[serde(default)]
    pub surface_tile_id: Option<u32>,
}

impl Triangle {
    pub fn new(vert1: Vec3, vert2: Vec3, vert3: Vec3) -> Self {
        let mut tri = Self {
            vert1,
            vert2,
            vert3,
            normal1: Vec3::ZERO,
            shading_angle: 0.0,
            color: None,
            no_hidden: None,
            surface_tile_id: None,
        };
        tri.recompute_normal(light_direction());
        tri
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_tile_id(mut self, id: u32) -> Self {
        self.surface_tile_id = Some(id);
        self
    }

    pub fn with_no_hidden(mut self, no_hidden: bool) -> Self {
        self.no_hidden = Some(no_hidden);
        self
    }

    #[inline]
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.vert1, self.vert2, self.vert3]
    }

    /// Mean of the three vertices
    #[inline]
    pub fn centroid(&self) -> Vec3 {
        (self.vert1 + self.vert2 + self.vert3) / 3.0
    }

    /// Re-derive `normal1` and `shading_angle` from the current vertices
    pub fn recompute_normal(&mut self, light_dir: Vec3) {
        self.normal1 = face_normal(self.vert1, self.vert2, self.vert3);
        self.shading_angle = self.normal1.dot(light_dir);
    }

    /// Copy shifted by `offset`. Translation leaves the normal unchanged.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            vert1: self.vert1 + offset,
            vert2: self.vert2 + offset,
            vert3: self.vert3 + offset,
            ..self.clone()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.vert1.is_finite() && self.vert2.is_finite() && self.vert3.is_finite()
    }
}

/// Named group of triangles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPart {
    pub name: String,
    pub triangles: Vec<Triangle>,
    pub visible: bool,
}

impl ObjectPart {
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>) -> Self {
        Self {
            name: name.into(),
            triangles,
            visible: true,
        }
    }
}

/// Axis-aligned crash box as two corner points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrashBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl CrashBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box spanning two arbitrary corners
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Cube of edge `size` centered on `center`
    pub fn around(center: Vec3, size: f32) -> Self {
        let half = Vec3::splat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Translate both corners
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Overlap on all three axes (touching counts)
    #[inline]
    pub fn overlaps(&self, other: &CrashBox) -> bool {
        self.max.x >= other.min.x
            && self.min.x <= other.max.x
            && self.max.y >= other.min.y
            && self.min.y <= other.max.y
            && self.max.z >= other.min.z
            && self.min.z <= other.max.z
    }

    /// min <= max on every axis
    pub fn is_ordered(&self) -> bool {
        self.min.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_sign_left_hand_rule() {
        // (1,0,0) x (0,1,0) = (0,0,1): the normal faces the light
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((tri.normal1 - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
        assert!((tri.shading_angle - 1.0).abs() < 1e-6);

        // Reversed winding faces away
        let back = Triangle::new(Vec3::ZERO, Vec3::Y, Vec3::X);
        assert!((back.normal1.z + 1.0).abs() < 1e-6);
        assert!((back.shading_angle + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_normal_is_finite() {
        let tri = Triangle::new(Vec3::ONE, Vec3::ONE, Vec3::ONE);
        assert!(tri.normal1.is_finite());
        assert_eq!(tri.normal1, Vec3::ZERO);

        // Collinear points
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert!(tri.normal1.is_finite());
        assert!(tri.shading_angle.is_finite());
    }

    #[test]
    fn test_overlap_fixture_positive() {
        let a = CrashBox::new(
            Vec3::new(94935.0, -124.75, 93372.73),
            Vec3::new(95065.0, -20.49, 93445.73),
        );
        let b = CrashBox::new(
            Vec3::new(94935.0, -124.73, 93309.80),
            Vec3::new(95065.0, -20.47, 93382.80),
        );
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_overlap_negative() {
        let a = CrashBox::new(Vec3::ZERO, Vec3::splat(10.0));
        let b = CrashBox::new(Vec3::splat(100.0), Vec3::splat(110.0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_overlap_needs_all_axes() {
        let a = CrashBox::new(Vec3::ZERO, Vec3::splat(10.0));
        // Overlaps on x and y only
        let b = CrashBox::new(Vec3::new(5.0, 5.0, 20.0), Vec3::new(15.0, 15.0, 30.0));
        assert!(!a.overlaps(&b));
        // Touching faces count as overlap
        let c = CrashBox::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 10.0));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_rgb_hex_and_lerp() {
        assert_eq!(Rgb::YELLOW.to_string(), "#ffff00");
        assert_eq!(Rgb::DARK_RED.to_string(), "#8b0000");
        assert_eq!(Rgb::YELLOW.lerp(Rgb::RED, 0.5), Rgb::new(255, 128, 0));
    }

    #[test]
    fn test_crash_box_from_corners() {
        let b = CrashBox::from_corners(Vec3::new(5.0, -1.0, 3.0), Vec3::new(-5.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-5.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(5.0, 1.0, 3.0));
        assert!(b.is_ordered());
    }
}
