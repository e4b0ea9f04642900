//! Crash-box collision detection
//!
//! Each frame every object's crash boxes are rotated (Z, Y, X), flattened back
//! to axis-aligned boxes and snapped onto the object's anchor. Then all pairs
//! are tested for overlap.
//!
//! Rules for a pair:
//! - both need at least one crash box and a visible anchor
//! - objects sharing a name never collide (particles and their emitter)
//! - two static objects never collide
//! - a pair with a static member is only tested once the static check
//!   interval has elapsed
//!
//! The first overlapping box pair flags both sides; remaining boxes are skipped.
//! Rotated boxes are re-flattened, not kept oriented, so at steep angles they
//! grow beyond the true silhouette.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::geometry::{CrashBox, Vec3};
use super::physics::ImpactDirection;
use super::placement::{center_crash_boxes, placement_target};
use super::rotation::rotate_point_zyx;
use super::state::Object;

/// Collision state threaded between frames
#[derive(Debug, Clone)]
pub struct CollisionContext {
    /// Seconds between checks involving static objects
    pub static_check_interval: f64,
    last_static_check: Option<f64>,
}

impl CollisionContext {
    pub fn new(static_check_interval: f64) -> Self {
        Self {
            static_check_interval,
            last_static_check: None,
        }
    }

    /// Simulation time of the last pass that tested static objects
    pub fn last_static_check(&self) -> Option<f64> {
        self.last_static_check
    }

    /// Whether pairs with a static member are tested at `now`
    pub fn static_check_due(&self, now: f64) -> bool {
        self.last_static_check
            .is_none_or(|last| now - last >= self.static_check_interval)
    }

    /// Test all pairs and flag collisions.
    ///
    /// `anchors[i]` is object `i`'s resolved anchor, `None` when it is not
    /// visible this frame. Live particles of each emitter take part as small
    /// cubes carrying their emitter's name; they are tested against objects
    /// only.
    pub fn detect_collisions(
        &mut self,
        objects: &mut [Object],
        anchors: &[Option<Vec3>],
        now: f64,
    ) -> CollisionReport {
        let static_due = self.static_check_due(now);
        let colliders = build_colliders(objects, anchors);

        let hits: Vec<(Owner, ImpactDirection, Owner, ImpactDirection)> =
            find_hits(&colliders, static_due)
                .into_iter()
                .map(|hit| {
                    let a = colliders[hit.a].owner;
                    let b = colliders[hit.b].owner;
                    (a, hit.impact_a, b, hit.impact_b)
                })
                .collect();

        let mut report = CollisionReport {
            static_checked: static_due,
            ..CollisionReport::default()
        };
        for (a, impact_a, b, impact_b) in hits {
            mark(objects, a, impact_a);
            mark(objects, b, impact_b);
            match (a, b) {
                (Owner::Object(i), Owner::Object(j)) => {
                    log::debug!(
                        "Collision: {:?} <-> {:?}",
                        objects[i].name,
                        objects[j].name
                    );
                    report.collided.push((i, j));
                }
                _ => report.particle_hits += 1,
            }
        }

        if static_due {
            self.last_static_check = Some(now);
        } else {
            log::trace!("Static collision checks throttled at t={now:.3}");
        }
        report
    }
}

/// Outcome of one collision pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    /// Object pairs that overlapped (by index)
    pub collided: Vec<(usize, usize)>,
    /// Particle-object overlaps
    pub particle_hits: usize,
    /// Whether static objects were tested in this pass
    pub static_checked: bool,
}

/// Who owns a set of world-space boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Object(usize),
    Particle { object: usize, particle: usize },
}

#[derive(Debug, Clone)]
struct Collider<'a> {
    owner: Owner,
    name: &'a str,
    is_static: bool,
    boxes: Vec<CrashBox>,
}

impl Collider<'_> {
    fn is_particle(&self) -> bool {
        matches!(self.owner, Owner::Particle { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    a: usize,
    b: usize,
    impact_a: ImpactDirection,
    impact_b: ImpactDirection,
}

/// World-space crash boxes of an object at `anchor`
pub fn world_crash_boxes(object: &Object, anchor: Vec3) -> Vec<CrashBox> {
    let mut boxes: Vec<CrashBox> = object
        .crash_boxes
        .iter()
        .map(|b| {
            CrashBox::from_corners(
                rotate_point_zyx(b.min, object.rotation),
                rotate_point_zyx(b.max, object.rotation),
            )
        })
        .collect();
    center_crash_boxes(&mut boxes, placement_target(object, anchor));
    boxes
}

fn build_colliders<'a>(objects: &'a [Object], anchors: &[Option<Vec3>]) -> Vec<Collider<'a>> {
    let mut colliders = Vec::new();
    for (i, object) in objects.iter().enumerate() {
        let Some(anchor) = anchors.get(i).copied().flatten() else {
            continue;
        };
        if !object.crash_boxes.is_empty() {
            colliders.push(Collider {
                owner: Owner::Object(i),
                name: &object.name,
                is_static: object.is_static(),
                boxes: world_crash_boxes(object, anchor),
            });
        }
        if let Some(emitter) = &object.emitter {
            for (p, particle) in emitter.particles.iter().enumerate() {
                if particle.visible {
                    colliders.push(Collider {
                        owner: Owner::Particle {
                            object: i,
                            particle: p,
                        },
                        name: &object.name,
                        is_static: false,
                        boxes: vec![CrashBox::around(particle.position, particle.size)],
                    });
                }
            }
        }
    }
    colliders
}

fn find_hits(colliders: &[Collider<'_>], static_due: bool) -> Vec<Hit> {
    let n = colliders.len();

    #[cfg(feature = "parallel")]
    let hits: Vec<Hit> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| (i + 1..n).filter_map(move |j| test_pair(colliders, i, j, static_due)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let hits: Vec<Hit> = (0..n)
        .flat_map(|i| (i + 1..n).filter_map(move |j| test_pair(colliders, i, j, static_due)))
        .collect();

    hits
}

fn test_pair(colliders: &[Collider<'_>], i: usize, j: usize, static_due: bool) -> Option<Hit> {
    let a = &colliders[i];
    let b = &colliders[j];
    if a.name == b.name || (a.is_particle() && b.is_particle()) {
        return None;
    }
    if a.is_static && b.is_static {
        return None;
    }
    if (a.is_static || b.is_static) && !static_due {
        return None;
    }
    for box_a in &a.boxes {
        for box_b in &b.boxes {
            if box_a.overlaps(box_b) {
                return Some(Hit {
                    a: i,
                    b: j,
                    impact_a: impact_direction(box_a, box_b),
                    impact_b: impact_direction(box_b, box_a),
                });
            }
        }
    }
    None
}

/// Side of `hit` facing `other`, by the axis of least penetration.
///
/// +Y is down, so a box above the other is hit on its bottom.
pub fn impact_direction(hit: &CrashBox, other: &CrashBox) -> ImpactDirection {
    let depth = hit.max.min(other.max) - hit.min.max(other.min);
    let delta = other.center() - hit.center();
    if depth.y <= depth.x && depth.y <= depth.z {
        if delta.y >= 0.0 {
            ImpactDirection::Bottom
        } else {
            ImpactDirection::Top
        }
    } else if depth.x <= depth.z {
        if delta.x >= 0.0 {
            ImpactDirection::Right
        } else {
            ImpactDirection::Left
        }
    } else {
        ImpactDirection::Center
    }
}

fn mark(objects: &mut [Object], owner: Owner, impact: ImpactDirection) {
    match owner {
        Owner::Object(i) => {
            let object = &mut objects[i];
            object.has_collided = true;
            object.last_impact.get_or_insert(impact);
        }
        Owner::Particle { object, particle } => {
            if let Some(p) = objects[object]
                .emitter
                .as_mut()
                .and_then(|e| e.particles.get_mut(particle))
            {
                p.last_impact = Some(impact);
            }
        }
    }
}
