//! Shape-vs-shape distance and contact queries.
//!
//! The feature library only ever needs two things from narrowphase: a
//! surface-to-surface distance (for `touch`/`close`/`far`) and, during a
//! physics step, a contact normal and penetration depth to resolve. Both are
//! built from the same closest-point primitives.

use crate::math::{Pose, Vec2};
use crate::shape::ShapeKind;

/// A single contact between two shapes, normal pointing from `b` towards `a`.
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    pub normal: Vec2,
    /// Positive when the shapes overlap, by how much along `normal`.
    pub depth: f64,
    /// An approximate world-space point where the shapes touch.
    pub point: Vec2,
}

/// Closest point on a line segment `a`-`b` to point `p`.
fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.mag_sq();
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point on a convex polygon's boundary to `p`, plus whether `p` is
/// inside the polygon (winding assumed counterclockwise).
fn closest_on_polygon(p: Vec2, verts: &[Vec2]) -> (Vec2, bool) {
    let n = verts.len();
    let mut best = verts[0];
    let mut best_dist = f64::INFINITY;
    let mut inside = true;
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        let edge = b - a;
        // outward normal for a CCW polygon points to the right of the edge
        let normal = crate::math::right_normal(edge);
        if (p - a).dot(normal) > 0.0 {
            inside = false;
        }
        let c = closest_on_segment(p, a, b);
        let d = (p - c).mag_sq();
        if d < best_dist {
            best_dist = d;
            best = c;
        }
    }
    (best, inside)
}

/// Project a polygon onto an axis, returning (min, max).
fn project(axis: Vec2, verts: &[Vec2]) -> (f64, f64) {
    let mut min = verts[0].dot(axis);
    let mut max = min;
    for &v in &verts[1..] {
        let d = v.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

/// Separating Axis Theorem test between two convex polygons. Returns the
/// minimum translation vector (normal from `b` to `a`, penetration depth) if
/// they overlap.
fn polygon_polygon_mtv(a: &[Vec2], b: &[Vec2]) -> Option<(Vec2, f64)> {
    let mut best_axis = Vec2::new(1.0, 0.0);
    let mut best_depth = f64::INFINITY;

    for verts in [a, b] {
        let n = verts.len();
        for i in 0..n {
            let edge = verts[(i + 1) % n] - verts[i];
            let mut axis = crate::math::right_normal(edge);
            let len = axis.mag();
            if len <= f64::EPSILON {
                continue;
            }
            axis /= len;

            let (min_a, max_a) = project(axis, a);
            let (min_b, max_b) = project(axis, b);
            if max_a < min_b || max_b < min_a {
                return None;
            }
            let overlap = (max_a.min(max_b)) - (min_a.max(min_b));
            if overlap < best_depth {
                best_depth = overlap;
                best_axis = axis;
            }
        }
    }

    // orient the normal to point from b towards a
    let center_a = a.iter().fold(Vec2::zero(), |acc, &v| acc + v) / a.len() as f64;
    let center_b = b.iter().fold(Vec2::zero(), |acc, &v| acc + v) / b.len() as f64;
    if (center_a - center_b).dot(best_axis) < 0.0 {
        best_axis = -best_axis;
    }

    Some((best_axis, best_depth))
}

fn world_verts(pose: &Pose, kind: &ShapeKind) -> Option<Vec<Vec2>> {
    match kind {
        ShapeKind::Polygon { points, .. } => {
            Some(points.iter().map(|&p| pose.transform_point(p)).collect())
        }
        ShapeKind::Circle { .. } => None,
    }
}

/// Surface-to-surface distance between two shapes. Zero (or negative, for
/// overlapping shapes) means they touch.
pub fn surface_distance(pose_a: &Pose, a: &ShapeKind, pose_b: &Pose, b: &ShapeKind) -> f64 {
    match (a, b) {
        (ShapeKind::Circle { r: ra }, ShapeKind::Circle { r: rb }) => {
            (pose_a.translation - pose_b.translation).mag() - ra - rb
        }
        (ShapeKind::Circle { r }, ShapeKind::Polygon { .. }) => {
            let verts = world_verts(pose_b, b).unwrap();
            let (closest, inside) = closest_on_polygon(pose_a.translation, &verts);
            let d = (pose_a.translation - closest).mag();
            (if inside { -d } else { d }) - r
        }
        (ShapeKind::Polygon { .. }, ShapeKind::Circle { r: _ }) => {
            surface_distance(pose_b, b, pose_a, a)
        }
        (ShapeKind::Polygon { .. }, ShapeKind::Polygon { .. }) => {
            let va = world_verts(pose_a, a).unwrap();
            let vb = world_verts(pose_b, b).unwrap();
            if let Some((_, depth)) = polygon_polygon_mtv(&va, &vb) {
                -depth
            } else {
                // not overlapping: closest distance between the two boundaries
                let mut best = f64::INFINITY;
                for &v in &va {
                    let (c, _) = closest_on_polygon(v, &vb);
                    best = best.min((v - c).mag());
                }
                for &v in &vb {
                    let (c, _) = closest_on_polygon(v, &va);
                    best = best.min((v - c).mag());
                }
                best
            }
        }
    }
}

/// Contact information for collision resolution, or `None` if the shapes
/// don't overlap.
pub fn contact(pose_a: &Pose, a: &ShapeKind, pose_b: &Pose, b: &ShapeKind) -> Option<Contact> {
    match (a, b) {
        (ShapeKind::Circle { r: ra }, ShapeKind::Circle { r: rb }) => {
            let delta = pose_a.translation - pose_b.translation;
            let dist = delta.mag();
            let depth = ra + rb - dist;
            if depth <= 0.0 {
                return None;
            }
            let normal = if dist > f64::EPSILON {
                delta / dist
            } else {
                Vec2::new(0.0, 1.0)
            };
            Some(Contact {
                normal,
                depth,
                point: pose_b.translation + normal * *rb,
            })
        }
        (ShapeKind::Circle { r }, ShapeKind::Polygon { .. }) => {
            let verts = world_verts(pose_b, b).unwrap();
            let (closest, inside) = closest_on_polygon(pose_a.translation, &verts);
            let delta = pose_a.translation - closest;
            let dist = delta.mag();
            let depth = if inside { dist + r } else { r - dist };
            if depth <= 0.0 {
                return None;
            }
            let normal = if dist > f64::EPSILON {
                let n = delta / dist;
                if inside {
                    -n
                } else {
                    n
                }
            } else {
                Vec2::new(0.0, 1.0)
            };
            Some(Contact {
                normal,
                depth,
                point: closest,
            })
        }
        (ShapeKind::Polygon { .. }, ShapeKind::Circle { .. }) => {
            contact(pose_b, b, pose_a, a).map(|c| Contact {
                normal: -c.normal,
                ..c
            })
        }
        (ShapeKind::Polygon { .. }, ShapeKind::Polygon { .. }) => {
            let va = world_verts(pose_a, a).unwrap();
            let vb = world_verts(pose_b, b).unwrap();
            let (normal, depth) = polygon_polygon_mtv(&va, &vb)?;
            if depth <= 0.0 {
                return None;
            }
            let center_b = vb.iter().fold(Vec2::zero(), |acc, &v| acc + v) / vb.len() as f64;
            Some(Contact {
                normal,
                depth,
                point: center_b + normal * (depth * 0.5),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_pose(x: f64, y: f64) -> Pose {
        Pose::new(Vec2::new(x, y), crate::math::Angle::Rad(0.0))
    }

    #[test]
    fn touching_circles_have_zero_distance() {
        let a = ShapeKind::Circle { r: 1.0 };
        let b = ShapeKind::Circle { r: 1.0 };
        let d = surface_distance(&circle_pose(0.0, 0.0), &a, &circle_pose(2.0, 0.0), &b);
        assert!(d.abs() < 1e-9, "expected ~0, got {d}");
    }

    #[test]
    fn separated_circles_have_positive_distance() {
        let a = ShapeKind::Circle { r: 1.0 };
        let b = ShapeKind::Circle { r: 1.0 };
        let d = surface_distance(&circle_pose(0.0, 0.0), &a, &circle_pose(5.0, 0.0), &b);
        assert!((d - 3.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_circles_produce_contact() {
        let a = ShapeKind::Circle { r: 1.0 };
        let b = ShapeKind::Circle { r: 1.0 };
        let c = contact(&circle_pose(0.0, 0.0), &a, &circle_pose(1.0, 0.0), &b).unwrap();
        assert!(c.depth > 0.0);
    }
}
