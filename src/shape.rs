//! The geometry contract the perception layer builds on (§6 of the design
//! doc). A real deployment gets these from an SVG/editor front end and a
//! physics engine; here we own a small concrete implementation so the
//! feature library and the oracle have something real to read and mutate.

use crate::math::{Pose, Vec2};
use crate::physics::collision::AABB;
use crate::physics::BodyHandle;

/// Stable identity of a shape within a scene. Movable objects are typically
/// short strings (`"a"`, `"b"`, ...); the ground and frame use the reserved
/// ids from [`crate::config`].
pub type ShapeId = String;

/// The physical form of a shape, expressed in the shape's own local space
/// (i.e. before `pose` is applied).
#[derive(Clone, Debug)]
pub enum ShapeKind {
    Circle { r: f64 },
    /// A polygon given by its vertices in local space, in counterclockwise
    /// order. `closed` mirrors the source's distinction between closed
    /// polygons (solid shapes) and open polylines (unused by any shipped
    /// feature, but part of the contract).
    Polygon { points: Vec<Vec2>, closed: bool },
}

/// A single rigid shape participating in a scene: one entry in
/// [`crate::scene::Scene::shapes`], paired with a physics body and (once
/// [`crate::node::SceneNode::register_objects`] has run) an [`ObjectNode`][crate::node::ObjectNode].
#[derive(Clone, Debug)]
pub struct Shape {
    pub id: ShapeId,
    pub pose: Pose,
    pub kind: ShapeKind,
    /// Ground and frame shapes are not movable and never get an ObjectNode
    /// entry in `SceneNode::objs`.
    pub movable: bool,
    /// Scale factor from physics-engine units to the normalized 100x100
    /// scene used by every sigmoid in the feature library.
    pub phys_scale: f64,
    pub body: BodyHandle,
    /// Index into `SceneNode::objs`, set once by `register_objects`.
    pub object_node: Option<usize>,
}

impl Shape {
    pub fn new_circle(id: impl Into<ShapeId>, pose: Pose, r: f64, body: BodyHandle) -> Self {
        Shape {
            id: id.into(),
            pose,
            kind: ShapeKind::Circle { r },
            movable: true,
            phys_scale: 1.0,
            body,
            object_node: None,
        }
    }

    pub fn new_polygon(
        id: impl Into<ShapeId>,
        pose: Pose,
        points: Vec<Vec2>,
        body: BodyHandle,
    ) -> Self {
        Shape {
            id: id.into(),
            pose,
            kind: ShapeKind::Polygon {
                points,
                closed: true,
            },
            movable: true,
            phys_scale: 1.0,
            body,
            object_node: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.pose.translation
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.kind, ShapeKind::Circle { .. })
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self.kind, ShapeKind::Polygon { .. })
    }

    pub fn closed(&self) -> bool {
        match &self.kind {
            ShapeKind::Polygon { closed, .. } => *closed,
            ShapeKind::Circle { .. } => true,
        }
    }

    /// Vertices transformed into world (scene) space, in their original
    /// (counterclockwise) order. Empty for circles.
    pub fn ordered_vertices(&self) -> Vec<Vec2> {
        match &self.kind {
            ShapeKind::Polygon { points, .. } => {
                points.iter().map(|&p| self.pose.transform_point(p)).collect()
            }
            ShapeKind::Circle { .. } => Vec::new(),
        }
    }

    /// Alias kept for parity with the source's `pts` accessor.
    pub fn vertices(&self) -> Vec<Vec2> {
        self.ordered_vertices()
    }

    pub fn area(&self) -> f64 {
        match &self.kind {
            ShapeKind::Circle { r } => std::f64::consts::PI * r * r,
            ShapeKind::Polygon { points, .. } => polygon_area(points),
        }
    }

    pub fn bounding_box(&self) -> AABB {
        match &self.kind {
            ShapeKind::Circle { r } => AABB {
                min: self.position() - Vec2::new(*r, *r),
                max: self.position() + Vec2::new(*r, *r),
            },
            ShapeKind::Polygon { .. } => {
                let verts = self.ordered_vertices();
                let mut min = verts[0];
                let mut max = verts[0];
                for &v in &verts[1..] {
                    min = Vec2::new(min.x.min(v.x), min.y.min(v.y));
                    max = Vec2::new(max.x.max(v.x), max.y.max(v.y));
                }
                AABB { min, max }
            }
        }
    }

    /// Edge lengths, in winding order, optionally sorted ascending. Empty
    /// for circles.
    pub fn edge_lengths(&self, sorted: bool) -> Vec<f64> {
        let verts = self.ordered_vertices();
        if verts.len() < 2 {
            return Vec::new();
        }
        let n = verts.len();
        let mut lens: Vec<f64> = (0..n)
            .map(|i| (verts[(i + 1) % n] - verts[i]).mag())
            .collect();
        if sorted {
            lens.sort_by(|a, b| a.partial_cmp(b).unwrap());
        }
        lens
    }

    /// Interior angle at vertex `i`, in degrees. Undefined (returns 0) for
    /// circles or degenerate polygons.
    pub fn angle(&self, i: usize) -> f64 {
        let verts = self.ordered_vertices();
        let n = verts.len();
        if n < 3 {
            return 0.0;
        }
        let prev = verts[(i + n - 1) % n];
        let curr = verts[i % n];
        let next = verts[(i + 1) % n];
        let a = prev - curr;
        let b = next - curr;
        let cos_theta = (a.dot(b) / (a.mag() * b.mag())).clamp(-1.0, 1.0);
        cos_theta.acos().to_degrees()
    }
}

/// Shoelace formula, assumes a simple (non-self-intersecting) polygon.
fn polygon_area(points: &[Vec2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BodyHandle;
    use approx::assert_relative_eq;

    fn square(side: f64) -> Shape {
        let h = side / 2.0;
        Shape::new_polygon(
            "a",
            Pose::default(),
            vec![
                Vec2::new(-h, -h),
                Vec2::new(h, -h),
                Vec2::new(h, h),
                Vec2::new(-h, h),
            ],
            BodyHandle::PLACEHOLDER,
        )
    }

    #[test]
    fn square_area_and_angles() {
        let s = square(4.0);
        assert_relative_eq!(s.area(), 16.0, epsilon = 1e-9);
        for i in 0..4 {
            assert_relative_eq!(s.angle(i), 90.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn circle_area() {
        let c = Shape::new_circle("b", Pose::default(), 2.0, BodyHandle::PLACEHOLDER);
        assert_relative_eq!(c.area(), std::f64::consts::PI * 4.0, epsilon = 1e-9);
    }
}
