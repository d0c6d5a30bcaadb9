//! Types, aliases and helper operations for doing math with `ultraviolet`.
//!
//! The scene coordinate system is always 2D and uses `f64` throughout;
//! everything downstream (features, selectors) assumes this precision.

pub use ultraviolet::DVec2 as Vec2;

/// A rigid transform: translation plus rotation, no scaling.
///
/// Scenes in this crate never need nonuniform scale, so a full similarity
/// transform would just be unused generality.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub translation: Vec2,
    pub rotation: Angle,
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            translation: Vec2::zero(),
            rotation: Angle::default(),
        }
    }
}

impl Pose {
    pub fn new(translation: Vec2, rotation: Angle) -> Self {
        Pose {
            translation,
            rotation,
        }
    }

    /// Transform a point from local space into the space this pose is defined in.
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.translation + rotate(p, self.rotation)
    }

    /// Transform a vector (ignoring translation) from local to outer space.
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        rotate(v, self.rotation)
    }

    /// The inverse of this pose, such that `p.inversed() * (p * v) == v`.
    pub fn inversed(&self) -> Self {
        let inv_rot = Angle::Rad(-self.rotation.rad());
        Pose {
            translation: rotate(-self.translation, inv_rot),
            rotation: inv_rot,
        }
    }

    /// Transform a point from the outer space into this pose's local space.
    pub fn inverse_transform_point(&self, p: Vec2) -> Vec2 {
        rotate(p - self.translation, Angle::Rad(-self.rotation.rad()))
    }

    pub fn append_translation(&mut self, t: Vec2) {
        self.translation += t;
    }

    pub fn prepend_rotation(&mut self, r: Angle) {
        self.rotation = Angle::Rad(self.rotation.rad() + r.rad());
    }
}

fn rotate(v: Vec2, angle: Angle) -> Vec2 {
    let (sin, cos) = angle.rad().sin_cos();
    Vec2::new(cos * v.x - sin * v.y, sin * v.x + cos * v.y)
}

/// An angle in either degrees or radians.
///
/// Default conversion from `f64` is in radians.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}

impl Angle {
    pub fn deg(&self) -> f64 {
        match self {
            Angle::Rad(rad) => rad.to_degrees(),
            Angle::Deg(deg) => *deg,
        }
    }

    pub fn rad(&self) -> f64 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg.to_radians(),
        }
    }
}

impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}

// Vec2 utils

/// The normal pointing 90 degrees counterclockwise from `v`.
pub fn left_normal(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// The normal pointing 90 degrees clockwise from `v`.
pub fn right_normal(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Euclidean distance between two points.
pub fn dist(a: Vec2, b: Vec2) -> f64 {
    (a - b).mag()
}
