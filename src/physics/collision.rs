pub mod hgrid;
pub use hgrid::{HGrid, HGridParams};

pub mod narrowphase;
pub use narrowphase::{surface_distance, Contact};

use crate::math::Vec2;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug)]
pub struct AABB {
    pub min: Vec2,
    pub max: Vec2,
}

impl AABB {
    pub fn zero() -> Self {
        AABB {
            min: Vec2::zero(),
            max: Vec2::zero(),
        }
    }

    /// Increase the size of the AABB by the same amount in all directions.
    pub fn padded(mut self, amount: f64) -> Self {
        self.min.x -= amount;
        self.min.y -= amount;
        self.max.x += amount;
        self.max.y += amount;
        self
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// The smallest box containing both given boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
