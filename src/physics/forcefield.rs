use crate::math::Vec2;

/// A (possibly) position-dependent force applied to every dynamic body each
/// step.
pub trait ForceField {
    fn value_at(&self, position: Vec2) -> Vec2;
}

/// Constant gravity field over all of space.
#[derive(Clone, Copy, Debug)]
pub struct Gravity(pub Vec2);

impl Default for Gravity {
    fn default() -> Self {
        // scene units per second squared (the scene is a 100x100 square),
        // tuned so a 0.1-0.3s counterfactual push produces motion the
        // attribute thresholds in `feature::attributes` can distinguish
        Gravity(Vec2::new(0.0, -40.0))
    }
}

impl ForceField for Gravity {
    fn value_at(&self, _pos: Vec2) -> Vec2 {
        self.0
    }
}
