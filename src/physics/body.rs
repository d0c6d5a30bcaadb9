use crate::math::Vec2;

/// Linear and angular velocity of a rigid body.
#[derive(Copy, Clone, Debug, Default)]
pub struct Velocity {
    /// Linear velocity in scene units per second.
    pub linear: Vec2,
    /// Angular velocity in radians per second.
    pub angular: f64,
}

impl Velocity {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Magnitude of the linear part, the quantity every `moves`-flavored
    /// attribute feeds into its sigmoid.
    pub fn linear_speed(&self) -> f64 {
        self.linear.mag()
    }

    /// Get the linear velocity of a point offset from the center of mass.
    pub fn point_velocity(&self, offset: Vec2) -> Vec2 {
        let tangent = crate::math::left_normal(offset) * self.angular;
        self.linear + tangent
    }
}

impl std::ops::Add for Velocity {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            linear: self.linear + other.linear,
            angular: self.angular + other.angular,
        }
    }
}
impl std::ops::AddAssign for Velocity {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
impl std::ops::Mul<f64> for Velocity {
    type Output = Velocity;
    fn mul(self, rhs: f64) -> Self::Output {
        Velocity {
            linear: self.linear * rhs,
            angular: self.angular * rhs,
        }
    }
}

/// Mass or moment of inertia of a body, which can be infinite (static or
/// kinematic bodies).
///
/// Stores both the mass and its inverse because the inverse is what's
/// actually needed during integration and is awkward to recompute for the
/// infinite case.
#[derive(Clone, Copy, Debug)]
pub enum Mass {
    Finite { mass: f64, inverse: f64 },
    Infinite,
}

impl From<f64> for Mass {
    #[inline]
    fn from(mass: f64) -> Self {
        Mass::Finite {
            mass,
            inverse: 1.0 / mass,
        }
    }
}

impl Mass {
    #[inline]
    pub fn value(&self) -> f64 {
        match self {
            Mass::Finite { mass, .. } => *mass,
            Mass::Infinite => f64::INFINITY,
        }
    }

    #[inline]
    pub fn inv(&self) -> f64 {
        match self {
            Mass::Finite { inverse, .. } => *inverse,
            Mass::Infinite => 0.0,
        }
    }
}

/// Determines how the surface of a body responds to collisions.
///
/// Uses a simplified friction model where each material has its own
/// coefficients, rather than the realistic model where every pair of
/// materials would have its own.
#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub static_friction_coef: f64,
    pub dynamic_friction_coef: f64,
    pub restitution_coef: f64,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            static_friction_coef: 1.8,
            dynamic_friction_coef: 1.5,
            restitution_coef: 0.0,
        }
    }
}

impl Material {
    pub fn restitution_with(&self, other: &Self) -> f64 {
        self.restitution_coef.max(other.restitution_coef)
    }

    pub fn dynamic_friction_with(&self, other: &Self) -> f64 {
        (self.dynamic_friction_coef + other.dynamic_friction_coef) / 2.0
    }
}

/// A rigid body's dynamic state, independent of its shape.
#[derive(Clone, Copy, Debug)]
pub struct Body {
    pub velocity: Velocity,
    pub mass: Mass,
    pub moment_of_inertia: Mass,
}

impl Body {
    pub fn new_dynamic(mass: f64, moment_of_inertia: f64) -> Self {
        Body {
            velocity: Velocity::zero(),
            mass: Mass::from(mass),
            moment_of_inertia: Mass::from(moment_of_inertia),
        }
    }

    pub fn new_static() -> Self {
        Body {
            velocity: Velocity::zero(),
            mass: Mass::Infinite,
            moment_of_inertia: Mass::Infinite,
        }
    }

    pub fn with_velocity(mut self, vel: Velocity) -> Self {
        self.velocity = vel;
        self
    }

    /// Static and kinematic bodies never move under force or collision.
    #[inline]
    pub fn sees_forces(&self) -> bool {
        !matches!(
            (self.mass, self.moment_of_inertia),
            (Mass::Infinite, Mass::Infinite)
        )
    }
}
