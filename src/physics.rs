//! The minimal rigid-body simulator backing [`crate::oracle::SimOracle`].
//!
//! This is deliberately not a general physics engine: broad phase, narrow
//! phase and a basic penetration solver, enough to make the counterfactual
//! probes in [`crate::feature`] behave sensibly over short time windows.

pub mod collision;

pub mod forcefield;
pub use forcefield::{ForceField, Gravity};

mod body;
pub use body::{Body, Mass, Material, Velocity};

mod world;
pub use world::{BodyHandle, PhysWorld};
