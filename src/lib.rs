//! Feature extraction and selector/solution reasoning over 2D rigid-body
//! scenes.
//!
//! A [`scene::Scene`] of rigid bodies is perceived through a graded feature
//! library ([`feature`]) into a cached [`node::SceneNode`]; selectors
//! ([`selector`]) and solutions ([`solution`]) are built out of those
//! features to classify scenes in Bongard-style physics problems.

pub mod config;
pub mod error;
pub mod math;
pub mod sigmoid;

pub mod physics;
pub mod shape;

pub mod oracle;
pub mod scene;

pub mod feature;
pub mod node;

pub mod selector;
pub mod solution;

pub use error::{PerceptionError, Result};
