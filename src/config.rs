//! Process-wide configuration, mirroring the source's `pbpSettings` module.

/// The scene is always normalized to this many units on each side.
pub const SCENE_SIZE: f64 = 100.0;

/// `width * height` of the normalized scene, used to express object area as
/// a percentage for the `small`/`large` attributes.
pub const SCENE_AREA: f64 = SCENE_SIZE * SCENE_SIZE;

/// Default clustering distance (in scene-normalized units) used by
/// [`crate::oracle::Oracle::get_spatial_groups`] and [`GroupNode::spatial_groups`][crate::node::GroupNode::spatial_groups].
pub const DEFAULT_MAX_DIST: f64 = 0.06;

/// The boundary between an "active" and an "inactive" percept when matching
/// against a label in a selector.
pub const ACTIVATION_THRESHOLD: f64 = 0.5;

/// How many scene pairs a [`Solution`][crate::solution::Solution] is expected
/// to be checked against before it can be declared complete.
pub const DEFAULT_SCENE_PAIR_COUNT: usize = 8;

/// Shape ids reserved for the ground and the frame of the scene.
pub const GROUND_ID: &str = "_";
pub const FRAME_ID: &str = "|";
