//! A scene: the shapes a [`crate::node::SceneNode`] perceives (§3).

use crate::config;
use crate::shape::Shape;

/// The set of shapes making up one physics problem panel.
///
/// Ground and frame are split out by their reserved ids (`"_"` and `"|"`)
/// at construction time; everything else is a movable object.
pub struct Scene {
    pub shapes: Vec<Shape>,
    pub ground: Option<Shape>,
    pub frame: Option<Shape>,
}

impl Scene {
    pub fn new(shapes: impl IntoIterator<Item = Shape>) -> Self {
        let mut movable = Vec::new();
        let mut ground = None;
        let mut frame = None;
        for shape in shapes {
            if shape.id == config::GROUND_ID {
                ground = Some(shape);
            } else if shape.id == config::FRAME_ID {
                frame = Some(shape);
            } else {
                movable.push(shape);
            }
        }
        Scene {
            shapes: movable,
            ground,
            frame,
        }
    }

    /// The vertical extent used by `top_pos`/`bottom_pos` (§4.2): the
    /// ground's top surface in scene coordinates, falling back to the scene
    /// height when there is no ground shape.
    ///
    /// The spec's formula (`ground.y + ground.bbox.y + ground.bbox.height`)
    /// is stated in terms of a bounding box local to the ground shape, with
    /// `ground.y` added back in separately. `Shape::bounding_box` here is
    /// already expressed in world (scene) space, so that whole sum collapses
    /// to the box's world-space top edge — adding `ground.position().y`
    /// again would double-count it.
    pub fn max_y(&self) -> f64 {
        match &self.ground {
            Some(g) => g.bounding_box().max.y,
            None => config::SCENE_SIZE,
        }
    }
}
