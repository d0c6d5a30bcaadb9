//! Pure (non-counterfactual) object attributes: shape classification,
//! size, and position (§4.2).

use crate::config;
use crate::shape::{Shape, ShapeKind};
use crate::sigmoid::{close_membership, sigma};

/// Classifies a shape's geometric kind. Constant: computed once from the
/// shape's vertices, never from simulator state.
pub fn classify_shape(shape: &Shape) -> &'static str {
    match &shape.kind {
        ShapeKind::Circle { .. } => "circle",
        ShapeKind::Polygon { points, closed } if *closed && points.len() == 3 => "triangle",
        ShapeKind::Polygon { points, closed } if *closed && points.len() == 4 => {
            let angles_ok = (0..4).all(|i| {
                let a = shape.angle(i);
                (70.0..=110.0).contains(&a)
            });
            if !angles_ok {
                return "unknown";
            }
            let mut edges = shape.edge_lengths(true);
            edges.retain(|l| *l > 0.0);
            let shortest = edges.first().copied().unwrap_or(0.0);
            let longest = edges.last().copied().unwrap_or(1.0);
            if longest > 0.0 && shortest / longest >= 0.7 {
                "square"
            } else {
                "rectangle"
            }
        }
        _ => "unknown",
    }
}

pub fn shape_activity(label: &str) -> f64 {
    if label == "unknown" {
        0.0
    } else {
        1.0
    }
}

pub fn circle_activity(label: &str) -> f64 {
    (label == "circle") as u8 as f64
}

pub fn square_activity(label: &str) -> f64 {
    (label == "square") as u8 as f64
}

pub fn triangle_activity(label: &str) -> f64 {
    (label == "triangle") as u8 as f64
}

/// `rect` treats a square as a soft (partial) match: it *is* a rectangle,
/// but not the feature's focal case.
pub fn rect_activity(label: &str) -> f64 {
    match label {
        "rectangle" => 1.0,
        "square" => 0.4,
        _ => 0.0,
    }
}

/// Area as a percentage of the scene's total area.
pub fn area_percent(area: f64) -> f64 {
    area / config::SCENE_AREA * 100.0
}

pub fn small_activity(area_pct: f64) -> f64 {
    1.0 - sigma(4.0, 1.8, area_pct)
}

pub fn large_activity(area_pct: f64) -> f64 {
    sigma(4.0, 2.0, area_pct)
}

pub fn left_pos_activity(x: f64) -> f64 {
    1.0 - sigma(20.0, 0.4, x / config::SCENE_SIZE)
}

pub fn right_pos_activity(x: f64) -> f64 {
    let from_right = config::SCENE_SIZE - x;
    1.0 - sigma(20.0, 0.4, from_right / config::SCENE_SIZE)
}

pub fn top_pos_activity(y: f64, max_y: f64) -> f64 {
    1.0 - sigma(20.0, 0.45, y / max_y)
}

pub fn bottom_pos_activity(y: f64, max_y: f64) -> f64 {
    1.0 - sigma(20.0, 0.3, y / max_y)
}

/// Fuzzy "this object is (one of) the extremum on this axis": close to 1
/// when `val` is within a hair of `extremum`.
pub fn extremum_activity(val: f64, extremum: f64) -> f64 {
    close_membership(2.5 * (val - extremum).abs())
}

/// A continuous stand-in for the boolean `touch` test, used by `single`
/// (§4.2) to subtract out objects already counted as touching. The hard
/// `touch` threshold is 0.5 physics units; this membership saturates over
/// roughly the same band. `dist` is a raw scene-unit distance.
pub fn touch_membership(dist: f64) -> f64 {
    sigma(40.0, 0.005, dist / config::SCENE_SIZE)
}

pub fn single_activity(nearest_dist: f64) -> f64 {
    (sigma(40.0, 0.03, nearest_dist / config::SCENE_SIZE) - touch_membership(nearest_dist)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Pose;
    use approx::assert_relative_eq;

    fn square(side: f64) -> Shape {
        let h = side / 2.0;
        Shape::new_polygon(
            "a",
            Pose::default(),
            vec![
                crate::math::Vec2::new(-h, -h),
                crate::math::Vec2::new(h, -h),
                crate::math::Vec2::new(h, h),
                crate::math::Vec2::new(-h, h),
            ],
            crate::physics::BodyHandle::PLACEHOLDER,
        )
    }

    fn rect(w: f64, h: f64) -> Shape {
        let (hw, hh) = (w / 2.0, h / 2.0);
        Shape::new_polygon(
            "a",
            Pose::default(),
            vec![
                crate::math::Vec2::new(-hw, -hh),
                crate::math::Vec2::new(hw, -hh),
                crate::math::Vec2::new(hw, hh),
                crate::math::Vec2::new(-hw, hh),
            ],
            crate::physics::BodyHandle::PLACEHOLDER,
        )
    }

    #[test]
    fn classifies_square_and_rectangle() {
        assert_eq!(classify_shape(&square(4.0)), "square");
        let r = rect(2.0, 5.0);
        assert_eq!(classify_shape(&r), "rectangle");
        assert_relative_eq!(rect_activity("rectangle"), 1.0);
        assert_relative_eq!(rect_activity("square"), 0.4);
        assert_relative_eq!(square_activity("rectangle"), 0.0);
    }

    #[test]
    fn circle_area_small_large() {
        let area = 120.0;
        let pct = area_percent(area);
        assert_relative_eq!(small_activity(pct), 1.0 - sigma(4.0, 1.8, pct));
        assert!(small_activity(pct) > large_activity(pct));
    }

    #[test]
    fn extremum_is_one_at_the_extremum_itself() {
        assert_relative_eq!(extremum_activity(5.0, 5.0), close_membership(0.0));
    }
}
