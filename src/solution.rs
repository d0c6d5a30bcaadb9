//! A [`Selector`] paired with a side assignment and cardinality mode, used
//! to classify "left" vs "right" example scenes in a Bongard-style physics
//! problem (§4.6).

use crate::config;
use crate::error::Result;
use crate::node::{GroupNode, SceneNode};
use crate::oracle::Oracle;
use crate::selector::Selector;

/// Post-selection cardinality test applied to the selector's result against
/// one scene (§4.6 `mode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Exactly one object must survive.
    Unique,
    /// At least one object must survive.
    Exists,
    /// Every original object must survive.
    All,
}

/// Which side of a scene pair a solution is believed to fire on (§4.6
/// `main_side`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Both,
    Fail,
}

/// Identifies one scene pair a solution has been checked against. The
/// source keys this off whatever id the problem set assigns a pair; a
/// `u64` stands in for that here.
pub type PairId = u64;

/// A selector plus the bookkeeping needed to decide whether it separates
/// left-side from right-side example scenes (§4.6).
#[derive(Clone, Debug)]
pub struct Solution {
    pub selector: Selector,
    pub mode: Mode,
    pub main_side: Side,
    pub lchecks: usize,
    pub rchecks: usize,
    pub lmatches: usize,
    pub rmatches: usize,
    pub matched_against: Vec<PairId>,
    /// How many scene pairs this solution is expected to be checked
    /// against before `is_solution` can fire (§6 `pbpSettings`, default 8).
    pub scene_pair_count: usize,
}

impl Solution {
    pub fn new(selector: Selector, mode: Mode) -> Self {
        Solution {
            selector,
            mode,
            main_side: Side::Both,
            lchecks: 0,
            rchecks: 0,
            lmatches: 0,
            rmatches: 0,
            matched_against: Vec::new(),
            scene_pair_count: config::DEFAULT_SCENE_PAIR_COUNT,
        }
    }

    /// Applies the selector to the whole scene and validates `mode` against
    /// the surviving member count (§4.6 `check_scene`). Returns the
    /// surviving count on success, `None` if the mode's cardinality test
    /// fails.
    pub fn check_scene<O: Oracle>(&self, scene: &mut SceneNode<O>) -> Result<Option<usize>> {
        let full = GroupNode::scene_group(scene, None);
        let original_count = full.members.len();
        let result = self.selector.select(scene, &full)?;
        let n = result.members.len();
        let fits = match self.mode {
            Mode::Unique => n == 1,
            Mode::Exists => n >= 1,
            Mode::All => n == original_count,
        };
        scene.fits_solution = Some(fits);
        Ok(if fits { Some(n) } else { None })
    }

    /// Applies the selector to both scenes of a pair (§4.6
    /// `checkScenePair`), accumulating per-side counters and recomputing
    /// [`Solution::main_side`] from the table in §4.6.
    pub fn check_scene_pair<O: Oracle>(
        &mut self,
        left: &mut SceneNode<O>,
        right: &mut SceneNode<O>,
        pair_id: PairId,
    ) -> Result<()> {
        let l_matched = self.check_scene(left)?.is_some();
        let r_matched = self.check_scene(right)?.is_some();

        self.lchecks += 1;
        self.rchecks += 1;
        if l_matched {
            self.lmatches += 1;
        }
        if r_matched {
            self.rmatches += 1;
        }
        self.matched_against.push(pair_id);

        self.main_side = if self.lmatches == 0 && self.rmatches == self.rchecks {
            Side::Right
        } else if self.rmatches == 0 && self.lmatches == self.lchecks {
            Side::Left
        } else if self.lmatches == self.lchecks && self.rmatches == self.rchecks {
            Side::Both
        } else {
            Side::Fail
        };
        Ok(())
    }

    /// `isSolution()` (§4.6, §8 P8): true iff one side has matched every
    /// scene checked so far (up to `scene_pair_count`) and the other side
    /// has zero matches.
    pub fn is_solution(&self) -> bool {
        (self.rmatches == 0 && self.lmatches == self.scene_pair_count)
            || (self.lmatches == 0 && self.rmatches == self.scene_pair_count)
    }

    /// Screens a pair of candidate solutions for merge viability (§4.6
    /// `compatibleWith`): merging two solutions that have already
    /// definitively settled on *different* sides cannot help, since no
    /// scene pair can satisfy both at once. A solution that has already
    /// `Fail`ed is never compatible with anything.
    pub fn compatible_with(&self, other: &Solution) -> bool {
        match (self.main_side, other.main_side) {
            (Side::Fail, _) | (_, Side::Fail) => false,
            (Side::Both, _) | (_, Side::Both) => true,
            (a, b) => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{ObjAttrKey, RelKey};
    use crate::math::{Angle, Pose, Vec2};
    use crate::oracle::SimOracle;
    use crate::physics::{Material, PhysWorld};
    use crate::scene::Scene;
    use crate::selector::{AttrMatcher, RelMatcher};
    use crate::shape::Shape;

    /// `small` object left of a `circle`, vs. not — used to exercise
    /// `check_scene_pair`/`is_solution` (§8 scenario 6, specialized to one
    /// relation so the fixture stays simple).
    fn scene_with(small_left_of_circle: bool) -> SceneNode<SimOracle> {
        let mut world = PhysWorld::new();
        let ground_body = world.add_static(
            Pose::new(Vec2::new(50.0, 0.0), Angle::default()),
            crate::shape::ShapeKind::Polygon {
                points: vec![
                    Vec2::new(-200.0, -5.0),
                    Vec2::new(200.0, -5.0),
                    Vec2::new(200.0, 0.0),
                    Vec2::new(-200.0, 0.0),
                ],
                closed: true,
            },
            Material::default(),
        );
        let (small_x, big_x) = if small_left_of_circle { (10.0, 80.0) } else { (80.0, 10.0) };
        let small_body = world.add_dynamic(
            Pose::new(Vec2::new(small_x, 3.0), Angle::default()),
            crate::shape::ShapeKind::Circle { r: 3.0 },
            1.0,
            Material::default(),
        );
        let big_body = world.add_dynamic(
            Pose::new(Vec2::new(big_x, 3.0), Angle::default()),
            crate::shape::ShapeKind::Circle { r: 20.0 },
            1.0,
            Material::default(),
        );

        let ground = Shape::new_polygon(
            "_",
            Pose::new(Vec2::new(50.0, 0.0), Angle::default()),
            vec![
                Vec2::new(-200.0, -5.0),
                Vec2::new(200.0, -5.0),
                Vec2::new(200.0, 0.0),
                Vec2::new(-200.0, 0.0),
            ],
            ground_body,
        );
        let small = Shape::new_circle("small", Pose::new(Vec2::new(small_x, 3.0), Angle::default()), 3.0, small_body);
        let big = Shape::new_circle("big", Pose::new(Vec2::new(big_x, 3.0), Angle::default()), 20.0, big_body);

        let scene = Scene::new([ground, small, big]);
        let oracle = SimOracle::new(world);
        let mut node = SceneNode::new(scene, oracle);
        node.oracle.goto_state("start");
        node
    }

    fn small_left_of_circle_selector() -> Selector {
        let mut other_sel = Selector::blank();
        other_sel.add_attr(AttrMatcher::new(ObjAttrKey::Circle, "circle", true, "start"));
        let mut sel = Selector::blank();
        sel.add_attr(AttrMatcher::new(ObjAttrKey::Small, "small", true, "start"));
        sel.add_rel(RelMatcher::new(other_sel, RelKey::LeftOf, "left_of", true, "start").unwrap());
        sel
    }

    #[test]
    fn check_scene_exists_mode_needs_one_survivor() {
        let mut scene = scene_with(true);
        let sol = Solution::new(small_left_of_circle_selector(), Mode::Exists);
        let n = sol.check_scene(&mut scene).unwrap();
        assert_eq!(n, Some(1));
        assert_eq!(scene.fits_solution, Some(true));
    }

    #[test]
    fn check_scene_exists_mode_fails_without_match() {
        let mut scene = scene_with(false);
        let sol = Solution::new(small_left_of_circle_selector(), Mode::Exists);
        let n = sol.check_scene(&mut scene).unwrap();
        assert_eq!(n, None);
        assert_eq!(scene.fits_solution, Some(false));
    }

    #[test]
    fn check_scene_pair_classifies_left_side() {
        let mut sol = Solution::new(small_left_of_circle_selector(), Mode::Exists);
        for id in 0..config::DEFAULT_SCENE_PAIR_COUNT as u64 {
            let mut left = scene_with(true);
            let mut right = scene_with(false);
            sol.check_scene_pair(&mut left, &mut right, id).unwrap();
        }
        assert_eq!(sol.lmatches, config::DEFAULT_SCENE_PAIR_COUNT);
        assert_eq!(sol.rmatches, 0);
        assert_eq!(sol.main_side, Side::Left);
        assert!(sol.is_solution());
    }

    #[test]
    fn check_scene_pair_fails_when_mixed() {
        let mut sol = Solution::new(small_left_of_circle_selector(), Mode::Exists);
        let mut left = scene_with(true);
        let mut right = scene_with(true);
        sol.check_scene_pair(&mut left, &mut right, 0).unwrap();
        assert_eq!(sol.main_side, Side::Both);
        let mut left2 = scene_with(true);
        let mut right2 = scene_with(false);
        sol.check_scene_pair(&mut left2, &mut right2, 1).unwrap();
        assert_eq!(sol.main_side, Side::Fail);
        assert!(!sol.is_solution());
    }

    #[test]
    fn compatible_with_rejects_opposite_sides() {
        let mut left_sol = Solution::new(small_left_of_circle_selector(), Mode::Exists);
        left_sol.main_side = Side::Left;
        let mut right_sol = Solution::new(small_left_of_circle_selector(), Mode::Exists);
        right_sol.main_side = Side::Right;
        assert!(!left_sol.compatible_with(&right_sol));

        let mut both_sol = Solution::new(small_left_of_circle_selector(), Mode::Exists);
        both_sol.main_side = Side::Both;
        assert!(left_sol.compatible_with(&both_sol));
    }
}
