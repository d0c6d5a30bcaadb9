//! Compositional predicates over the perception graph (§4.5): [`Selector`],
//! [`AttrMatcher`] and [`RelMatcher`], and the selection semantics that turn
//! a [`crate::node::GroupNode`] into a filtered refinement of itself.
//!
//! A selector is a conjunction of three matcher lists (object attributes,
//! group attributes, relations). [`RelMatcher`] is deliberately relation-free
//! inside its nested `other_sel` (§4.5 "Disallowed") — enforced here at
//! construction rather than discovered later at match time, since a Rust
//! type can make the illegal state unconstructable.

use crate::config;
use crate::error::{PerceptionError, Result};
use crate::feature::{GroupAttrKey, ObjAttrKey, RelKey};
use crate::node::{GroupNode, ObjRef, SceneNode};
use crate::oracle::Oracle;

/// Matches a node's cached object attribute against a label and polarity
/// (§4.5 `AttrMatcher`).
#[derive(Clone, Debug, PartialEq)]
pub struct AttrMatcher {
    pub key: ObjAttrKey,
    pub label: String,
    pub active: bool,
    pub time: String,
}

impl AttrMatcher {
    pub fn new(key: ObjAttrKey, label: impl Into<String>, active: bool, time: impl Into<String>) -> Self {
        AttrMatcher {
            key,
            label: label.into(),
            active,
            time: time.into(),
        }
    }

    /// `true` iff this attribute was requested at a time other than
    /// `"start"` (§4.5 "Complexity").
    fn is_timed(&self) -> bool {
        self.time != "start"
    }

    fn complexity(&self) -> u32 {
        1 + self.is_timed() as u32 + if self.active { 0 } else { 2 }
    }

    fn matches<O: Oracle>(&self, scene: &mut SceneNode<O>, node: ObjRef) -> Result<bool> {
        let time = if self.key.descriptor().constant { "start" } else { &self.time };
        match scene.get_obj_attr(node, self.key, Some(time), false)? {
            Some(attr) => Ok(attr.get_label() == self.label
                && (attr.get_activity() >= config::ACTIVATION_THRESHOLD) == self.active),
            None => Ok(false),
        }
    }
}

/// Matches a group's cached group attribute (same shape as [`AttrMatcher`],
/// but `arity=1, targetType=group`).
#[derive(Clone, Debug, PartialEq)]
pub struct GroupAttrMatcher {
    pub key: GroupAttrKey,
    pub label: String,
    pub active: bool,
    pub time: String,
}

impl GroupAttrMatcher {
    pub fn new(key: GroupAttrKey, label: impl Into<String>, active: bool, time: impl Into<String>) -> Self {
        GroupAttrMatcher {
            key,
            label: label.into(),
            active,
            time: time.into(),
        }
    }

    fn is_timed(&self) -> bool {
        self.time != "start"
    }

    fn complexity(&self) -> u32 {
        1 + self.is_timed() as u32 + if self.active { 0 } else { 2 }
    }

    fn matches<O: Oracle>(&self, scene: &mut SceneNode<O>, group: &GroupNode) -> Result<bool> {
        let time = if self.key.descriptor().constant { "start" } else { &self.time };
        let attr = scene.get_group_attr(group, self.key, Some(time))?;
        Ok(attr.get_label() == self.label
            && (attr.get_activity() >= config::ACTIVATION_THRESHOLD) == self.active)
    }
}

/// Matches a node's relation to some partner, where the partner set itself
/// is described by a nested, relation-free [`Selector`] (§4.5 `RelMatcher`).
///
/// Constructing a `RelMatcher` whose `other_sel` itself carries relation
/// matchers fails with [`PerceptionError::IllegalNesting`] (§7
/// `IllegalNesting`, enforced at construction per the design notes rather
/// than discovered later at `match` time).
#[derive(Clone, Debug, PartialEq)]
pub struct RelMatcher {
    pub other_sel: Box<Selector>,
    pub key: RelKey,
    pub label: String,
    pub active: bool,
    pub time: String,
}

impl RelMatcher {
    pub fn new(
        other_sel: Selector,
        key: RelKey,
        label: impl Into<String>,
        active: bool,
        time: impl Into<String>,
    ) -> Result<Self> {
        if !other_sel.rels.is_empty() {
            return Err(PerceptionError::IllegalNesting(key.name().to_string()));
        }
        Ok(RelMatcher {
            other_sel: Box::new(other_sel),
            key,
            label: label.into(),
            active,
            time: time.into(),
        })
    }

    fn is_timed(&self) -> bool {
        self.time != "start"
    }

    fn complexity(&self) -> u32 {
        1 + self.is_timed() as u32 + if self.active { 0 } else { 2 } + self.other_sel.complexity()
    }

    /// A direct percept from `node` to `other` for this matcher's `key` at
    /// `time`, matching `label` with the relation *active* (§4.5 step 2's
    /// `pair_predicate`). This always tests the positive sense of the
    /// relation regardless of `self.active`: `self.active` only governs how
    /// `matches` interprets the resulting partner count (existential vs.
    /// universal negation), not what counts as "this other stands in the
    /// relation" in the first place.
    fn pair_holds<O: Oracle>(&self, scene: &mut SceneNode<O>, node: ObjRef, other: ObjRef) -> Result<bool> {
        let time = if self.key.descriptor().constant { "start" } else { &self.time };
        match scene.get_relation(node, self.key, other, Some(time), false)? {
            Some(rel) => {
                Ok(rel.get_label() == self.label && rel.get_activity() >= config::ACTIVATION_THRESHOLD)
            }
            None => Ok(false),
        }
    }

    /// §4.5 "RelMatcher.match": the resolution rule the whole selector
    /// design hinges on. `others` defaults to every other movable object in
    /// the scene when not supplied by the caller.
    pub fn matches<O: Oracle>(
        &self,
        scene: &mut SceneNode<O>,
        node: ObjRef,
        others: Option<&[ObjRef]>,
    ) -> Result<bool> {
        let owned;
        let candidates: &[ObjRef] = match others {
            Some(o) => o,
            None => {
                owned = scene.others(node);
                &owned
            }
        };

        let mut matching = 0u32;
        for &other in candidates {
            let pair_ok = self.pair_holds(scene, node, other)?;
            if self.other_sel.matches_object(scene, other, None, Some(pair_ok))? {
                matching += 1;
            }
        }

        if !self.active {
            // Negation: universal — nobody may stand in this relation.
            return Ok(matching == 0);
        }
        if self.other_sel.unique {
            return Ok(matching == 1);
        }
        Ok(matching >= 1)
    }
}

/// What kind of node a [`Selector`] can apply to, derived from which matcher
/// lists are non-empty (§4.5 "Type").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorType {
    Blank,
    Object,
    Group,
    Mixed,
}

/// A conjunction of object-attribute, group-attribute and relation matchers
/// (§4.5). `unique` changes relational partner quantification only — the
/// source's docstring claims a broader effect but the implementation (and
/// this port, per SPEC_FULL.md's open-question decision) only consults it
/// inside [`RelMatcher::matches`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selector {
    pub obj_attrs: Vec<AttrMatcher>,
    pub grp_attrs: Vec<GroupAttrMatcher>,
    pub rels: Vec<RelMatcher>,
    pub unique: bool,
}

impl Selector {
    pub fn blank() -> Self {
        Selector::default()
    }

    pub fn selector_type(&self) -> SelectorType {
        if self.obj_attrs.is_empty() && self.grp_attrs.is_empty() && self.rels.is_empty() {
            SelectorType::Blank
        } else if self.grp_attrs.is_empty() {
            SelectorType::Object
        } else if self.obj_attrs.is_empty() && self.rels.is_empty() {
            SelectorType::Group
        } else {
            SelectorType::Mixed
        }
    }

    /// §4.5 "Complexity": sum of every matcher's own complexity.
    pub fn complexity(&self) -> u32 {
        self.obj_attrs.iter().map(AttrMatcher::complexity).sum::<u32>()
            + self.grp_attrs.iter().map(GroupAttrMatcher::complexity).sum::<u32>()
            + self.rels.iter().map(RelMatcher::complexity).sum::<u32>()
    }

    /// `add_attr`: dedup by `(key, time)`, later wins (§4.5 "Merge").
    pub fn add_attr(&mut self, m: AttrMatcher) {
        self.obj_attrs.retain(|e| !(e.key == m.key && e.time == m.time));
        self.obj_attrs.push(m);
    }

    pub fn add_group_attr(&mut self, m: GroupAttrMatcher) {
        self.grp_attrs.retain(|e| !(e.key == m.key && e.time == m.time));
        self.grp_attrs.push(m);
    }

    /// `add_rel`: dedup by `(key, time, other_sel equality)`, later wins.
    pub fn add_rel(&mut self, m: RelMatcher) {
        self.rels
            .retain(|e| !(e.key == m.key && e.time == m.time && e.other_sel == m.other_sel));
        self.rels.push(m);
    }

    /// `mergedWith`: concatenate matcher lists, deduplicating through
    /// `add_attr`/`add_group_attr`/`add_rel` (§4.5 "Merge"). `unique` is
    /// carried over from `other` when set.
    pub fn merged_with(&self, other: &Selector) -> Selector {
        let mut merged = self.clone();
        for m in &other.obj_attrs {
            merged.add_attr(m.clone());
        }
        for m in &other.grp_attrs {
            merged.add_group_attr(m.clone());
        }
        for m in &other.rels {
            merged.add_rel(m.clone());
        }
        merged.unique = merged.unique || other.unique;
        merged
    }

    /// `matchesObject(node, others?, test_fn?)` (§4.5): object attrs must
    /// all hold, and either `test_fn` (the pre-evaluated relation result
    /// [`RelMatcher::matches`] passes down when checking a partner
    /// candidate) stands in for the relation check, or every `rels` matcher
    /// must hold against `others`.
    pub fn matches_object<O: Oracle>(
        &self,
        scene: &mut SceneNode<O>,
        node: ObjRef,
        others: Option<&[ObjRef]>,
        test_fn: Option<bool>,
    ) -> Result<bool> {
        for m in &self.obj_attrs {
            if !m.matches(scene, node)? {
                return Ok(false);
            }
        }
        if let Some(precomputed) = test_fn {
            return Ok(precomputed);
        }
        for r in &self.rels {
            if !r.matches(scene, node, others)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `select(group_node, scene_node, test_fn?)` (§4.5): the full
    /// selection procedure. A blank selector returns the group unchanged
    /// (step 1). Otherwise member shapes are filtered by `matches_object`
    /// when the selector is `object`/`mixed`, and the whole result is
    /// replaced by an empty group (still carrying this selector) when a
    /// `group`/`mixed` selector's group attrs fail.
    pub fn select<O: Oracle>(&self, scene: &mut SceneNode<O>, group: &GroupNode) -> Result<GroupNode> {
        if self.selector_type() == SelectorType::Blank {
            return Ok(group.clone());
        }

        let mut result = group.clone();
        result.selectors.push(self.clone());

        match self.selector_type() {
            SelectorType::Object | SelectorType::Mixed => {
                let mut kept = Vec::new();
                for &member in &group.members {
                    if self.matches_object(scene, member, None, None)? {
                        kept.push(member);
                        if let ObjRef::Movable(i) = member {
                            if let Some(node) = scene.objs.get_mut(i) {
                                node.selectors.push(self.clone());
                            }
                        }
                    }
                }
                result.members = kept;
            }
            _ => {}
        }

        if matches!(self.selector_type(), SelectorType::Group | SelectorType::Mixed) {
            for m in &self.grp_attrs {
                if !m.matches(scene, &result)? {
                    let mut empty = GroupNode::new(Vec::new());
                    empty.selectors.push(self.clone());
                    return Ok(empty);
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Angle, Pose, Vec2};
    use crate::node::GroupNode;
    use crate::oracle::SimOracle;
    use crate::physics::{Material, PhysWorld};
    use crate::scene::Scene;
    use crate::shape::Shape;

    fn two_circles_on_ground() -> SceneNode<SimOracle> {
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
        let a_body = world.add_dynamic(
            Pose::new(Vec2::new(10.0, 3.0), Angle::default()),
            crate::shape::ShapeKind::Circle { r: 3.0 },
            1.0,
            Material::default(),
        );
        let b_body = world.add_dynamic(
            Pose::new(Vec2::new(80.0, 3.0), Angle::default()),
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
        let a = Shape::new_circle("a", Pose::new(Vec2::new(10.0, 3.0), Angle::default()), 3.0, a_body);
        let b = Shape::new_circle("b", Pose::new(Vec2::new(80.0, 3.0), Angle::default()), 20.0, b_body);

        let scene = Scene::new([ground, a, b]);
        let oracle = SimOracle::new(world);
        let mut node = SceneNode::new(scene, oracle);
        node.oracle.goto_state("start");
        node
    }

    #[test]
    fn blank_selector_matches_everything() {
        let mut scene = two_circles_on_ground();
        let group = GroupNode::scene_group(&scene, None);
        let out = Selector::blank().select(&mut scene, &group).unwrap();
        assert_eq!(out.members.len(), 2);
    }

    #[test]
    fn attr_matcher_filters_by_label_and_polarity() {
        let mut scene = two_circles_on_ground();
        let group = GroupNode::scene_group(&scene, None);
        let mut sel = Selector::blank();
        sel.add_attr(AttrMatcher::new(ObjAttrKey::Small, "small", true, "start"));
        let out = sel.select(&mut scene, &group).unwrap();
        // "a" (area ~28) is small-ish relative to "b" (area ~1256); only "a"
        // should clear the activation threshold on `small`.
        assert_eq!(out.members.len(), 1);
        assert_eq!(out.members[0], ObjRef::Movable(0));
    }

    #[test]
    fn selector_type_classification() {
        assert_eq!(Selector::blank().selector_type(), SelectorType::Blank);

        let mut obj_only = Selector::blank();
        obj_only.add_attr(AttrMatcher::new(ObjAttrKey::Circle, "circle", true, "start"));
        assert_eq!(obj_only.selector_type(), SelectorType::Object);

        let mut grp_only = Selector::blank();
        grp_only.add_group_attr(GroupAttrMatcher::new(GroupAttrKey::Count, "2", true, "start"));
        assert_eq!(grp_only.selector_type(), SelectorType::Group);
    }

    #[test]
    fn rel_matcher_rejects_nested_relations() {
        let mut nested = Selector::blank();
        nested
            .rels
            .push(RelMatcher::new(Selector::blank(), RelKey::Touch, "touch", true, "start").unwrap());
        let err = RelMatcher::new(nested, RelKey::LeftOf, "left-of", true, "start").unwrap_err();
        assert!(matches!(err, PerceptionError::IllegalNesting(_)));
    }

    #[test]
    fn rel_matcher_negation_is_universal() {
        let mut scene = two_circles_on_ground();
        // Nobody touches "a" in this layout (far apart), so a negated touch
        // matcher should hold for every candidate.
        let rel = RelMatcher::new(Selector::blank(), RelKey::Touch, "touch", false, "start").unwrap();
        assert!(rel.matches(&mut scene, ObjRef::Movable(0), None).unwrap());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut sel = Selector::blank();
        sel.add_attr(AttrMatcher::new(ObjAttrKey::Circle, "circle", true, "start"));
        let merged = sel.merged_with(&sel);
        assert_eq!(merged, sel);
    }

    #[test]
    fn complexity_penalizes_negation_and_nontrivial_time() {
        let base = AttrMatcher::new(ObjAttrKey::Circle, "circle", true, "start");
        let negated = AttrMatcher::new(ObjAttrKey::Circle, "circle", false, "start");
        let timed = AttrMatcher::new(ObjAttrKey::Circle, "circle", true, "end");
        assert!(negated.complexity() > base.complexity());
        assert!(timed.complexity() > base.complexity());
    }
}
