//! The perception graph (§3, §4.4): [`ObjectNode`], [`GroupNode`] and
//! [`SceneNode`], and the caching resolution rule every feature lookup goes
//! through.
//!
//! [`SceneNode`] owns the arenas (the scene's shapes and their
//! [`ObjectNode`]s); callers address a particular shape through [`ObjRef`]
//! rather than holding a borrow into the arena, per the design notes'
//! "avoid shared-mutable cycles" guidance. [`GroupNode`] is the one place
//! shared mutable state is deliberate: cloning a group shares its
//! group-attribute cache by reference (§4.4), so refinements of the same
//! group reuse previously computed percepts.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config;
use crate::error::{PerceptionError, Result};
use crate::feature::{
    self, Attribute, FeatureKey, GroupAttribute, GroupAttrKey, ObjAttrKey, Relation, RelKey,
};
use crate::oracle::Oracle;
use crate::physics::BodyHandle;
use crate::scene::Scene;
use crate::selector::Selector;
use crate::shape::Shape;

/// A handle to any shape a [`SceneNode`] knows about: one of its movable
/// objects, or the reserved ground/frame shapes (§3: "ground/frame are
/// referenced separately and have their own back-pointer ObjectNode but do
/// not appear in `objs`").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjRef {
    Movable(usize),
    Ground,
    Frame,
}

/// One cached slot in an [`ObjectNode`]'s `times` table (§3's "Percept"
/// contract): either a single attribute value, or the list of relation
/// percepts this node has towards other shapes for one feature key.
#[derive(Clone, Debug, PartialEq)]
pub enum Percept {
    Attr(Attribute),
    Rels(Vec<Relation>),
}

/// A recorded contact from [`SceneNode::perceive_collisions`] (§3, §4.4),
/// rewritten from physics bodies to the shapes that own them.
#[derive(Clone, Copy, Debug)]
pub struct Collision {
    pub a: ObjRef,
    pub b: ObjRef,
    pub dv: f64,
}

/// Per-object perception cache: `times: state name -> feature key ->
/// percept` (§3). Attributes and relations share one table, keyed by
/// [`FeatureKey`].
#[derive(Debug, Default)]
pub struct ObjectNode {
    pub times: HashMap<String, HashMap<FeatureKey, Percept>>,
    /// Selectors that currently describe this object, accumulated as
    /// `Selector::select` filters groups it belongs to.
    pub selectors: Vec<Selector>,
}

impl ObjectNode {
    /// A short human-readable summary of the percepts cached for `time`:
    /// every attribute whose activity is over threshold, joined by commas.
    /// Read-only — never perceives anything new (§2 component table:
    /// ObjectNode "drives ... textual summaries").
    pub fn summary(&self, time: &str) -> String {
        let Some(table) = self.times.get(time) else {
            return String::new();
        };
        let mut parts = Vec::new();
        for key in ObjAttrKey::ALL {
            if let Some(Percept::Attr(a)) = table.get(&FeatureKey::Attr(*key)) {
                if a.get_activity() >= config::ACTIVATION_THRESHOLD {
                    parts.push(a.get_label().to_string());
                }
            }
        }
        parts.join(", ")
    }
}

/// A named subset of a scene's shapes (§3). Cloning duplicates the member
/// list but shares the group-attribute cache by reference — an explicit
/// design decision carried over from the source (§4.4): refinements of a
/// group reuse previously computed group-attribute percepts rather than
/// recomputing them against the smaller member set.
#[derive(Clone, Debug)]
pub struct GroupNode {
    pub members: Vec<ObjRef>,
    cache: Rc<RefCell<HashMap<String, HashMap<GroupAttrKey, GroupAttribute>>>>,
    pub selectors: Vec<Selector>,
}

impl GroupNode {
    pub fn new(members: Vec<ObjRef>) -> Self {
        GroupNode {
            members,
            cache: Rc::new(RefCell::new(HashMap::new())),
            selectors: Vec::new(),
        }
    }

    /// All movable objects in the scene, minus `key_obj` if given (§4.4
    /// `sceneGroup`).
    pub fn scene_group<O: Oracle>(scene: &SceneNode<O>, key_obj: Option<ObjRef>) -> Self {
        let members = scene
            .all_objs()
            .into_iter()
            .filter(|&m| Some(m) != key_obj)
            .collect();
        GroupNode::new(members)
    }

    /// Clusters every movable object (or just `bodies`, if supplied)
    /// within `max_dist` surface distance of each other (§4.4
    /// `spatialGroups`, §4.1 `getSpatialGroups`).
    pub fn spatial_groups<O: Oracle>(scene: &mut SceneNode<O>, max_dist: f64) -> Vec<Self> {
        let bodies: Vec<BodyHandle> = scene
            .all_objs()
            .into_iter()
            .filter_map(|r| scene.body(r))
            .collect();
        let clusters = scene.oracle.get_spatial_groups(max_dist, Some(&bodies));
        clusters
            .into_iter()
            .map(|cluster| {
                let members = cluster
                    .into_iter()
                    .filter_map(|h| scene.body_to_ref.get(&h).copied())
                    .collect();
                GroupNode::new(members)
            })
            .collect()
    }
}

/// Bundles a [`Scene`] and an [`Oracle`] with the [`ObjectNode`]s wrapping
/// its movable shapes, plus the recorded collision list and the named
/// times a scene is perceived at (§3).
///
/// Owns both arenas (shapes live in `scene.shapes`/`scene.ground`/
/// `scene.frame`, nodes live in `objs`/`ground_node`/`frame_node`) so
/// callers address them through [`ObjRef`] instead of holding borrows.
pub struct SceneNode<O: Oracle> {
    pub scene: Scene,
    pub oracle: O,
    pub objs: Vec<ObjectNode>,
    ground_node: Option<ObjectNode>,
    frame_node: Option<ObjectNode>,
    pub collisions: Vec<Collision>,
    pub times: Vec<String>,
    body_to_ref: HashMap<BodyHandle, ObjRef>,
    /// Set by [`crate::solution::Solution::check_scene`]: whether this
    /// scene's full-object group satisfied the solution's selector and mode.
    pub fits_solution: Option<bool>,
}

impl<O: Oracle> SceneNode<O> {
    /// `registerObjects` (§3 "Lifecycles"): wraps every movable shape in a
    /// fresh [`ObjectNode`] and sets its `object_node` back-pointer.
    pub fn new(mut scene: Scene, oracle: O) -> Self {
        let mut objs = Vec::with_capacity(scene.shapes.len());
        let mut body_to_ref = HashMap::new();
        for (i, shape) in scene.shapes.iter_mut().enumerate() {
            shape.object_node = Some(i);
            body_to_ref.insert(shape.body, ObjRef::Movable(i));
            objs.push(ObjectNode::default());
        }
        let ground_node = scene.ground.as_ref().map(|g| {
            body_to_ref.insert(g.body, ObjRef::Ground);
            ObjectNode::default()
        });
        let frame_node = scene.frame.as_ref().map(|f| {
            body_to_ref.insert(f.body, ObjRef::Frame);
            ObjectNode::default()
        });
        SceneNode {
            scene,
            oracle,
            objs,
            ground_node,
            frame_node,
            collisions: Vec::new(),
            times: vec!["start".to_string(), "end".to_string()],
            body_to_ref,
            fits_solution: None,
        }
    }

    pub fn shape(&self, r: ObjRef) -> Option<&Shape> {
        match r {
            ObjRef::Movable(i) => self.scene.shapes.get(i),
            ObjRef::Ground => self.scene.ground.as_ref(),
            ObjRef::Frame => self.scene.frame.as_ref(),
        }
    }

    pub fn body(&self, r: ObjRef) -> Option<BodyHandle> {
        self.shape(r).map(|s| s.body)
    }

    fn node(&self, r: ObjRef) -> Option<&ObjectNode> {
        match r {
            ObjRef::Movable(i) => self.objs.get(i),
            ObjRef::Ground => self.ground_node.as_ref(),
            ObjRef::Frame => self.frame_node.as_ref(),
        }
    }

    fn node_mut(&mut self, r: ObjRef) -> Option<&mut ObjectNode> {
        match r {
            ObjRef::Movable(i) => self.objs.get_mut(i),
            ObjRef::Ground => self.ground_node.as_mut(),
            ObjRef::Frame => self.frame_node.as_mut(),
        }
    }

    /// Every movable object, in `objs` order.
    pub fn all_objs(&self) -> Vec<ObjRef> {
        (0..self.objs.len()).map(ObjRef::Movable).collect()
    }

    /// The default partner set for a [`crate::selector::RelMatcher`]: every
    /// other movable object in the scene (§4.5 step 1).
    pub fn others(&self, node: ObjRef) -> Vec<ObjRef> {
        self.all_objs().into_iter().filter(|&o| o != node).collect()
    }

    pub fn collisions_between(&self, a: ObjRef, b: ObjRef) -> Vec<&Collision> {
        self.collisions
            .iter()
            .filter(|c| (c.a == a && c.b == b) || (c.a == b && c.b == a))
            .collect()
    }

    // -- Resolution rule (§4.4) --------------------------------------

    /// `ObjectNode.get` for an attribute. Implements the five-step
    /// resolution rule: constant features force `"start"`; an unspecified
    /// time falls back to `oracle.curr_state()` (and, if that's unset, the
    /// result is computed but never cached); a cache hit returns directly;
    /// `cache_only` stops short of computing a miss.
    pub fn get_obj_attr(
        &mut self,
        target: ObjRef,
        key: ObjAttrKey,
        time: Option<&str>,
        cache_only: bool,
    ) -> Result<Option<Attribute>> {
        let resolved = self.resolve_time(key.descriptor().constant, time);

        if let Some(t) = &resolved {
            if let Some(Percept::Attr(a)) = self
                .node(target)
                .and_then(|n| n.times.get(t))
                .and_then(|m| m.get(&FeatureKey::Attr(key)))
            {
                return Ok(Some(a.clone()));
            }
        }
        if cache_only {
            return Ok(None);
        }
        if let Some(t) = &resolved {
            self.oracle.goto_state(t);
        }
        let attr = self.compute_obj_attr(target, key)?;
        if let Some(t) = resolved {
            if let Some(node) = self.node_mut(target) {
                node.times
                    .entry(t)
                    .or_default()
                    .insert(FeatureKey::Attr(key), Percept::Attr(attr.clone()));
            }
        }
        Ok(Some(attr))
    }

    /// `ObjectNode.get` for a relation towards one `other` shape.
    pub fn get_relation(
        &mut self,
        node: ObjRef,
        key: RelKey,
        other: ObjRef,
        time: Option<&str>,
        cache_only: bool,
    ) -> Result<Option<Relation>> {
        let other_id = self
            .shape(other)
            .ok_or_else(|| PerceptionError::MissingPartner(key.name().to_string()))?
            .id
            .clone();
        let resolved = self.resolve_time(key.descriptor().constant, time);

        if let Some(t) = &resolved {
            if let Some(Percept::Rels(list)) = self
                .node(node)
                .and_then(|n| n.times.get(t))
                .and_then(|m| m.get(&FeatureKey::Rel(key)))
            {
                if let Some(r) = list.iter().find(|r| r.other() == other_id) {
                    return Ok(Some(r.clone()));
                }
            }
        }
        if cache_only {
            return Ok(None);
        }
        if let Some(t) = &resolved {
            self.oracle.goto_state(t);
        }
        let rel = self.compute_relation(node, other, key)?;
        if let Some(t) = resolved {
            if let Some(n) = self.node_mut(node) {
                let list = match n
                    .times
                    .entry(t)
                    .or_default()
                    .entry(FeatureKey::Rel(key))
                    .or_insert_with(|| Percept::Rels(Vec::new()))
                {
                    Percept::Rels(list) => list,
                    Percept::Attr(_) => unreachable!("relation key never stores an attribute"),
                };
                list.retain(|r| r.other() != other_id);
                list.push(rel.clone());
            }
        }
        Ok(Some(rel))
    }

    /// `hasRelation(key, time, active, other)` (§4.4): a cache-only check,
    /// never perceives anything new.
    pub fn has_relation(
        &mut self,
        node: ObjRef,
        key: RelKey,
        time: &str,
        active: bool,
        other: ObjRef,
    ) -> Result<bool> {
        match self.get_relation(node, key, other, Some(time), true)? {
            Some(r) => Ok((r.get_activity() >= config::ACTIVATION_THRESHOLD) == active),
            None => Ok(false),
        }
    }

    pub fn get_group_attr(
        &mut self,
        group: &GroupNode,
        key: GroupAttrKey,
        time: Option<&str>,
    ) -> Result<GroupAttribute> {
        let resolved = self.resolve_time(key.descriptor().constant, time);

        if let Some(t) = &resolved {
            if let Some(a) = group.cache.borrow().get(t).and_then(|m| m.get(&key)) {
                return Ok(a.clone());
            }
        }
        if let Some(t) = &resolved {
            self.oracle.goto_state(t);
        }
        let attr = self.compute_group_attr(group, key)?;
        if let Some(t) = resolved {
            group
                .cache
                .borrow_mut()
                .entry(t)
                .or_default()
                .insert(key, attr.clone());
        }
        Ok(attr)
    }

    fn resolve_time(&self, constant: bool, time: Option<&str>) -> Option<String> {
        if constant {
            Some("start".to_string())
        } else if let Some(t) = time {
            Some(t.to_string())
        } else {
            self.oracle.curr_state().map(|s| s.to_string())
        }
    }

    /// `perceive(time)` for one object: eagerly instantiates every
    /// registered attribute and, for every other movable object, every
    /// registered relation (§4.4). The source's hook for an
    /// `ObjectToGroup` relation variant (future extension, never
    /// populated) would slot in here, covering `GroupNode` partners
    /// alongside the `ObjRef` ones below.
    pub fn perceive(&mut self, target: ObjRef, time: &str) -> Result<()> {
        for &key in ObjAttrKey::ALL {
            self.get_obj_attr(target, key, Some(time), false)?;
        }
        for &key in RelKey::ALL {
            for other in self.others(target) {
                self.get_relation(target, key, other, Some(time), false)?;
            }
        }
        Ok(())
    }

    /// `perceiveCollisions` then `perceive(time)` for every named time
    /// (§4.4 `SceneNode.perceiveAll`).
    pub fn perceive_all(&mut self) -> Result<()> {
        self.perceive_collisions();
        let times = self.times.clone();
        for time in &times {
            self.oracle.goto_state(time);
            log::debug!("perceiving scene at {time}");
            for target in self.all_objs() {
                self.perceive(target, time)?;
            }
        }
        Ok(())
    }

    /// `gotoState("start")` then `observeCollisions`, rewriting each raw
    /// collision from physics bodies to the shapes that own them (§4.4).
    pub fn perceive_collisions(&mut self) {
        self.oracle.goto_state("start");
        let raw = self.oracle.observe_collisions();
        self.collisions = raw
            .into_iter()
            .filter_map(|rc| {
                let a = *self.body_to_ref.get(&rc.a)?;
                let b = *self.body_to_ref.get(&rc.b)?;
                Some(Collision { a, b, dv: rc.dv })
            })
            .collect();
    }

    // -- Feature computation (§4.2, §4.3) ----------------------------

    fn compute_obj_attr(&mut self, target: ObjRef, key: ObjAttrKey) -> Result<Attribute> {
        use ObjAttrKey::*;

        let shape = self
            .shape(target)
            .ok_or_else(|| PerceptionError::MissingPartner(key.name().to_string()))?
            .clone();

        let (activity, label): (f64, String) = match key {
            Shape => {
                let label = feature::attributes::classify_shape(&shape);
                (feature::attributes::shape_activity(label), label.to_string())
            }
            Circle => {
                let label = feature::attributes::classify_shape(&shape);
                (feature::attributes::circle_activity(label), key.name().to_string())
            }
            Square => {
                let label = feature::attributes::classify_shape(&shape);
                (feature::attributes::square_activity(label), key.name().to_string())
            }
            Rect => {
                let label = feature::attributes::classify_shape(&shape);
                (feature::attributes::rect_activity(label), key.name().to_string())
            }
            Triangle => {
                let label = feature::attributes::classify_shape(&shape);
                (feature::attributes::triangle_activity(label), key.name().to_string())
            }
            Small | Large => {
                let pct = feature::attributes::area_percent(shape.area());
                let act = if key == Small {
                    feature::attributes::small_activity(pct)
                } else {
                    feature::attributes::large_activity(pct)
                };
                (act, key.name().to_string())
            }
            LeftPos => (
                feature::attributes::left_pos_activity(shape.position().x),
                key.name().to_string(),
            ),
            RightPos => (
                feature::attributes::right_pos_activity(shape.position().x),
                key.name().to_string(),
            ),
            TopPos => {
                let max_y = self.scene.max_y();
                (
                    feature::attributes::top_pos_activity(shape.position().y, max_y),
                    key.name().to_string(),
                )
            }
            BottomPos => {
                let max_y = self.scene.max_y();
                (
                    feature::attributes::bottom_pos_activity(shape.position().y, max_y),
                    key.name().to_string(),
                )
            }
            LeftMost | RightMost | TopMost => {
                if self.scene.shapes.is_empty() {
                    return Err(PerceptionError::NoObjects(key.name().to_string()));
                }
                let (val, extremum) = match key {
                    LeftMost => (
                        shape.position().x,
                        self.scene
                            .shapes
                            .iter()
                            .map(|s| s.position().x)
                            .fold(f64::INFINITY, f64::min),
                    ),
                    RightMost => (
                        shape.position().x,
                        self.scene
                            .shapes
                            .iter()
                            .map(|s| s.position().x)
                            .fold(f64::NEG_INFINITY, f64::max),
                    ),
                    TopMost => (
                        shape.position().y,
                        self.scene
                            .shapes
                            .iter()
                            .map(|s| s.position().y)
                            .fold(f64::NEG_INFINITY, f64::max),
                    ),
                    _ => unreachable!(),
                };
                (
                    feature::attributes::extremum_activity(val, extremum),
                    key.name().to_string(),
                )
            }
            Single => {
                let body = self.body(target).unwrap();
                let nearest = self
                    .oracle
                    .get_closest_body_with_dist(body)
                    .map(|(_, d)| d * shape.phys_scale)
                    .unwrap_or(f64::INFINITY);
                (feature::attributes::single_activity(nearest), key.name().to_string())
            }
            OnGround => {
                let act = if self.scene.ground.is_some() {
                    self.touch_activity_between(target, ObjRef::Ground)?
                } else {
                    0.0
                };
                (act, key.name().to_string())
            }
            Moves => {
                let body = self.body(target).unwrap();
                let (act, lbl) = feature::counterfactual::moves(&mut self.oracle, body);
                (act, lbl.to_string())
            }
            IsSupported => {
                let body = self.body(target).unwrap();
                let (act, lbl) = feature::counterfactual::is_supported(&mut self.oracle, body);
                (act, lbl.to_string())
            }
            Stability => {
                let body = self.body(target).unwrap();
                let (act, lbl) =
                    feature::counterfactual::stability(&mut self.oracle, body, shape.is_circle());
                (act, feature::counterfactual::stability_collapsed(lbl).to_string())
            }
            CanMoveUp => {
                let body = self.body(target).unwrap();
                let frame = self
                    .scene
                    .frame
                    .as_ref()
                    .map(|f| (f.body, f.bounding_box().max.y));
                let (act, lbl) = feature::counterfactual::can_move_up(&mut self.oracle, body, frame);
                (act, lbl.to_string())
            }
        };
        Ok(Attribute::new(key, activity, label))
    }

    fn compute_relation(&mut self, node: ObjRef, other: ObjRef, key: RelKey) -> Result<Relation> {
        use RelKey::*;

        let other_id = self
            .shape(other)
            .ok_or_else(|| PerceptionError::MissingPartner(key.name().to_string()))?
            .id
            .clone();

        let (activity, label): (f64, String) = match key {
            LeftOf | RightOf | Above | Below => {
                let pa = self.shape(node).unwrap().position();
                let pb = self.shape(other).unwrap().position();
                let delta = match key {
                    LeftOf => pb.x - pa.x,
                    RightOf => pa.x - pb.x,
                    Above => pa.y - pb.y,
                    Below => pb.y - pa.y,
                    _ => unreachable!(),
                };
                (feature::relations::directional_activity(delta), key.name().to_string())
            }
            Beside => {
                let pa = self.shape(node).unwrap().position();
                let pb = self.shape(other).unwrap().position();
                let left = feature::relations::directional_activity(pb.x - pa.x);
                let right = feature::relations::directional_activity(pa.x - pb.x);
                (feature::relations::beside_activity(left, right), key.name().to_string())
            }
            OnTopOf => {
                let touch = self.touch_activity_between(node, other)?;
                let pa = self.shape(node).unwrap().position();
                let pb = self.shape(other).unwrap().position();
                // above(a,b) and below(b,a) share the same delta (a.y-b.y).
                let above_a_b = feature::relations::directional_activity(pa.y - pb.y);
                (feature::relations::on_top_of_activity(touch, above_a_b, above_a_b), key.name().to_string())
            }
            Touch => {
                let act = self.touch_activity_between(node, other)?;
                (act, key.name().to_string())
            }
            Close | Far => {
                let dist_pct = self.surface_distance_pct(node, other)?;
                let act = if key == Close {
                    feature::relations::close_activity(dist_pct)
                } else {
                    feature::relations::far_activity(dist_pct)
                };
                (act, key.name().to_string())
            }
            Hits | GetsHit | Collides => {
                let max_dv = self.collision_lookup(node, other, key);
                (feature::relations::collision_activity(max_dv), key.name().to_string())
            }
            Supports => {
                let a_body = self
                    .body(node)
                    .ok_or_else(|| PerceptionError::MissingPartner(key.name().to_string()))?;
                let b_body = self
                    .body(other)
                    .ok_or_else(|| PerceptionError::MissingPartner(key.name().to_string()))?;
                let a_is_b = node == other;
                let touch_val = self.touch_activity_between(node, other)?;
                let touch_ab = touch_val >= config::ACTIVATION_THRESHOLD;
                let pb = self.shape(other).unwrap().position();
                let pa = self.shape(node).unwrap().position();
                let above_b_a = feature::relations::directional_activity(pb.y - pa.y);
                let on_top_of_b_a = (touch_val * above_b_a) >= config::ACTIVATION_THRESHOLD;
                let dist_pct = self.surface_distance_pct(node, other)?;
                let close_ab = feature::relations::close_activity(dist_pct) >= config::ACTIVATION_THRESHOLD;
                let b_is_circle = self.shape(other).unwrap().is_circle();
                let b_was_stable = self
                    .get_obj_attr(other, ObjAttrKey::Stability, None, false)?
                    .map(|a| a.get_label() == "stable")
                    .unwrap_or(false);
                let (act, lbl) = feature::counterfactual::supports(
                    &mut self.oracle,
                    a_body,
                    b_body,
                    a_is_b,
                    touch_ab,
                    on_top_of_b_a,
                    close_ab,
                    b_was_stable,
                    b_is_circle,
                );
                (act, lbl.to_string())
            }
        };
        Ok(Relation::new(key, other_id, activity, label))
    }

    fn compute_group_attr(&mut self, group: &GroupNode, key: GroupAttrKey) -> Result<GroupAttribute> {
        let n = group.members.len();
        Ok(match key {
            GroupAttrKey::Count => {
                GroupAttribute::new(key, 1.0, feature::groups::count_label(n))
            }
            GroupAttrKey::Close | GroupAttrKey::Touching => {
                if n < 2 {
                    GroupAttribute::new(key, 0.0, "false")
                } else {
                    let members = group.members.clone();
                    let mut dists = vec![vec![0.0; n]; n];
                    for i in 0..n {
                        for j in (i + 1)..n {
                            let d = self.surface_distance_pct(members[i], members[j])?;
                            dists[i][j] = d;
                            dists[j][i] = d;
                        }
                    }
                    let critical =
                        feature::groups::mst_critical_edge(n, |i, j| dists[i][j]).unwrap_or(0.0);
                    let act = if key == GroupAttrKey::Close {
                        feature::groups::close_activity(critical)
                    } else {
                        feature::groups::touching_activity(critical)
                    };
                    GroupAttribute::new(
                        key,
                        act,
                        if act >= config::ACTIVATION_THRESHOLD { "true" } else { "false" },
                    )
                }
            }
            GroupAttrKey::Far => {
                if n < 2 {
                    GroupAttribute::new(key, 0.0, "false")
                } else {
                    let members = group.members.clone();
                    let mut min_d = f64::INFINITY;
                    for i in 0..n {
                        for j in (i + 1)..n {
                            let d = self.surface_distance_pct(members[i], members[j])?;
                            if d < min_d {
                                min_d = d;
                            }
                        }
                    }
                    let act = feature::groups::far_activity(min_d);
                    GroupAttribute::new(
                        key,
                        act,
                        if act >= config::ACTIVATION_THRESHOLD { "true" } else { "false" },
                    )
                }
            }
        })
    }

    /// `touch(a,b)`: graded membership of the raw surface distance against
    /// the touch tolerance (§4.2). Shared by `touch`, `on_top_of` and
    /// `supports`, and by the `on_ground` attribute against the ground
    /// shape, so every touch-flavored feature agrees on one measurement.
    fn touch_activity_between(&self, a: ObjRef, b: ObjRef) -> Result<f64> {
        let ba = self
            .body(a)
            .ok_or_else(|| PerceptionError::MissingPartner("touch".to_string()))?;
        let bb = self
            .body(b)
            .ok_or_else(|| PerceptionError::MissingPartner("touch".to_string()))?;
        let dist = self.oracle.get_body_distance_to(ba, bb);
        Ok(feature::relations::touch_activity(dist))
    }

    fn surface_distance_pct(&self, a: ObjRef, b: ObjRef) -> Result<f64> {
        let ba = self
            .body(a)
            .ok_or_else(|| PerceptionError::MissingPartner("close".to_string()))?;
        let bb = self
            .body(b)
            .ok_or_else(|| PerceptionError::MissingPartner("close".to_string()))?;
        let d = self.oracle.get_body_distance_to(ba, bb);
        let scale = (self.shape(a).unwrap().phys_scale + self.shape(b).unwrap().phys_scale) / 2.0;
        Ok(d * scale)
    }

    fn collision_lookup(&self, node: ObjRef, other: ObjRef, key: RelKey) -> Option<f64> {
        let mut max_dv: Option<f64> = None;
        for c in &self.collisions {
            let matches = match key {
                RelKey::Hits => c.a == node && c.b == other,
                RelKey::GetsHit => c.a == other && c.b == node,
                RelKey::Collides => (c.a == node && c.b == other) || (c.a == other && c.b == node),
                _ => false,
            };
            if matches {
                max_dv = Some(max_dv.map_or(c.dv, |m| m.max(c.dv)));
            }
        }
        max_dv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Angle, Pose, Vec2};
    use crate::oracle::SimOracle;
    use crate::physics::{Material, PhysWorld};
    use crate::shape::Shape;
    use approx::assert_relative_eq;

    /// Two circles resting on the ground, "a" to the left of "b" (and
    /// touching it), used across the node/selector/solution tests.
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
            Pose::new(Vec2::new(40.0, 3.0), Angle::default()),
            crate::shape::ShapeKind::Circle { r: 3.0 },
            1.0,
            Material::default(),
        );
        let b_body = world.add_dynamic(
            Pose::new(Vec2::new(46.0, 3.0), Angle::default()),
            crate::shape::ShapeKind::Circle { r: 3.0 },
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
        let a = Shape::new_circle("a", Pose::new(Vec2::new(40.0, 3.0), Angle::default()), 3.0, a_body);
        let b = Shape::new_circle("b", Pose::new(Vec2::new(46.0, 3.0), Angle::default()), 3.0, b_body);

        let scene = Scene::new([ground, a, b]);
        let oracle = SimOracle::new(world);
        let mut node = SceneNode::new(scene, oracle);
        node.oracle.goto_state("start");
        node
    }

    #[test]
    fn shape_attribute_classifies_circles() {
        let mut scene = two_circles_on_ground();
        let attr = scene
            .get_obj_attr(ObjRef::Movable(0), ObjAttrKey::Shape, Some("start"), false)
            .unwrap()
            .unwrap();
        assert_eq!(attr.get_label(), "circle");
        assert_relative_eq!(attr.get_activity(), 1.0);
    }

    #[test]
    fn constant_attribute_ignores_requested_time() {
        let mut scene = two_circles_on_ground();
        let at_end = scene
            .get_obj_attr(ObjRef::Movable(0), ObjAttrKey::Circle, Some("end"), false)
            .unwrap()
            .unwrap();
        // constant features always resolve against "start" (§4.4 step 1)
        let at_start = scene
            .node(ObjRef::Movable(0))
            .and_then(|n| n.times.get("start"))
            .and_then(|m| m.get(&FeatureKey::Attr(ObjAttrKey::Circle)));
        assert!(matches!(at_start, Some(Percept::Attr(a)) if a.get_activity() == at_end.get_activity()));
        assert!(scene
            .node(ObjRef::Movable(0))
            .unwrap()
            .times
            .get("end")
            .and_then(|m| m.get(&FeatureKey::Attr(ObjAttrKey::Circle)))
            .is_none());
    }

    #[test]
    fn touch_relation_is_symmetric() {
        let mut scene = two_circles_on_ground();
        let ab = scene
            .get_relation(ObjRef::Movable(0), RelKey::Touch, ObjRef::Movable(1), Some("start"), false)
            .unwrap()
            .unwrap();
        let ba = scene
            .get_relation(ObjRef::Movable(1), RelKey::Touch, ObjRef::Movable(0), Some("start"), false)
            .unwrap()
            .unwrap();
        assert_relative_eq!(ab.get_activity(), ba.get_activity());
    }

    #[test]
    fn cache_only_miss_does_not_compute() {
        let mut scene = two_circles_on_ground();
        let miss = scene
            .get_obj_attr(ObjRef::Movable(0), ObjAttrKey::Moves, Some("start"), true)
            .unwrap();
        assert!(miss.is_none());
        assert!(scene
            .node(ObjRef::Movable(0))
            .unwrap()
            .times
            .get("start")
            .map_or(true, |m| !m.contains_key(&FeatureKey::Attr(ObjAttrKey::Moves))));
    }

    #[test]
    fn left_of_and_right_of_agree_with_positions() {
        let mut scene = two_circles_on_ground();
        let a_left_of_b = scene
            .get_relation(ObjRef::Movable(0), RelKey::LeftOf, ObjRef::Movable(1), Some("start"), false)
            .unwrap()
            .unwrap();
        assert!(a_left_of_b.get_activity() > 0.5);
    }

    #[test]
    fn group_count_and_far_on_small_groups() {
        let mut scene = two_circles_on_ground();
        let group = GroupNode::scene_group(&scene, None);
        assert_eq!(group.members.len(), 2);
        scene.oracle.goto_state("start");
        let count = scene.get_group_attr(&group, GroupAttrKey::Count, Some("start")).unwrap();
        assert_eq!(count.get_label(), "2");
        let single = GroupNode::new(vec![ObjRef::Movable(0)]);
        let far = scene.get_group_attr(&single, GroupAttrKey::Far, Some("start")).unwrap();
        assert_relative_eq!(far.get_activity(), 0.0);
    }

    #[test]
    fn group_clone_shares_cache() {
        let mut scene = two_circles_on_ground();
        let group = GroupNode::scene_group(&scene, None);
        let _ = scene.get_group_attr(&group, GroupAttrKey::Count, Some("start")).unwrap();
        let mut clone = group.clone();
        clone.members.truncate(1);
        // cache is shared: looking up "count" again against the clone
        // returns the percept computed for the full group, not a
        // recomputation against the truncated member list.
        let cached = scene.get_group_attr(&clone, GroupAttrKey::Count, Some("start")).unwrap();
        assert_eq!(cached.get_label(), "2");
    }
}
