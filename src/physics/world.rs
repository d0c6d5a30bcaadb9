//! A small rigid-body stepper. The spec treats the simulator itself as an
//! external collaborator; this is a deliberately modest stand-in good enough
//! to back [`crate::oracle::Oracle`]'s counterfactual queries, not a
//! general-purpose physics engine.

use std::collections::HashMap;

use crate::math::{Angle, Pose, Vec2};
use crate::physics::collision::{self, hgrid::HGridParams, narrowphase, HGrid};
use crate::physics::{Body, ForceField, Gravity, Material, Velocity};
use crate::shape::ShapeKind;

/// A handle to a body owned by a [`PhysWorld`]. Indexes into `PhysWorld::bodies`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub usize);

impl BodyHandle {
    /// Not a valid handle into any world; only useful for constructing
    /// [`crate::shape::Shape`] values in tests that never step a simulator.
    pub const PLACEHOLDER: BodyHandle = BodyHandle(usize::MAX);
}

#[derive(Clone, Debug)]
pub(crate) struct PhysBody {
    pub pose: Pose,
    pub body: Body,
    pub shape: ShapeKind,
    pub material: Material,
    /// Static bodies never move; this can be toggled at runtime (used by
    /// `is_supported` and `supports`, which temporarily freeze bodies).
    pub is_static: bool,
    pub active: bool,
    pub sleeping_allowed: bool,
    /// World-space position the last time a checkpoint was taken, used by
    /// `get_body_distance`.
    pub checkpoint_pos: Vec2,
}

/// The full dynamic state of a world, used for named-state checkpoints and
/// sandbox restores.
#[derive(Clone, Debug)]
struct Snapshot {
    bodies: Vec<PhysBody>,
}

/// A minimal 2D rigid body simulator: semi-implicit Euler integration plus
/// simple penetration-based collision resolution. Bodies are referenced by
/// [`BodyHandle`], a stable index that never changes once a body is added.
pub struct PhysWorld {
    pub(crate) bodies: Vec<PhysBody>,
    pub gravity: Gravity,
    named_states: HashMap<String, Snapshot>,
    sandbox_stack: Vec<Snapshot>,
    pub curr_state: Option<String>,
}

impl PhysWorld {
    pub fn new() -> Self {
        PhysWorld {
            bodies: Vec::new(),
            gravity: Gravity::default(),
            named_states: HashMap::new(),
            sandbox_stack: Vec::new(),
            curr_state: None,
        }
    }

    pub fn add_dynamic(
        &mut self,
        pose: Pose,
        shape: ShapeKind,
        density: f64,
        material: Material,
    ) -> BodyHandle {
        let area = shape_area(&shape);
        let mass = (area * density).max(f64::MIN_POSITIVE);
        let moi = (shape_second_moment(&shape) * density).max(f64::MIN_POSITIVE);
        self.push(pose, Body::new_dynamic(mass, moi), shape, material, false)
    }

    pub fn add_static(&mut self, pose: Pose, shape: ShapeKind, material: Material) -> BodyHandle {
        self.push(pose, Body::new_static(), shape, material, true)
    }

    fn push(
        &mut self,
        pose: Pose,
        body: Body,
        shape: ShapeKind,
        material: Material,
        is_static: bool,
    ) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len());
        self.bodies.push(PhysBody {
            pose,
            body,
            shape,
            material,
            is_static,
            active: true,
            sleeping_allowed: true,
            checkpoint_pos: pose.translation,
        });
        handle
    }

    fn get(&self, h: BodyHandle) -> &PhysBody {
        &self.bodies[h.0]
    }

    fn get_mut(&mut self, h: BodyHandle) -> &mut PhysBody {
        &mut self.bodies[h.0]
    }

    pub fn pose(&self, h: BodyHandle) -> Pose {
        self.get(h).pose
    }

    pub fn velocity(&self, h: BodyHandle) -> Velocity {
        self.get(h).body.velocity
    }

    pub fn mass(&self, h: BodyHandle) -> f64 {
        self.get(h).body.mass.value()
    }

    pub fn is_static(&self, h: BodyHandle) -> bool {
        self.get(h).is_static
    }

    pub fn set_active(&mut self, h: BodyHandle, active: bool) {
        self.get_mut(h).active = active;
    }

    pub fn set_static(&mut self, h: BodyHandle, is_static: bool) {
        self.get_mut(h).is_static = is_static;
    }

    pub fn set_sleeping_allowed(&mut self, h: BodyHandle, allowed: bool) {
        self.get_mut(h).sleeping_allowed = allowed;
    }

    pub fn wake_up(&mut self) {
        for b in &mut self.bodies {
            b.active = true;
        }
    }

    pub fn for_each_dynamic_body(&self, mut f: impl FnMut(BodyHandle)) {
        for (i, b) in self.bodies.iter().enumerate() {
            if !b.is_static {
                f(BodyHandle(i));
            }
        }
    }

    pub fn apply_central_impulse(&mut self, h: BodyHandle, impulse: Vec2) {
        let b = self.get_mut(h);
        if b.is_static {
            return;
        }
        let inv_mass = b.body.mass.inv();
        b.body.velocity.linear += impulse * inv_mass;
    }

    pub fn apply_force(&mut self, h: BodyHandle, force: Vec2, dt: f64) {
        let b = self.get_mut(h);
        if b.is_static || !b.body.sees_forces() {
            return;
        }
        let inv_mass = b.body.mass.inv();
        b.body.velocity.linear += force * inv_mass * dt;
    }

    /// Distance moved (in scene units) since the last `checkpoint`.
    pub fn body_distance(&self, h: BodyHandle) -> f64 {
        let b = self.get(h);
        (b.pose.translation - b.checkpoint_pos).mag()
    }

    fn checkpoint_positions(&mut self) {
        for b in &mut self.bodies {
            b.checkpoint_pos = b.pose.translation;
        }
    }

    /// Save the current state under a name, overwriting any prior snapshot
    /// with that name.
    pub fn save_state(&mut self, name: impl Into<String>) {
        self.named_states.insert(
            name.into(),
            Snapshot {
                bodies: self.bodies.clone(),
            },
        );
    }

    /// Restore a previously saved named state. Idempotent if already there.
    pub fn goto_state(&mut self, name: &str) {
        if self.curr_state.as_deref() == Some(name) {
            return;
        }
        if let Some(snap) = self.named_states.get(name) {
            self.bodies = snap.bodies.clone();
        }
        self.curr_state = Some(name.to_string());
        self.checkpoint_positions();
    }

    /// Push the current state onto the sandbox stack so it can be restored
    /// later with [`PhysWorld::pop_sandbox`]. Nesting is LIFO.
    pub fn push_sandbox(&mut self) {
        self.sandbox_stack.push(Snapshot {
            bodies: self.bodies.clone(),
        });
    }

    /// Restore the most recently pushed sandbox state, discarding whatever
    /// happened since.
    pub fn pop_sandbox(&mut self) {
        if let Some(snap) = self.sandbox_stack.pop() {
            self.bodies = snap.bodies;
        }
    }

    /// Advance the simulation by `dt` seconds: integrate forces, then
    /// resolve any overlaps detected by the broad + narrow phase.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }

        for i in 0..self.bodies.len() {
            let gravity = self.gravity.value_at(self.bodies[i].pose.translation);
            let b = &mut self.bodies[i];
            if b.is_static || !b.active || !b.body.sees_forces() {
                continue;
            }
            b.body.velocity.linear += gravity * dt;
        }

        for i in 0..self.bodies.len() {
            let b = &mut self.bodies[i];
            if b.is_static || !b.active {
                continue;
            }
            b.pose = b.body.velocity.apply_to(dt, b.pose);
        }

        self.resolve_collisions();
    }

    fn resolve_collisions(&mut self) {
        let n = self.bodies.len();
        if n < 2 {
            return;
        }

        let grid_params = HGridParams {
            approx_bounds: collision::AABB {
                min: Vec2::new(-500.0, -500.0),
                max: Vec2::new(500.0, 500.0),
            },
            smallest_obj_radius: 0.5,
            largest_obj_radius: 200.0,
            expected_obj_count: n,
        };
        let mut grid = HGrid::new(grid_params);
        grid.prepare(n);

        let mut pairs = Vec::new();
        for i in 0..n {
            let aabb = shape_aabb(&self.bodies[i].pose, &self.bodies[i].shape).padded(0.1);
            for other in grid.test_and_insert(aabb, i) {
                pairs.push((other, i));
            }
        }

        // a handful of resolution passes smooths out stacked bodies; this
        // isn't a real sequential-impulse solver, just enough to keep
        // resting contacts roughly stable over the short counterfactual
        // windows the feature library cares about
        for _ in 0..4 {
            for &(a, b) in &pairs {
                self.resolve_pair(a, b);
            }
        }
    }

    fn resolve_pair(&mut self, ia: usize, ib: usize) {
        let (pose_a, shape_a, pose_b, shape_b) = (
            self.bodies[ia].pose,
            self.bodies[ia].shape.clone(),
            self.bodies[ib].pose,
            self.bodies[ib].shape.clone(),
        );
        let Some(c) = narrowphase::contact(&pose_a, &shape_a, &pose_b, &shape_b) else {
            return;
        };

        let inv_mass_a = if self.bodies[ia].is_static {
            0.0
        } else {
            self.bodies[ia].body.mass.inv()
        };
        let inv_mass_b = if self.bodies[ib].is_static {
            0.0
        } else {
            self.bodies[ib].body.mass.inv()
        };
        let inv_mass_sum = inv_mass_a + inv_mass_b;
        if inv_mass_sum <= 0.0 {
            return;
        }

        // positional correction: push the bodies apart along the contact normal
        let correction = c.normal * (c.depth / inv_mass_sum);
        if !self.bodies[ia].is_static {
            self.bodies[ia].pose.translation += correction * inv_mass_a;
        }
        if !self.bodies[ib].is_static {
            self.bodies[ib].pose.translation -= correction * inv_mass_b;
        }

        // velocity response: kill the closing velocity along the normal,
        // with a touch of restitution
        let rel_vel = self.bodies[ia].body.velocity.linear - self.bodies[ib].body.velocity.linear;
        let closing_speed = rel_vel.dot(c.normal);
        if closing_speed >= 0.0 {
            return;
        }
        let restitution = self.bodies[ia]
            .material
            .restitution_with(&self.bodies[ib].material);
        let impulse_mag = -(1.0 + restitution) * closing_speed / inv_mass_sum;
        let impulse = c.normal * impulse_mag;
        if !self.bodies[ia].is_static {
            self.bodies[ia].body.velocity.linear += impulse * inv_mass_a;
        }
        if !self.bodies[ib].is_static {
            self.bodies[ib].body.velocity.linear -= impulse * inv_mass_b;
        }
    }

    /// Relative speed at contact for every currently-overlapping pair, used
    /// by `Oracle::observe_collisions`.
    pub(crate) fn contacts(&self) -> Vec<(BodyHandle, BodyHandle, f64)> {
        let n = self.bodies.len();
        let mut out = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(c) = narrowphase::contact(
                    &self.bodies[i].pose,
                    &self.bodies[i].shape,
                    &self.bodies[j].pose,
                    &self.bodies[j].shape,
                ) {
                    let rel = self.bodies[i].body.velocity.linear
                        - self.bodies[j].body.velocity.linear;
                    let dv = rel.dot(c.normal).abs();
                    out.push((BodyHandle(i), BodyHandle(j), dv));
                }
            }
        }
        out
    }
}

impl Default for PhysWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Velocity {
    fn apply_to(&self, dt: f64, mut pose: Pose) -> Pose {
        pose.append_translation(self.linear * dt);
        pose.prepend_rotation(Angle::Rad(self.angular * dt));
        pose
    }
}

fn shape_aabb(pose: &Pose, shape: &ShapeKind) -> collision::AABB {
    match shape {
        ShapeKind::Circle { r } => collision::AABB {
            min: pose.translation - Vec2::new(*r, *r),
            max: pose.translation + Vec2::new(*r, *r),
        },
        ShapeKind::Polygon { points, .. } => {
            let verts: Vec<Vec2> = points.iter().map(|&p| pose.transform_point(p)).collect();
            let mut min = verts[0];
            let mut max = verts[0];
            for &v in &verts[1..] {
                min = Vec2::new(min.x.min(v.x), min.y.min(v.y));
                max = Vec2::new(max.x.max(v.x), max.y.max(v.y));
            }
            collision::AABB { min, max }
        }
    }
}

fn shape_area(shape: &ShapeKind) -> f64 {
    match shape {
        ShapeKind::Circle { r } => std::f64::consts::PI * r * r,
        ShapeKind::Polygon { points, .. } => {
            let n = points.len();
            let mut sum = 0.0;
            for i in 0..n {
                let a = points[i];
                let b = points[(i + 1) % n];
                sum += a.x * b.y - b.x * a.y;
            }
            (sum / 2.0).abs()
        }
    }
}

/// Second moment of area about the centroid, used to derive moment of
/// inertia. Polygons use the general polygon formula; circles the standard
/// `pi/2 * r^4`.
fn shape_second_moment(shape: &ShapeKind) -> f64 {
    match shape {
        ShapeKind::Circle { r } => std::f64::consts::FRAC_PI_2 * r.powi(4),
        ShapeKind::Polygon { points, .. } => {
            let n = points.len();
            let mut num = 0.0;
            let mut den = 0.0;
            for i in 0..n {
                let a = points[i];
                let b = points[(i + 1) % n];
                let cross = a.x * b.y - b.x * a.y;
                num += cross * (a.dot(a) + a.dot(b) + b.dot(b));
                den += cross;
            }
            if den.abs() < f64::EPSILON {
                return 0.0;
            }
            (num / (6.0 * den)).abs()
        }
    }
}
