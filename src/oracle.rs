//! The abstract handle to a physics simulator (§4.1): named-state
//! navigation, counterfactual simulation, and contact/collision queries.
//!
//! Everything the feature library needs from "the simulator" funnels through
//! this trait. [`SimOracle`] is the concrete implementation backed by
//! [`crate::physics::PhysWorld`]; a different deployment could implement
//! [`Oracle`] against a real physics engine without touching anything in
//! [`crate::feature`] or [`crate::node`].

use crate::math::Vec2;
use crate::physics::{BodyHandle, PhysWorld};

/// Direction for [`Oracle::apply_central_impulse`], matching the four
/// directions the original source's UI offers the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    fn unit(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::Up => Vec2::new(0.0, 1.0),
            Direction::Down => Vec2::new(0.0, -1.0),
        }
    }
}

/// Impulse magnitude for [`Oracle::apply_central_impulse`], scaled by the
/// target body's mass per §4.1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Magnitude {
    Small,
    Medium,
}

impl Magnitude {
    fn per_mass(self) -> f64 {
        match self {
            Magnitude::Small => 4.0,
            Magnitude::Medium => 12.0,
        }
    }
}

/// A recorded contact between two bodies, as produced by
/// [`Oracle::observe_collisions`]. `dv` is the relative speed along the
/// contact normal at the moment of impact.
#[derive(Clone, Copy, Debug)]
pub struct RawCollision {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub dv: f64,
}

/// Abstract handle to a 2D rigid-body physics simulator.
///
/// Single-threaded and non-reentrant: callers must not interleave two
/// top-level queries against one oracle. [`Oracle::analyze_future`] may
/// nest, but restores are strictly LIFO (enforced by the underlying
/// sandbox stack, see [`PhysWorld::push_sandbox`]).
pub trait Oracle {
    /// Restore a previously named snapshot. Idempotent if already there.
    fn goto_state(&mut self, name: &str);

    /// The currently named state, if the oracle was last moved there by
    /// [`Oracle::goto_state`] (or is still in the sandbox pushed for a
    /// running [`Oracle::analyze_future`]).
    fn curr_state(&self) -> Option<&str>;

    /// Push a sandbox frame, optionally mutate it with `before`, step the
    /// simulator by `dt` seconds, measure with `after`, then roll every
    /// side effect back. Returns `after`'s value.
    fn analyze_future<B, A, R>(&mut self, dt: f64, before: Option<B>, after: A) -> R
    where
        B: FnOnce(&mut Self),
        A: FnOnce(&mut Self) -> R;

    fn apply_central_impulse(&mut self, body: BodyHandle, dir: Direction, mag: Magnitude);

    fn is_static(&self, body: BodyHandle) -> bool;
    fn set_static(&mut self, body: BodyHandle, is_static: bool);
    fn set_active(&mut self, body: BodyHandle, active: bool);
    fn set_sleeping_allowed(&mut self, body: BodyHandle, allowed: bool);
    fn apply_force(&mut self, body: BodyHandle, force: Vec2, dt: f64);

    fn wake_up(&mut self);
    fn for_each_dynamic_body(&self, f: impl FnMut(BodyHandle));

    fn velocity(&self, body: BodyHandle) -> Vec2;
    fn angular_velocity(&self, body: BodyHandle) -> f64;
    fn position(&self, body: BodyHandle) -> Vec2;
    fn rotation(&self, body: BodyHandle) -> f64;
    fn mass(&self, body: BodyHandle) -> f64;

    /// Distance the body has moved since the last checkpoint (`goto_state`
    /// or sandbox push).
    fn get_body_distance(&self, body: BodyHandle) -> f64;

    fn get_closest_body_with_dist(&self, body: BodyHandle) -> Option<(BodyHandle, f64)>;

    /// Surface distance between two specific bodies, in physics units.
    /// Backs `close`/`far`/group-distance features, which (unlike
    /// `get_closest_body_with_dist`) need a particular pair, not the
    /// nearest one.
    fn get_body_distance_to(&self, a: BodyHandle, b: BodyHandle) -> f64;

    /// Bodies touching `body` (surface distance within the touch
    /// tolerance), each with an approximate contact point.
    fn get_touched_bodies_with_pos(&self, body: BodyHandle) -> Vec<(BodyHandle, Vec2)>;

    /// Cluster bodies (or, if given, just `bodies`) into connected
    /// components under pairwise surface distance ≤ `max_dist`.
    fn get_spatial_groups(
        &mut self,
        max_dist: f64,
        bodies: Option<&[BodyHandle]>,
    ) -> Vec<Vec<BodyHandle>>;

    /// Step from `"start"` to `"end"`, recording every contact observed
    /// along the way. Leaves the oracle at `"end"`.
    fn observe_collisions(&mut self) -> Vec<RawCollision>;
}

/// Surface distance below which two bodies count as touching, in physics
/// units (§4.2, `touch`).
pub const TOUCH_TOLERANCE: f64 = 0.5;

/// How long a full `"start"` → `"end"` run simulates, and the substep used
/// while doing so.
const RUN_DURATION: f64 = 2.0;
const RUN_SUBSTEP: f64 = 1.0 / 60.0;

/// The concrete [`Oracle`] used throughout this crate, backed by
/// [`PhysWorld`].
pub struct SimOracle {
    world: PhysWorld,
}

impl SimOracle {
    pub fn new(world: PhysWorld) -> Self {
        SimOracle { world }
    }

    pub fn world(&self) -> &PhysWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysWorld {
        &mut self.world
    }

    fn surface_distance(&self, a: BodyHandle, b: BodyHandle) -> f64 {
        let ba = &self.world.bodies[a.0];
        let bb = &self.world.bodies[b.0];
        crate::physics::collision::surface_distance(&ba.pose, &ba.shape, &bb.pose, &bb.shape)
    }
}

impl Oracle for SimOracle {
    fn goto_state(&mut self, name: &str) {
        self.world.goto_state(name);
    }

    fn curr_state(&self) -> Option<&str> {
        self.world.curr_state.as_deref()
    }

    fn analyze_future<B, A, R>(&mut self, dt: f64, before: Option<B>, after: A) -> R
    where
        B: FnOnce(&mut Self),
        A: FnOnce(&mut Self) -> R,
    {
        self.world.push_sandbox();
        if let Some(before) = before {
            before(self);
        }
        if dt > 0.0 {
            let mut remaining = dt;
            while remaining > 0.0 {
                let step = remaining.min(RUN_SUBSTEP);
                self.world.step(step);
                remaining -= step;
            }
        }
        let result = after(self);
        self.world.pop_sandbox();
        result
    }

    fn apply_central_impulse(&mut self, body: BodyHandle, dir: Direction, mag: Magnitude) {
        let mass = self.world.mass(body);
        let impulse = dir.unit() * (mag.per_mass() * mass);
        self.world.apply_central_impulse(body, impulse);
    }

    fn is_static(&self, body: BodyHandle) -> bool {
        self.world.is_static(body)
    }

    fn set_static(&mut self, body: BodyHandle, is_static: bool) {
        self.world.set_static(body, is_static);
    }

    fn set_active(&mut self, body: BodyHandle, active: bool) {
        self.world.set_active(body, active);
    }

    fn set_sleeping_allowed(&mut self, body: BodyHandle, allowed: bool) {
        self.world.set_sleeping_allowed(body, allowed);
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2, dt: f64) {
        self.world.apply_force(body, force, dt);
    }

    fn wake_up(&mut self) {
        self.world.wake_up();
    }

    fn for_each_dynamic_body(&self, f: impl FnMut(BodyHandle)) {
        self.world.for_each_dynamic_body(f);
    }

    fn velocity(&self, body: BodyHandle) -> Vec2 {
        self.world.velocity(body).linear
    }

    fn angular_velocity(&self, body: BodyHandle) -> f64 {
        self.world.velocity(body).angular
    }

    fn position(&self, body: BodyHandle) -> Vec2 {
        self.world.pose(body).translation
    }

    fn rotation(&self, body: BodyHandle) -> f64 {
        self.world.pose(body).rotation.rad()
    }

    fn mass(&self, body: BodyHandle) -> f64 {
        self.world.mass(body)
    }

    fn get_body_distance(&self, body: BodyHandle) -> f64 {
        self.world.body_distance(body)
    }

    fn get_closest_body_with_dist(&self, body: BodyHandle) -> Option<(BodyHandle, f64)> {
        let mut best: Option<(BodyHandle, f64)> = None;
        for i in 0..self.world.bodies.len() {
            let other = BodyHandle(i);
            if other == body {
                continue;
            }
            let d = self.surface_distance(body, other);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((other, d));
            }
        }
        best
    }

    fn get_body_distance_to(&self, a: BodyHandle, b: BodyHandle) -> f64 {
        self.surface_distance(a, b)
    }

    fn get_touched_bodies_with_pos(&self, body: BodyHandle) -> Vec<(BodyHandle, Vec2)> {
        let mut out = Vec::new();
        for i in 0..self.world.bodies.len() {
            let other = BodyHandle(i);
            if other == body {
                continue;
            }
            if self.surface_distance(body, other) <= TOUCH_TOLERANCE {
                let pos = (self.position(body) + self.position(other)) * 0.5;
                out.push((other, pos));
            }
        }
        out
    }

    fn get_spatial_groups(
        &mut self,
        max_dist: f64,
        bodies: Option<&[BodyHandle]>,
    ) -> Vec<Vec<BodyHandle>> {
        let members: Vec<BodyHandle> = match bodies {
            Some(b) => b.to_vec(),
            None => (0..self.world.bodies.len()).map(BodyHandle).collect(),
        };

        let mut parent: Vec<usize> = (0..members.len()).collect();
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        fn union(parent: &mut [usize], a: usize, b: usize) {
            let (ra, rb) = (find(parent, a), find(parent, b));
            if ra != rb {
                parent[ra] = rb;
            }
        }

        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                if self.surface_distance(members[i], members[j]) <= max_dist {
                    union(&mut parent, i, j);
                }
            }
        }

        let mut groups: std::collections::HashMap<usize, Vec<BodyHandle>> =
            std::collections::HashMap::new();
        for i in 0..members.len() {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(members[i]);
        }
        groups.into_values().collect()
    }

    fn observe_collisions(&mut self) -> Vec<RawCollision> {
        self.world.goto_state("start");
        let mut seen: std::collections::HashMap<(usize, usize), f64> =
            std::collections::HashMap::new();

        let mut remaining = RUN_DURATION;
        while remaining > 0.0 {
            let step = remaining.min(RUN_SUBSTEP);
            for (a, b, dv) in self.world.contacts() {
                let key = (a.0.min(b.0), a.0.max(b.0));
                let entry = seen.entry(key).or_insert(0.0);
                if dv > *entry {
                    *entry = dv;
                }
            }
            self.world.step(step);
            remaining -= step;
        }
        for (a, b, dv) in self.world.contacts() {
            let key = (a.0.min(b.0), a.0.max(b.0));
            let entry = seen.entry(key).or_insert(0.0);
            if dv > *entry {
                *entry = dv;
            }
        }

        self.world.save_state("end");
        self.world.curr_state = Some("end".to_string());

        seen.into_iter()
            .map(|((a, b), dv)| RawCollision {
                a: BodyHandle(a),
                b: BodyHandle(b),
                dv,
            })
            .collect()
    }
}
