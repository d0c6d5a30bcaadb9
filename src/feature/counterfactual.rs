//! Counterfactual features (§4.3): `moves`, `is_supported`, `stability`,
//! `can_move_up` and the `supports` relation. These are the real
//! engineering core of the perception model — each sandboxes a
//! perturbation through [`Oracle::analyze_future`] and measures the
//! result without letting the perturbation escape.

use crate::config;
use crate::math::Vec2;
use crate::oracle::{Direction, Magnitude, Oracle};
use crate::physics::BodyHandle;
use crate::sigmoid::sigma;

fn speed_membership(v: f64) -> f64 {
    sigma(40.0, 0.1, v)
}

/// `moves`: max of the present linear-velocity membership and the same
/// membership measured 0.1s in the future.
pub fn moves<O: Oracle>(oracle: &mut O, body: BodyHandle) -> (f64, &'static str) {
    let now = speed_membership(oracle.velocity(body).mag());
    let future = oracle.analyze_future(0.1, None::<fn(&mut O)>, |o: &mut O| {
        speed_membership(o.velocity(body).mag())
    });
    let activity = now.max(future);
    let label = if activity >= config::ACTIVATION_THRESHOLD {
        "moving"
    } else {
        "still"
    };
    (activity, label)
}

/// `is_supported`: same measurement as `moves`, but the future step first
/// freezes every other dynamic body so only this object's own support
/// matters.
pub fn is_supported<O: Oracle>(oracle: &mut O, body: BodyHandle) -> (f64, &'static str) {
    let now = speed_membership(oracle.velocity(body).mag());
    let future = oracle.analyze_future(
        0.1,
        Some(|o: &mut O| {
            let mut others = Vec::new();
            o.for_each_dynamic_body(|h| others.push(h));
            for h in others {
                if h != body {
                    o.set_static(h, true);
                }
            }
        }),
        |o: &mut O| speed_membership(o.velocity(body).mag()),
    );
    let activity = now.max(future);
    let label = if activity >= config::ACTIVATION_THRESHOLD {
        "true"
    } else {
        "false"
    };
    (activity, label)
}

fn push_test<O: Oracle>(
    oracle: &mut O,
    body: BodyHandle,
    mag: Magnitude,
    start_pos: Vec2,
    start_rot: f64,
    v_thresh: f64,
    d_thresh: f64,
    rot_thresh_deg: f64,
) -> bool {
    for dir in [Direction::Left, Direction::Right] {
        let ok = oracle.analyze_future(
            0.3,
            Some(|o: &mut O| o.apply_central_impulse(body, dir, mag)),
            |o: &mut O| {
                let v = o.velocity(body).mag();
                let moved = (o.position(body) - start_pos).mag();
                let mut rot_change = (o.rotation(body) - start_rot).to_degrees().abs() % 360.0;
                if rot_change > 180.0 {
                    rot_change = 360.0 - rot_change;
                }
                v < v_thresh && moved < d_thresh && rot_change < rot_thresh_deg
            },
        );
        if !ok {
            return false;
        }
    }
    true
}

/// `stability`: static bodies are always stable; a fast-moving body is
/// `moving`; otherwise two medium pushes (left, right) are tried, then two
/// small pushes with thresholds scaled by 2/3 (§4.3).
pub fn stability<O: Oracle>(oracle: &mut O, body: BodyHandle, is_circle: bool) -> (f64, &'static str) {
    if oracle.is_static(body) {
        return (1.0, "stable");
    }
    if oracle.velocity(body).mag() > 0.25 {
        return (1.0, "moving");
    }

    let start_pos = oracle.position(body);
    let start_rot = oracle.rotation(body);
    let rot_limit = if is_circle { 60.0 } else { 9.0 };

    if push_test(oracle, body, Magnitude::Medium, start_pos, start_rot, 0.4, 0.2, rot_limit) {
        return (1.0, "stable");
    }

    let scale = 2.0 / 3.0;
    if push_test(
        oracle,
        body,
        Magnitude::Small,
        start_pos,
        start_rot,
        0.4 * scale,
        0.2 * scale,
        rot_limit * scale,
    ) {
        return (1.0, "slightly unstable");
    }

    (1.0, "unstable")
}

/// `stability`'s label collapsed to the binary the matcher system actually
/// compares against (§4.3: "label collapses to `stable` ... vs `unstable`").
pub fn stability_collapsed(label: &str) -> &'static str {
    match label {
        "stable" | "slightly unstable" => "stable",
        _ => "unstable",
    }
}

/// `can_move_up`: push straight up with force `12·mass` for 2.5s (sleep
/// disabled), then check whether the object ends up touching the frame
/// near its top edge. `frame` is `(frame_body, frame_top_y)`.
pub fn can_move_up<O: Oracle>(
    oracle: &mut O,
    body: BodyHandle,
    frame: Option<(BodyHandle, f64)>,
) -> (f64, &'static str) {
    if oracle.is_static(body) {
        return (0.0, "false");
    }
    let Some((frame_body, top_y)) = frame else {
        return (0.0, "false");
    };

    let force = Vec2::new(0.0, 12.0 * oracle.mass(body));
    let touches_top = oracle.analyze_future(
        2.5,
        Some(|o: &mut O| {
            o.set_sleeping_allowed(body, false);
            o.apply_force(body, force, 2.5);
        }),
        |o: &mut O| {
            o.get_touched_bodies_with_pos(body)
                .into_iter()
                .any(|(h, pt)| h == frame_body && pt.y < top_y + 0.1)
        },
    );

    (if touches_top { 1.0 } else { 0.0 }, if touches_top { "true" } else { "false" })
}

/// `supports(a, b)`: four-level judgement of whether `a` holds `b` up
/// (§4.2). The caller supplies the already-perceived predicates this needs
/// (`touch`, `on_top_of(b,a)`, `close`, and `b`'s last-known stability) so
/// this function only has to run the counterfactual parts.
#[allow(clippy::too_many_arguments)]
pub fn supports<O: Oracle>(
    oracle: &mut O,
    a: BodyHandle,
    b: BodyHandle,
    a_is_b: bool,
    touch_ab: bool,
    on_top_of_b_a: bool,
    close_ab: bool,
    b_was_stable: bool,
    b_is_circle: bool,
) -> (f64, &'static str) {
    if a_is_b {
        return (0.0, "not");
    }
    let (b_moves_now, _) = moves(oracle, b);
    if b_moves_now >= config::ACTIVATION_THRESHOLD {
        return (0.0, "not");
    }

    let b_moves_without_a = oracle.analyze_future(
        0.0,
        Some(|o: &mut O| {
            o.set_active(a, false);
            o.wake_up();
        }),
        |o: &mut O| moves(o, b).0,
    );

    if b_moves_without_a >= config::ACTIVATION_THRESHOLD {
        return if touch_ab {
            (1.0, "directly")
        } else {
            (0.7, "indirectly")
        };
    }

    if on_top_of_b_a {
        return (0.4, "stabilizes");
    }

    if close_ab && b_was_stable {
        let new_label = oracle.analyze_future(
            0.0,
            Some(|o: &mut O| {
                o.set_active(a, false);
                o.wake_up();
            }),
            |o: &mut O| stability(o, b, b_is_circle).1,
        );
        if stability_collapsed(new_label) != "stable" {
            return (0.4, "stabilizes");
        }
    }

    (0.0, "not")
}
