//! Feature registry: the static table mapping feature keys to metadata
//! (§6, `pbpSettings`'s three registries). Every feature in §4.2 has a
//! variant here; [`ObjAttrKey::ALL`], [`RelKey::ALL`] and
//! [`GroupAttrKey::ALL`] stand in for the "populated at module load" maps in
//! the source, since a closed, compile-time-checked enum is the natural
//! equivalent of a fixed feature taxonomy in Rust.

use std::fmt;

/// A key identifying one object (arity-1) attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjAttrKey {
    Shape,
    Circle,
    Square,
    Rect,
    Triangle,
    Small,
    Large,
    LeftPos,
    RightPos,
    TopPos,
    BottomPos,
    LeftMost,
    RightMost,
    TopMost,
    Single,
    OnGround,
    Moves,
    IsSupported,
    Stability,
    CanMoveUp,
}

impl ObjAttrKey {
    pub const ALL: &'static [ObjAttrKey] = &[
        ObjAttrKey::Shape,
        ObjAttrKey::Circle,
        ObjAttrKey::Square,
        ObjAttrKey::Rect,
        ObjAttrKey::Triangle,
        ObjAttrKey::Small,
        ObjAttrKey::Large,
        ObjAttrKey::LeftPos,
        ObjAttrKey::RightPos,
        ObjAttrKey::TopPos,
        ObjAttrKey::BottomPos,
        ObjAttrKey::LeftMost,
        ObjAttrKey::RightMost,
        ObjAttrKey::TopMost,
        ObjAttrKey::Single,
        ObjAttrKey::OnGround,
        ObjAttrKey::Moves,
        ObjAttrKey::IsSupported,
        ObjAttrKey::Stability,
        ObjAttrKey::CanMoveUp,
    ];

    /// Features whose value never depends on simulator time; always cached
    /// under `"start"` regardless of the requested time (§4.4 resolution
    /// rule step 1).
    pub fn is_constant(self) -> bool {
        matches!(
            self,
            ObjAttrKey::Shape
                | ObjAttrKey::Circle
                | ObjAttrKey::Square
                | ObjAttrKey::Rect
                | ObjAttrKey::Triangle
                | ObjAttrKey::Small
                | ObjAttrKey::Large
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjAttrKey::Shape => "shape",
            ObjAttrKey::Circle => "circle",
            ObjAttrKey::Square => "square",
            ObjAttrKey::Rect => "rect",
            ObjAttrKey::Triangle => "triangle",
            ObjAttrKey::Small => "small",
            ObjAttrKey::Large => "large",
            ObjAttrKey::LeftPos => "left_pos",
            ObjAttrKey::RightPos => "right_pos",
            ObjAttrKey::TopPos => "top_pos",
            ObjAttrKey::BottomPos => "bottom_pos",
            ObjAttrKey::LeftMost => "left_most",
            ObjAttrKey::RightMost => "right_most",
            ObjAttrKey::TopMost => "top_most",
            ObjAttrKey::Single => "single",
            ObjAttrKey::OnGround => "on_ground",
            ObjAttrKey::Moves => "moves",
            ObjAttrKey::IsSupported => "is_supported",
            ObjAttrKey::Stability => "stability",
            ObjAttrKey::CanMoveUp => "can_move_up",
        }
    }
}

impl fmt::Display for ObjAttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key identifying a binary (arity-2) relation between two objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelKey {
    LeftOf,
    RightOf,
    Above,
    Below,
    Beside,
    OnTopOf,
    Touch,
    Close,
    Far,
    Hits,
    GetsHit,
    Collides,
    Supports,
}

impl RelKey {
    pub const ALL: &'static [RelKey] = &[
        RelKey::LeftOf,
        RelKey::RightOf,
        RelKey::Above,
        RelKey::Below,
        RelKey::Beside,
        RelKey::OnTopOf,
        RelKey::Touch,
        RelKey::Close,
        RelKey::Far,
        RelKey::Hits,
        RelKey::GetsHit,
        RelKey::Collides,
        RelKey::Supports,
    ];

    pub fn is_constant(self) -> bool {
        matches!(self, RelKey::Hits | RelKey::GetsHit | RelKey::Collides)
    }

    pub fn is_symmetric(self) -> bool {
        matches!(self, RelKey::Beside | RelKey::Touch | RelKey::Collides)
    }

    pub fn name(self) -> &'static str {
        match self {
            RelKey::LeftOf => "left_of",
            RelKey::RightOf => "right_of",
            RelKey::Above => "above",
            RelKey::Below => "below",
            RelKey::Beside => "beside",
            RelKey::OnTopOf => "on_top_of",
            RelKey::Touch => "touch",
            RelKey::Close => "close",
            RelKey::Far => "far",
            RelKey::Hits => "hits",
            RelKey::GetsHit => "gets_hit",
            RelKey::Collides => "collides",
            RelKey::Supports => "supports",
        }
    }
}

impl fmt::Display for RelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key identifying a group (whole-group, not pairwise) attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupAttrKey {
    Count,
    Close,
    Touching,
    Far,
}

impl GroupAttrKey {
    pub const ALL: &'static [GroupAttrKey] = &[
        GroupAttrKey::Count,
        GroupAttrKey::Close,
        GroupAttrKey::Touching,
        GroupAttrKey::Far,
    ];

    pub fn is_constant(self) -> bool {
        matches!(self, GroupAttrKey::Count)
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupAttrKey::Count => "count",
            GroupAttrKey::Close => "close",
            GroupAttrKey::Touching => "touching",
            GroupAttrKey::Far => "far",
        }
    }
}

impl fmt::Display for GroupAttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unifies the three key types for use as a single cache key in
/// [`crate::node::ObjectNode`] (object attributes and relations share one
/// `times` table per §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    Attr(ObjAttrKey),
    Rel(RelKey),
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Attr(k) => k.fmt(f),
            FeatureKey::Rel(k) => k.fmt(f),
        }
    }
}
