//! The feature taxonomy (§4.2): the concrete 30+ attributes, relations and
//! group attributes, plus the small static registry describing their
//! metadata. [`crate::node`] is the layer that actually drives perception —
//! this module is the "library" it calls into.

pub mod attributes;
pub mod counterfactual;
pub mod groups;
pub mod key;
pub mod relations;

pub use key::{FeatureKey, GroupAttrKey, ObjAttrKey, RelKey};

use crate::shape::ShapeId;

/// A percept over a single object: one attribute value at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub key: ObjAttrKey,
    pub activity: f64,
    pub label: String,
}

impl Attribute {
    pub fn new(key: ObjAttrKey, activity: f64, label: impl Into<String>) -> Self {
        Attribute {
            key,
            activity,
            label: label.into(),
        }
    }

    pub fn get_activity(&self) -> f64 {
        self.activity
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }
}

/// A percept describing this object's relation to one `other` object.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub key: RelKey,
    pub other: ShapeId,
    pub activity: f64,
    pub label: String,
}

impl Relation {
    pub fn new(key: RelKey, other: impl Into<ShapeId>, activity: f64, label: impl Into<String>) -> Self {
        Relation {
            key,
            other: other.into(),
            activity,
            label: label.into(),
        }
    }

    pub fn get_activity(&self) -> f64 {
        self.activity
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn other(&self) -> &str {
        &self.other
    }
}

/// A percept over a whole group of objects.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupAttribute {
    pub key: GroupAttrKey,
    pub activity: f64,
    pub label: String,
}

impl GroupAttribute {
    pub fn new(key: GroupAttrKey, activity: f64, label: impl Into<String>) -> Self {
        GroupAttribute {
            key,
            activity,
            label: label.into(),
        }
    }

    pub fn get_activity(&self) -> f64 {
        self.activity
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }
}

/// Static metadata for one feature, independent of any particular scene —
/// the compile-time equivalent of the source's registry entries (§6).
#[derive(Clone, Copy, Debug)]
pub struct FeatureDescriptor {
    pub arity: u8,
    pub constant: bool,
    pub symmetric: bool,
}

impl ObjAttrKey {
    pub fn descriptor(self) -> FeatureDescriptor {
        FeatureDescriptor {
            arity: 1,
            constant: self.is_constant(),
            symmetric: false,
        }
    }
}

impl RelKey {
    pub fn descriptor(self) -> FeatureDescriptor {
        FeatureDescriptor {
            arity: 2,
            constant: self.is_constant(),
            symmetric: self.is_symmetric(),
        }
    }
}

impl GroupAttrKey {
    pub fn descriptor(self) -> FeatureDescriptor {
        FeatureDescriptor {
            arity: 1,
            constant: self.is_constant(),
            symmetric: false,
        }
    }
}
