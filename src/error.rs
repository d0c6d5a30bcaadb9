//! The core's error taxonomy (see the design doc, "error handling").
//!
//! Counterfactual features never produce these: they fall back to a defined
//! answer (e.g. an already-static body is simply reported as stable) rather
//! than failing. These errors are reserved for caller bugs and internal
//! invariant violations.

/// Errors produced while perceiving features or evaluating selectors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PerceptionError {
    #[error("unknown feature key `{0}`")]
    UnknownFeature(String),

    #[error("relation `{0}` requires a partner object but none was given")]
    MissingPartner(String),

    #[error("relation matcher's nested selector `{0}` illegally contains relation matchers")]
    IllegalNesting(String),

    #[error("selector cached complexity disagrees with recomputation (expected {expected}, got {actual})")]
    StaleCache { expected: u32, actual: u32 },

    #[error("supports relation produced an unrecognized support value `{0}`")]
    UnknownSupportValue(String),

    #[error("extremum feature `{0}` requested on a scene with no movable objects")]
    NoObjects(String),
}

pub type Result<T> = std::result::Result<T, PerceptionError>;
