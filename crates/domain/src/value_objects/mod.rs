//! Value objects - Immutable objects defined by their attributes

mod decision_scope;

pub use decision_scope::{DecisionScope, StructuredScope};
