//! Operator schema registry and static shape/type inference.
//!
//! This crate provides the declarative metadata layer of an ML computation
//! graph format: each operator is described by an [`OpSchema`] (typed inputs,
//! outputs, attributes, and element-type constraints) together with an
//! [`InferenceRule`] that propagates output shape and element type from input
//! metadata without executing the operator.
//!
//! # Example
//!
//! ```
//! use inferrix::{experimental_registry, AttributeValue, ElemType, OperatorInvocation, TensorTypeInfo};
//!
//! let registry = experimental_registry();
//!
//! let mut node = OperatorInvocation::new("ThresholdedRelu", 1)
//!     .with_input(TensorTypeInfo::fixed(ElemType::F32, &[2, 3]))
//!     .with_attribute("alpha", AttributeValue::Float(0.5));
//!
//! registry.infer(&mut node).unwrap();
//!
//! assert_eq!(node.outputs[0], TensorTypeInfo::fixed(ElemType::F32, &[2, 3]));
//! ```
//!
//! Inference is a pure function of the invocation's declared metadata: running
//! it twice on the same node yields the same result. Missing information is
//! never an error; the affected output fields simply stay unset.

pub mod context;
pub mod experimental;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod types;

pub use context::{InferenceCtx, OperatorInvocation};
pub use experimental::experimental_registry;
pub use registry::SchemaRegistry;
pub use rules::{CustomInference, InferenceRule};
pub use schema::{ArgOption, AttrKind, AttrSpec, FormalParameter, OpSchema, SupportLevel, TypeConstraint};
pub use types::{AttributeValue, Dimension, ElemType, TensorTypeInfo};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by schema validation and shape inference.
///
/// Both variants carry the operator name so a graph-level validator can
/// attribute the failure to the offending node. Insufficient information is
/// deliberately *not* an error: rules leave the affected output fields unset
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invocation does not match its declared schema: element type outside
    /// the allowed set, input/output arity mismatch, or a malformed or
    /// undeclared attribute. Detected before any inference rule runs.
    #[error("{op_type}: constraint violation: {reason}")]
    ConstraintViolation { op_type: String, reason: String },

    /// An inference rule failed: a negative dimension was declared or derived,
    /// an attribute the rule depends on is malformed, or a freshly computed
    /// dimension conflicts with one already set on the output.
    #[error("{op_type}: shape inference failed: {reason}")]
    ShapeInference { op_type: String, reason: String },
}

impl Error {
    /// Name of the operator this error is attributed to.
    pub fn op_type(&self) -> &str {
        match self {
            Error::ConstraintViolation { op_type, .. } => op_type,
            Error::ShapeInference { op_type, .. } => op_type,
        }
    }
}
