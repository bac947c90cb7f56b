//! Schema registry: the canonical operator name -> schema mapping.

use crate::context::{InferenceCtx, OperatorInvocation};
use crate::schema::OpSchema;
use crate::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Registry of operator schemas.
///
/// Maps operator names (e.g., "Scale", "GivenTensorFill") to their immutable
/// [`OpSchema`] records. A graph validator walks nodes in topological order
/// and calls [`SchemaRegistry::infer`] for each; the registry validates the
/// invocation against its schema and then runs the schema's inference rule.
///
/// # Example
///
/// ```
/// use inferrix::{InferenceRule, OpSchema, SchemaRegistry};
///
/// let mut registry = SchemaRegistry::new();
/// registry.register(
///     OpSchema::new("Identity")
///         .input("input", "Input tensor", "T")
///         .output("output", "Output tensor", "T")
///         .inference(InferenceRule::PropagateFromFirstInput),
/// );
///
/// assert!(registry.contains("Identity"));
/// ```
pub struct SchemaRegistry {
    schemas: HashMap<String, OpSchema>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Register a schema under its operator name.
    ///
    /// Returns `self` for method chaining. Re-registering a name replaces the
    /// previous schema.
    pub fn register(&mut self, schema: OpSchema) -> &mut Self {
        debug!(op_type = schema.name(), "registering operator schema");
        self.schemas.insert(schema.name().to_string(), schema);
        self
    }

    /// Look up a schema by operator name.
    pub fn get(&self, name: &str) -> Option<&OpSchema> {
        self.schemas.get(name)
    }

    /// Check if an operator is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Get the number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Iterate over all registered operator names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|s| s.as_str())
    }

    /// Validate an invocation and run its schema's inference rule.
    ///
    /// The invocation's element types are checked against the schema's
    /// allow-sets and its arity and attributes against the declarations
    /// before any inference runs. On failure the invocation's outputs carry
    /// no value the failed rule computed; fields that remain unset mean
    /// "unknown", not an error.
    pub fn infer(&self, invocation: &mut OperatorInvocation) -> Result<()> {
        let schema = self.schemas.get(&invocation.op_type).ok_or_else(|| {
            Error::ConstraintViolation {
                op_type: invocation.op_type.clone(),
                reason: "no schema registered for operator".to_string(),
            }
        })?;

        schema.check_invocation(invocation)?;

        let mut ctx = InferenceCtx::for_invocation(invocation);
        schema.rule().infer(&mut ctx)?;

        let unresolved = invocation
            .outputs
            .iter()
            .filter(|out| out.shape.is_none())
            .count();
        if unresolved > 0 {
            trace!(
                op_type = %invocation.op_type,
                unresolved_outputs = unresolved,
                "inference left output shape(s) unresolved"
            );
        } else {
            debug!(op_type = %invocation.op_type, "inference resolved all output shapes");
        }

        Ok(())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::InferenceRule;
    use crate::types::{ElemType, TensorTypeInfo};

    fn identity_schema(name: &str) -> OpSchema {
        OpSchema::new(name)
            .input("input", "", "T")
            .output("output", "", "T")
            .type_constraint("T", &ElemType::FLOATS, "")
            .inference(InferenceRule::PropagateFromFirstInput)
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = SchemaRegistry::new();
        registry.register(identity_schema("Relu"));
        registry.register(identity_schema("Tanh"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Relu"));
        assert!(!registry.contains("Sub"));
        assert_eq!(registry.get("Tanh").unwrap().name(), "Tanh");
        assert!(registry.get("Sub").is_none());
    }

    #[test]
    fn test_method_chaining() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(identity_schema("Relu"))
            .register(identity_schema("Tanh"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_names() {
        let mut registry = SchemaRegistry::new();
        registry.register(identity_schema("Relu"));
        registry.register(identity_schema("Tanh"));

        let mut names: Vec<_> = registry.names().collect();
        names.sort();
        assert_eq!(names, vec!["Relu", "Tanh"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_infer_unknown_operator() {
        let registry = SchemaRegistry::new();
        let mut node = OperatorInvocation::new("Mystery", 1);
        let err = registry.infer(&mut node).unwrap_err();
        assert!(matches!(err, crate::Error::ConstraintViolation { .. }));
        assert_eq!(err.op_type(), "Mystery");
    }

    #[test]
    fn test_infer_runs_validation_before_rule() {
        let mut registry = SchemaRegistry::new();
        registry.register(identity_schema("Relu"));

        // Integer input violates the float-only constraint; the rule must not
        // run, so the output stays untouched.
        let mut node = OperatorInvocation::new("Relu", 1)
            .with_input(TensorTypeInfo::fixed(ElemType::I64, &[2]));
        assert!(registry.infer(&mut node).is_err());
        assert!(node.outputs[0].is_unknown());
    }

    #[test]
    fn test_infer_propagates() {
        let mut registry = SchemaRegistry::new();
        registry.register(identity_schema("Relu"));

        let mut node = OperatorInvocation::new("Relu", 1)
            .with_input(TensorTypeInfo::fixed(ElemType::F32, &[5, 7]));
        registry.infer(&mut node).unwrap();
        assert_eq!(node.outputs[0], TensorTypeInfo::fixed(ElemType::F32, &[5, 7]));
    }
}
