//! Operator invocations and the per-node inference context.
//!
//! An [`OperatorInvocation`] is one node of a computation graph as the
//! inference engine sees it: declared input metadata, output slots to
//! populate, and statically bound attributes. [`InferenceCtx`] is the
//! read/write view a rule operates through; it lives for a single `infer`
//! call and owns no data beyond references into the invocation.

use crate::types::{AttributeValue, Dimension, ElemType, TensorTypeInfo};
use crate::{Error, Result};
use std::collections::HashMap;

/// A single operator node, ready for schema validation and shape inference.
#[derive(Debug, Clone)]
pub struct OperatorInvocation {
    /// Operator name (e.g., "Scale", "GivenTensorFill").
    pub op_type: String,

    /// Declared input metadata, in schema order. Trailing optional inputs may
    /// be omitted entirely.
    pub inputs: Vec<TensorTypeInfo>,

    /// Output slots populated by inference. The count is fixed by the
    /// operator's schema.
    pub outputs: Vec<TensorTypeInfo>,

    /// Attribute values, keyed by name. Immutable once bound at graph
    /// construction time.
    pub attributes: HashMap<String, AttributeValue>,
}

impl OperatorInvocation {
    /// Create an invocation with `num_outputs` unresolved output slots.
    pub fn new(op_type: impl Into<String>, num_outputs: usize) -> Self {
        Self {
            op_type: op_type.into(),
            inputs: Vec::new(),
            outputs: vec![TensorTypeInfo::unknown(); num_outputs],
            attributes: HashMap::new(),
        }
    }

    /// Append an input (builder style).
    pub fn with_input(mut self, input: TensorTypeInfo) -> Self {
        self.inputs.push(input);
        self
    }

    /// Bind an attribute (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Get an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// Read/write view over a single invocation, scoped to one inference call.
///
/// Inputs and attributes are read-only; output slots are the only write
/// surface. Rules must build a complete shape value before writing it, so a
/// failed rule never leaves a half-written output behind.
pub struct InferenceCtx<'a> {
    op_type: &'a str,
    inputs: &'a [TensorTypeInfo],
    attributes: &'a HashMap<String, AttributeValue>,
    outputs: &'a mut [TensorTypeInfo],
}

impl<'a> InferenceCtx<'a> {
    /// Borrow an invocation for one inference pass.
    pub fn for_invocation(invocation: &'a mut OperatorInvocation) -> Self {
        Self {
            op_type: &invocation.op_type,
            inputs: &invocation.inputs,
            attributes: &invocation.attributes,
            outputs: &mut invocation.outputs,
        }
    }

    /// Name of the operator being inferred.
    pub fn op_type(&self) -> &str {
        self.op_type
    }

    /// Number of inputs actually supplied (optional inputs may be absent).
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output slots.
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Input metadata by index, if that input was supplied.
    pub fn input(&self, index: usize) -> Option<&TensorTypeInfo> {
        self.inputs.get(index)
    }

    /// Element type of an input, if the input exists and its type is known.
    pub fn input_elem_type(&self, index: usize) -> Option<ElemType> {
        self.inputs.get(index).and_then(|info| info.elem_type)
    }

    /// Shape of an input, if the input exists and its shape is known.
    pub fn input_shape(&self, index: usize) -> Option<&[Dimension]> {
        self.inputs
            .get(index)
            .and_then(|info| info.shape.as_deref())
    }

    /// Check whether an input's shape is known.
    pub fn has_input_shape(&self, index: usize) -> bool {
        self.input_shape(index).is_some()
    }

    /// Current state of an output slot.
    pub fn output(&self, index: usize) -> Option<&TensorTypeInfo> {
        self.outputs.get(index)
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Check whether an attribute was bound.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Integer attribute with a default for absence.
    ///
    /// A present attribute of the wrong kind is malformed and fails.
    pub fn attr_int(&self, name: &str, default: i64) -> Result<i64> {
        match self.attributes.get(name) {
            Some(AttributeValue::Int(v)) => Ok(*v),
            Some(_) => Err(self.fail(format!("attribute `{}` must be an int", name))),
            None => Ok(default),
        }
    }

    /// Float attribute with a default for absence.
    pub fn attr_float(&self, name: &str, default: f32) -> Result<f32> {
        match self.attributes.get(name) {
            Some(AttributeValue::Float(v)) => Ok(*v),
            Some(_) => Err(self.fail(format!("attribute `{}` must be a float", name))),
            None => Ok(default),
        }
    }

    /// Integer-sequence attribute; absence yields an empty sequence.
    pub fn attr_ints(&self, name: &str) -> Result<Vec<i64>> {
        match self.attributes.get(name) {
            Some(AttributeValue::Ints(v)) => Ok(v.clone()),
            Some(_) => Err(self.fail(format!("attribute `{}` must be an int list", name))),
            None => Ok(Vec::new()),
        }
    }

    /// Set an output's element type.
    ///
    /// Overwriting an already-set type with a different one is a failure, not
    /// a merge.
    pub fn set_output_elem_type(&mut self, index: usize, elem_type: ElemType) -> Result<()> {
        if index >= self.outputs.len() {
            return Err(self.fail(format!("output index {} out of range", index)));
        }
        if let Some(existing) = self.outputs[index].elem_type {
            if existing != elem_type {
                return Err(self.fail(format!(
                    "output {} element type already set to {}, conflicting value {}",
                    index, existing, elem_type
                )));
            }
        }
        self.outputs[index].elem_type = Some(elem_type);
        Ok(())
    }

    /// Set an output's shape.
    ///
    /// If a shape was already set, the new one must agree: same rank, and no
    /// concrete dimension may change to a different concrete value.
    pub fn set_output_shape(&mut self, index: usize, dims: Vec<Dimension>) -> Result<()> {
        if index >= self.outputs.len() {
            return Err(self.fail(format!("output index {} out of range", index)));
        }
        if let Some(existing) = &self.outputs[index].shape {
            if existing.len() != dims.len() {
                return Err(self.fail(format!(
                    "output {} rank already set to {}, conflicting rank {}",
                    index,
                    existing.len(),
                    dims.len()
                )));
            }
            for (axis, (old, new)) in existing.iter().zip(&dims).enumerate() {
                if let (Dimension::Fixed(a), Dimension::Fixed(b)) = (old, new) {
                    if a != b {
                        return Err(self.fail(format!(
                            "output {} dimension {} already set to {}, conflicting value {}",
                            index, axis, a, b
                        )));
                    }
                }
            }
        }
        self.outputs[index].shape = Some(dims);
        Ok(())
    }

    /// Build a shape-inference error attributed to this operator.
    pub fn fail(&self, reason: impl Into<String>) -> Error {
        Error::ShapeInference {
            op_type: self.op_type.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElemType;

    #[test]
    fn test_invocation_builder() {
        let node = OperatorInvocation::new("Scale", 1)
            .with_input(TensorTypeInfo::fixed(ElemType::F32, &[4]))
            .with_attribute("scale", AttributeValue::Float(2.0));

        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.outputs.len(), 1);
        assert!(node.outputs[0].is_unknown());
        assert_eq!(node.attribute("scale"), Some(&AttributeValue::Float(2.0)));
    }

    #[test]
    fn test_ctx_input_lookup() {
        let mut node = OperatorInvocation::new("Test", 1)
            .with_input(TensorTypeInfo::fixed(ElemType::F32, &[2, 3]))
            .with_input(TensorTypeInfo::with_elem_type(ElemType::I64));

        let ctx = InferenceCtx::for_invocation(&mut node);
        assert_eq!(ctx.num_inputs(), 2);
        assert_eq!(ctx.input_elem_type(0), Some(ElemType::F32));
        assert!(ctx.has_input_shape(0));
        assert!(!ctx.has_input_shape(1));
        assert_eq!(ctx.input_elem_type(5), None);
        assert!(!ctx.has_input_shape(5));
    }

    #[test]
    fn test_attr_accessors() {
        let mut node = OperatorInvocation::new("Test", 1)
            .with_attribute("alpha", AttributeValue::Float(0.5))
            .with_attribute("axes", AttributeValue::Ints(vec![1, 2]))
            .with_attribute("flag", AttributeValue::Int(1));

        let ctx = InferenceCtx::for_invocation(&mut node);
        assert_eq!(ctx.attr_float("alpha", 1.0).unwrap(), 0.5);
        assert_eq!(ctx.attr_float("missing", 1.0).unwrap(), 1.0);
        assert_eq!(ctx.attr_int("flag", 0).unwrap(), 1);
        assert_eq!(ctx.attr_ints("axes").unwrap(), vec![1, 2]);
        assert_eq!(ctx.attr_ints("missing").unwrap(), Vec::<i64>::new());

        // Wrong kind is malformed, not absent
        assert!(ctx.attr_int("alpha", 0).is_err());
    }

    #[test]
    fn test_set_output_conflict_is_error() {
        let mut node = OperatorInvocation::new("Test", 1);
        let mut ctx = InferenceCtx::for_invocation(&mut node);

        ctx.set_output_shape(0, vec![Dimension::Fixed(2), Dimension::Fixed(3)])
            .unwrap();

        // Same value again is fine (idempotent)
        ctx.set_output_shape(0, vec![Dimension::Fixed(2), Dimension::Fixed(3)])
            .unwrap();

        // Conflicting concrete dimension is a failure, not a merge
        let err = ctx
            .set_output_shape(0, vec![Dimension::Fixed(2), Dimension::Fixed(4)])
            .unwrap_err();
        assert!(matches!(err, Error::ShapeInference { .. }));

        // Conflicting rank is also a failure
        assert!(ctx.set_output_shape(0, vec![Dimension::Fixed(2)]).is_err());
    }

    #[test]
    fn test_set_output_elem_type_conflict() {
        let mut node = OperatorInvocation::new("Test", 1);
        let mut ctx = InferenceCtx::for_invocation(&mut node);

        ctx.set_output_elem_type(0, ElemType::F32).unwrap();
        ctx.set_output_elem_type(0, ElemType::F32).unwrap();
        assert!(ctx.set_output_elem_type(0, ElemType::I64).is_err());
    }

    #[test]
    fn test_out_of_range_output() {
        let mut node = OperatorInvocation::new("Test", 1);
        let mut ctx = InferenceCtx::for_invocation(&mut node);
        assert!(ctx.set_output_elem_type(3, ElemType::F32).is_err());
        assert!(ctx.set_output_shape(3, vec![]).is_err());
    }
}
