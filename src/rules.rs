//! Built-in shape/type propagation rules.
//!
//! A rule reads input metadata and attributes through an [`InferenceCtx`] and
//! populates output slots. Absence of information is never an error: a rule
//! that cannot determine a field leaves it unset and returns `Ok`. Only
//! contradictory or out-of-domain values (negative dimensions, malformed
//! attributes, conflicting concrete dimensions) fail.

use crate::context::InferenceCtx;
use crate::types::{AttributeValue, Dimension};
use crate::Result;

/// Copy the element type of one input to one output.
///
/// No-op (not a failure) when the input is absent or its type is unset.
pub fn propagate_elem_type(
    ctx: &mut InferenceCtx,
    input_index: usize,
    output_index: usize,
) -> Result<()> {
    let Some(elem_type) = ctx.input_elem_type(input_index) else {
        return Ok(());
    };
    ctx.set_output_elem_type(output_index, elem_type)
}

/// Copy element type and shape from input 0 to output 0.
///
/// The default policy for pure elementwise operators: the operation changes
/// neither rank nor extents, so output shape equals input shape. Type and
/// shape propagation are independent; an unknown input shape still lets the
/// element type through.
pub fn propagate_shape_and_type_from_first_input(ctx: &mut InferenceCtx) -> Result<()> {
    propagate_elem_type(ctx, 0, 0)?;
    let shape = ctx.input_shape(0).map(|dims| dims.to_vec());
    if let Some(dims) = shape {
        ctx.set_output_shape(0, dims)?;
    }
    Ok(())
}

/// Set an output's dimensions literally from an integer-sequence attribute.
///
/// User-declared metadata overrides anything derivable from inputs, so this
/// is applied unconditionally when the attribute is present. Fails if the
/// attribute is missing or malformed, or if any declared value is negative.
pub fn propagate_shape_from_attribute(
    ctx: &mut InferenceCtx,
    attribute: &str,
    output_index: usize,
) -> Result<()> {
    let values = match ctx.attribute(attribute) {
        Some(AttributeValue::Ints(values)) => values.clone(),
        Some(_) => {
            return Err(ctx.fail(format!("attribute `{}` must be an int list", attribute)));
        }
        None => {
            return Err(ctx.fail(format!(
                "attribute `{}` required for shape inference is missing",
                attribute
            )));
        }
    };

    let mut dims = Vec::with_capacity(values.len());
    for value in values {
        if value < 0 {
            return Err(ctx.fail(format!(
                "negative value {} in shape attribute `{}`",
                value, attribute
            )));
        }
        dims.push(Dimension::Fixed(value as usize));
    }
    ctx.set_output_shape(output_index, dims)
}

/// Arbitrary per-operator inference logic.
///
/// Implementations must be pure functions of the context's declared metadata:
/// no hidden state, no I/O. `Send + Sync` so unrelated graph branches can be
/// inferred in parallel by the caller.
pub trait CustomInference: Send + Sync {
    /// Populate output slots from input metadata and attributes.
    fn infer(&self, ctx: &mut InferenceCtx) -> Result<()>;
}

impl<F> CustomInference for F
where
    F: Fn(&mut InferenceCtx) -> Result<()> + Send + Sync,
{
    fn infer(&self, ctx: &mut InferenceCtx) -> Result<()> {
        self(ctx)
    }
}

/// How a schema propagates output shape/type, as a closed set of strategies.
///
/// Most operators use one of the built-in variants; `Custom` preserves
/// extensibility for operators with bespoke semantics without storing
/// unrestricted callbacks on every schema.
pub enum InferenceRule {
    /// No rule declared; output slots stay unresolved.
    None,

    /// [`propagate_shape_and_type_from_first_input`].
    PropagateFromFirstInput,

    /// [`propagate_shape_from_attribute`] on output 0 using the named
    /// attribute, with element type propagated from input 0 first.
    ShapeFromAttribute(String),

    /// Operator-specific logic.
    Custom(Box<dyn CustomInference>),
}

impl InferenceRule {
    /// Run this rule against a node's context.
    pub fn infer(&self, ctx: &mut InferenceCtx) -> Result<()> {
        match self {
            InferenceRule::None => Ok(()),
            InferenceRule::PropagateFromFirstInput => {
                propagate_shape_and_type_from_first_input(ctx)
            }
            InferenceRule::ShapeFromAttribute(attribute) => {
                propagate_elem_type(ctx, 0, 0)?;
                propagate_shape_from_attribute(ctx, attribute, 0)
            }
            InferenceRule::Custom(custom) => custom.infer(ctx),
        }
    }
}

impl std::fmt::Debug for InferenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceRule::None => f.write_str("None"),
            InferenceRule::PropagateFromFirstInput => f.write_str("PropagateFromFirstInput"),
            InferenceRule::ShapeFromAttribute(attribute) => {
                write!(f, "ShapeFromAttribute({:?})", attribute)
            }
            InferenceRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
