//! Experimental operator schemas.
//!
//! Experimental operators carry a single version and exist to verify a
//! definition before it is promoted to a stable operator set (or removed).
//! Each schema here pairs the declarative metadata with its inference rule.

use crate::context::InferenceCtx;
use crate::registry::SchemaRegistry;
use crate::rules::{self, CustomInference, InferenceRule};
use crate::schema::{AttrKind, OpSchema, SupportLevel};
use crate::types::{Dimension, ElemType};
use crate::Result;
use tracing::warn;

/// Returns a registry pre-populated with the experimental operator set.
///
/// Custom operators can be added to the returned registry via
/// `registry.register(schema)`.
pub fn experimental_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    registry.register(
        OpSchema::new("ThresholdedRelu")
            .support_level(SupportLevel::Experimental)
            .doc("Elementwise rectifier: y = x for x > alpha, 0 otherwise.")
            .attr("alpha", "Threshold value", AttrKind::Float)
            .input("X", "Input tensor", "T")
            .output("Y", "Output tensor", "T")
            .type_constraint(
                "T",
                &ElemType::FLOATS,
                "Constrain input and output types to float tensors.",
            )
            .inference(InferenceRule::PropagateFromFirstInput),
    );

    registry.register(
        OpSchema::new("ScaledTanh")
            .support_level(SupportLevel::Experimental)
            .doc("Elementwise scaled hyperbolic tangent: alpha * tanh(beta * x).")
            .attr("alpha", "Scaling value", AttrKind::Float)
            .attr("beta", "Scaling value", AttrKind::Float)
            .input("input", "Input tensor", "T")
            .output("output", "Scaled hyperbolic tangent of the input", "T")
            .type_constraint(
                "T",
                &ElemType::FLOATS,
                "Constrain input and output types to float tensors.",
            )
            .inference(InferenceRule::PropagateFromFirstInput),
    );

    registry.register(
        OpSchema::new("Scale")
            .support_level(SupportLevel::Experimental)
            .doc("Elementwise scaling of the input tensor by a constant factor.")
            .attr("scale", "The scale to apply", AttrKind::Float)
            .input("input", "Input data to be scaled", "T")
            .output("output", "Output data after scaling", "T")
            .type_constraint(
                "T",
                &ElemType::FLOATS,
                "Constrain input and output types to float tensors.",
            )
            .inference(InferenceRule::PropagateFromFirstInput),
    );

    // Known gap: "T" does not admit the integer tensor a caller supplies when
    // input_as_shape is set. Kept as declared; the validator surfaces it via
    // a warning rather than widening the constraint here.
    registry.register(
        OpSchema::new("GivenTensorFill")
            .support_level(SupportLevel::Experimental)
            .doc("Produces a tensor filled with constant values, shaped by attributes or input.")
            .optional_input("shape", "The shape of the filled tensor", "T")
            .output("X", "The filled tensor", "T")
            .attr("values", "Fill values", AttrKind::Floats)
            .attr("shape", "Explicit output shape", AttrKind::Ints)
            .attr("input_as_shape", "Treat the input's values as the output shape", AttrKind::Int)
            .attr("extra_shape", "Dimensions appended to the input shape", AttrKind::Ints)
            .type_constraint(
                "T",
                &ElemType::FLOATS,
                "Constrain input and output types to float tensors.",
            )
            .inference(InferenceRule::Custom(Box::new(GivenTensorFillRule))),
    );

    registry.register(
        OpSchema::new("GRUUnit")
            .support_level(SupportLevel::Experimental)
            .doc("Computes one timestep of a GRU in a sequence-length aware fashion.")
            .attr(
                "drop_states",
                "Whether hidden state is zeroed past the sequence length",
                AttrKind::Int,
            )
            .input("hidden_prev", "The previous GRU hidden state", "T")
            .input("gates", "Unactivated gate outputs, pre-activation", "T")
            .input("seq_lengths", "Per-batch sequence lengths", "T")
            .input("t", "The timestep for this operation", "T")
            .output("hidden", "The new GRU hidden state", "T")
            .type_constraint(
                "T",
                &ElemType::FLOATS,
                "Constrain input and output types to float tensors.",
            ),
    );

    registry.register(
        OpSchema::new("ATen")
            .support_level(SupportLevel::Experimental)
            .doc("Escape hatch for backend-native operations not yet standardized.")
            .allow_unchecked_attributes()
            .variadic_input("input", "Arbitrary input", "T")
            .variadic_output("output", "Arbitrary output", "T")
            .type_constraint(
                "T",
                &ElemType::ALL,
                "Constrain output types to bool, int32, int64, float16, float, double tensors.",
            ),
    );

    registry.register(
        OpSchema::new("DynamicSlice")
            .support_level(SupportLevel::Experimental)
            .doc("Produces a slice of the input tensor along multiple axes, numpy style.")
            .input("data", "Tensor of data to extract slices from", "T")
            .input("starts", "1-D tensor of starting indices per axis", "Tind")
            .input("ends", "1-D tensor of ending indices (exclusive) per axis", "Tind")
            .optional_input("axes", "1-D tensor of axes that starts and ends apply to", "Tind")
            .output("output", "Sliced data tensor", "T")
            .type_constraint(
                "T",
                &ElemType::ALL,
                "Constrain input and output types to all tensor types.",
            )
            .type_constraint(
                "Tind",
                &[ElemType::I32, ElemType::I64],
                "Constrain indices to integer types.",
            ),
    );

    registry
}

/// Inference rule for GivenTensorFill.
///
/// Knowledge sources in precedence order:
/// 1. A `shape` attribute fully determines the output shape.
/// 2. `input_as_shape != 0` means the shape lives in the input's *values*,
///    known only at execution time; the output stays unresolved.
/// 3. A known input shape, extended by one dimension per `extra_shape` entry.
///
/// Element type always propagates from the input first, independent of which
/// shape source applies.
struct GivenTensorFillRule;

impl CustomInference for GivenTensorFillRule {
    fn infer(&self, ctx: &mut InferenceCtx) -> Result<()> {
        rules::propagate_elem_type(ctx, 0, 0)?;

        if ctx.has_attribute("shape") {
            return rules::propagate_shape_from_attribute(ctx, "shape", 0);
        }

        if ctx.attr_int("input_as_shape", 0)? != 0 {
            // The declared "T" constraint does not admit the integer shape
            // tensor this mode expects; registry-level validation gap.
            warn!(
                op_type = ctx.op_type(),
                "input_as_shape set: output shape is execution-time only and the \
                 input bypasses the declared type constraint"
            );
            return Ok(());
        }

        let extra_shape = ctx.attr_ints("extra_shape")?;
        let Some(input_dims) = ctx.input_shape(0).map(|dims| dims.to_vec()) else {
            return Ok(());
        };

        let mut dims = input_dims;
        dims.reserve(extra_shape.len());
        for value in extra_shape {
            if value < 0 {
                return Err(ctx.fail(format!(
                    "negative value {} is not allowed in a shape specification",
                    value
                )));
            }
            dims.push(Dimension::Fixed(value as usize));
        }
        ctx.set_output_shape(0, dims)
    }
}
