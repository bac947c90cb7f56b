//! Declarative operator schemas.
//!
//! An [`OpSchema`] is an immutable record describing one operator: its typed
//! inputs and outputs, its attributes, the element-type sets each formal
//! parameter may take, and the [`InferenceRule`] that propagates output
//! metadata. Schemas are built once at load time with a builder and then only
//! read.

use crate::context::OperatorInvocation;
use crate::rules::InferenceRule;
use crate::types::{AttributeValue, ElemType};
use crate::{Error, Result};

/// Maturity of an operator definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportLevel {
    /// Stable, versioned operator.
    Common,

    /// Experimental operator: single version, used to verify a definition
    /// before promotion, and may be removed at any time.
    Experimental,
}

/// Arity marker for a formal input or output parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgOption {
    /// Exactly one tensor must be supplied.
    Single,

    /// The tensor may be omitted (trailing position only).
    Optional,

    /// One or more tensors may be supplied (last position only).
    Variadic,
}

/// A formal input or output parameter of an operator.
#[derive(Debug, Clone)]
pub struct FormalParameter {
    /// Parameter name (e.g., "X", "starts").
    pub name: String,

    /// Human-readable description.
    pub doc: String,

    /// Key of the type constraint this parameter is bound to (e.g., "T").
    pub type_key: String,

    /// Arity marker.
    pub option: ArgOption,
}

/// Value kind an attribute must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Float,
    Int,
    Floats,
    Ints,
    Tensor,
}

impl AttrKind {
    /// Check whether a bound value matches this kind.
    pub fn matches(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (AttrKind::Float, AttributeValue::Float(_))
                | (AttrKind::Int, AttributeValue::Int(_))
                | (AttrKind::Floats, AttributeValue::Floats(_))
                | (AttrKind::Ints, AttributeValue::Ints(_))
                | (AttrKind::Tensor, AttributeValue::Tensor(_))
        )
    }

    fn name(&self) -> &'static str {
        match self {
            AttrKind::Float => "float",
            AttrKind::Int => "int",
            AttrKind::Floats => "float list",
            AttrKind::Ints => "int list",
            AttrKind::Tensor => "tensor",
        }
    }
}

/// Declared attribute of an operator.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    /// Attribute name.
    pub name: String,

    /// Human-readable description.
    pub doc: String,

    /// Required value kind.
    pub kind: AttrKind,

    /// Whether the attribute must be bound on every invocation.
    pub required: bool,
}

/// Named set of element types a group of parameters is constrained to.
#[derive(Debug, Clone)]
pub struct TypeConstraint {
    /// Constraint key referenced by parameters (e.g., "T", "Tind").
    pub key: String,

    /// Element types the constrained parameters may take.
    pub allowed: Vec<ElemType>,

    /// Human-readable description.
    pub doc: String,
}

/// Immutable description of one operator.
#[derive(Debug)]
pub struct OpSchema {
    name: String,
    support_level: SupportLevel,
    doc: String,
    inputs: Vec<FormalParameter>,
    outputs: Vec<FormalParameter>,
    attributes: Vec<AttrSpec>,
    type_constraints: Vec<TypeConstraint>,
    allow_unchecked_attributes: bool,
    inference: InferenceRule,
}

impl OpSchema {
    /// Start building a schema for the named operator.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            support_level: SupportLevel::Common,
            doc: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: Vec::new(),
            type_constraints: Vec::new(),
            allow_unchecked_attributes: false,
            inference: InferenceRule::None,
        }
    }

    /// Set the support level.
    pub fn support_level(mut self, level: SupportLevel) -> Self {
        self.support_level = level;
        self
    }

    /// Set the operator description.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Declare a required input.
    pub fn input(self, name: &str, doc: &str, type_key: &str) -> Self {
        self.push_input(name, doc, type_key, ArgOption::Single)
    }

    /// Declare an input that may be omitted.
    pub fn optional_input(self, name: &str, doc: &str, type_key: &str) -> Self {
        self.push_input(name, doc, type_key, ArgOption::Optional)
    }

    /// Declare a variadic input (last position).
    pub fn variadic_input(self, name: &str, doc: &str, type_key: &str) -> Self {
        self.push_input(name, doc, type_key, ArgOption::Variadic)
    }

    /// Declare a required output.
    pub fn output(self, name: &str, doc: &str, type_key: &str) -> Self {
        self.push_output(name, doc, type_key, ArgOption::Single)
    }

    /// Declare a variadic output (last position).
    pub fn variadic_output(self, name: &str, doc: &str, type_key: &str) -> Self {
        self.push_output(name, doc, type_key, ArgOption::Variadic)
    }

    /// Declare an optional attribute.
    pub fn attr(mut self, name: &str, doc: &str, kind: AttrKind) -> Self {
        self.attributes.push(AttrSpec {
            name: name.to_string(),
            doc: doc.to_string(),
            kind,
            required: false,
        });
        self
    }

    /// Declare a required attribute.
    pub fn required_attr(mut self, name: &str, doc: &str, kind: AttrKind) -> Self {
        self.attributes.push(AttrSpec {
            name: name.to_string(),
            doc: doc.to_string(),
            kind,
            required: true,
        });
        self
    }

    /// Declare a named element-type constraint.
    pub fn type_constraint(mut self, key: &str, allowed: &[ElemType], doc: &str) -> Self {
        self.type_constraints.push(TypeConstraint {
            key: key.to_string(),
            allowed: allowed.to_vec(),
            doc: doc.to_string(),
        });
        self
    }

    /// Accept attributes that are not declared in the schema.
    pub fn allow_unchecked_attributes(mut self) -> Self {
        self.allow_unchecked_attributes = true;
        self
    }

    /// Set the inference rule.
    pub fn inference(mut self, rule: InferenceRule) -> Self {
        self.inference = rule;
        self
    }

    fn push_input(mut self, name: &str, doc: &str, type_key: &str, option: ArgOption) -> Self {
        self.inputs.push(FormalParameter {
            name: name.to_string(),
            doc: doc.to_string(),
            type_key: type_key.to_string(),
            option,
        });
        self
    }

    fn push_output(mut self, name: &str, doc: &str, type_key: &str, option: ArgOption) -> Self {
        self.outputs.push(FormalParameter {
            name: name.to_string(),
            doc: doc.to_string(),
            type_key: type_key.to_string(),
            option,
        });
        self
    }

    /// Operator name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Support level.
    pub fn level(&self) -> SupportLevel {
        self.support_level
    }

    /// Operator description.
    pub fn description(&self) -> &str {
        &self.doc
    }

    /// Declared formal inputs.
    pub fn inputs(&self) -> &[FormalParameter] {
        &self.inputs
    }

    /// Declared formal outputs.
    pub fn outputs(&self) -> &[FormalParameter] {
        &self.outputs
    }

    /// Declared attributes.
    pub fn attributes(&self) -> &[AttrSpec] {
        &self.attributes
    }

    /// Declared type constraints.
    pub fn type_constraints(&self) -> &[TypeConstraint] {
        &self.type_constraints
    }

    /// The schema's inference rule.
    pub fn rule(&self) -> &InferenceRule {
        &self.inference
    }

    /// Look up a type constraint by key.
    pub fn constraint(&self, key: &str) -> Option<&TypeConstraint> {
        self.type_constraints.iter().find(|c| c.key == key)
    }

    /// Minimum and maximum accepted input count (`None` = unbounded).
    pub fn input_arity(&self) -> (usize, Option<usize>) {
        Self::arity(&self.inputs)
    }

    /// Minimum and maximum accepted output count (`None` = unbounded).
    pub fn output_arity(&self) -> (usize, Option<usize>) {
        Self::arity(&self.outputs)
    }

    fn arity(params: &[FormalParameter]) -> (usize, Option<usize>) {
        let min = params
            .iter()
            .filter(|p| p.option == ArgOption::Single)
            .count();
        let max = if params.iter().any(|p| p.option == ArgOption::Variadic) {
            None
        } else {
            Some(params.len())
        };
        (min, max)
    }

    /// Formal parameter covering the given position, accounting for a
    /// trailing variadic parameter absorbing all later positions.
    fn param_at(params: &[FormalParameter], index: usize) -> Option<&FormalParameter> {
        if index < params.len() {
            return params.get(index);
        }
        params.last().filter(|p| p.option == ArgOption::Variadic)
    }

    /// Validate an invocation against this schema.
    ///
    /// Checks input/output arity, attribute kinds, and every known element
    /// type against its constraint's allow-set. This runs before the
    /// inference rule; an unknown element type is not a violation.
    pub fn check_invocation(&self, invocation: &OperatorInvocation) -> Result<()> {
        let (min_in, max_in) = self.input_arity();
        let num_inputs = invocation.inputs.len();
        if num_inputs < min_in {
            return Err(self.violation(format!(
                "expected at least {} input(s), got {}",
                min_in, num_inputs
            )));
        }
        if let Some(max) = max_in {
            if num_inputs > max {
                return Err(self.violation(format!(
                    "expected at most {} input(s), got {}",
                    max, num_inputs
                )));
            }
        }

        let (min_out, max_out) = self.output_arity();
        let num_outputs = invocation.outputs.len();
        if num_outputs < min_out || max_out.is_some_and(|max| num_outputs > max) {
            return Err(self.violation(format!(
                "operator declares {} output(s), invocation has {}",
                match max_out {
                    Some(max) if max == min_out => min_out.to_string(),
                    Some(max) => format!("{}..{}", min_out, max),
                    None => format!("{}+", min_out),
                },
                num_outputs
            )));
        }

        for (name, value) in &invocation.attributes {
            match self.attributes.iter().find(|a| &a.name == name) {
                Some(spec) => {
                    if !spec.kind.matches(value) {
                        return Err(self.violation(format!(
                            "attribute `{}` must be a {}",
                            name,
                            spec.kind.name()
                        )));
                    }
                }
                None if self.allow_unchecked_attributes => {}
                None => {
                    return Err(self.violation(format!("unknown attribute `{}`", name)));
                }
            }
        }
        for spec in &self.attributes {
            if spec.required && !invocation.attributes.contains_key(&spec.name) {
                return Err(self.violation(format!("missing required attribute `{}`", spec.name)));
            }
        }

        for (index, info) in invocation.inputs.iter().enumerate() {
            self.check_elem_type(&self.inputs, "input", index, info.elem_type)?;
        }
        for (index, info) in invocation.outputs.iter().enumerate() {
            self.check_elem_type(&self.outputs, "output", index, info.elem_type)?;
        }

        Ok(())
    }

    fn check_elem_type(
        &self,
        params: &[FormalParameter],
        role: &str,
        index: usize,
        elem_type: Option<ElemType>,
    ) -> Result<()> {
        let Some(elem_type) = elem_type else {
            return Ok(());
        };
        let Some(param) = Self::param_at(params, index) else {
            return Ok(());
        };
        let Some(constraint) = self.constraint(&param.type_key) else {
            return Ok(());
        };
        if !constraint.allowed.contains(&elem_type) {
            return Err(self.violation(format!(
                "{} {} (`{}`) has element type {}, outside constraint `{}`",
                role, index, param.name, elem_type, constraint.key
            )));
        }
        Ok(())
    }

    fn violation(&self, reason: String) -> Error {
        Error::ConstraintViolation {
            op_type: self.name.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TensorTypeInfo;

    fn relu_like() -> OpSchema {
        OpSchema::new("ThresholdedRelu")
            .support_level(SupportLevel::Experimental)
            .attr("alpha", "Threshold value", AttrKind::Float)
            .input("X", "Input tensor", "T")
            .output("Y", "Output tensor", "T")
            .type_constraint("T", &ElemType::FLOATS, "float tensors only")
            .inference(InferenceRule::PropagateFromFirstInput)
    }

    #[test]
    fn test_builder_records_declarations() {
        let schema = relu_like();
        assert_eq!(schema.name(), "ThresholdedRelu");
        assert_eq!(schema.level(), SupportLevel::Experimental);
        assert_eq!(schema.inputs().len(), 1);
        assert_eq!(schema.outputs().len(), 1);
        assert_eq!(schema.attributes().len(), 1);
        assert_eq!(schema.constraint("T").unwrap().allowed, ElemType::FLOATS);
        assert!(schema.constraint("Tind").is_none());
    }

    #[test]
    fn test_arity_with_optional_and_variadic() {
        let schema = OpSchema::new("Slice")
            .input("data", "", "T")
            .input("starts", "", "Tind")
            .optional_input("axes", "", "Tind")
            .output("output", "", "T");
        assert_eq!(schema.input_arity(), (2, Some(3)));
        assert_eq!(schema.output_arity(), (1, Some(1)));

        let variadic = OpSchema::new("ATen")
            .variadic_input("input", "", "T")
            .variadic_output("output", "", "T");
        assert_eq!(variadic.input_arity(), (0, None));
        assert_eq!(variadic.output_arity(), (0, None));
    }

    #[test]
    fn test_check_accepts_valid_invocation() {
        let node = OperatorInvocation::new("ThresholdedRelu", 1)
            .with_input(TensorTypeInfo::fixed(ElemType::F32, &[2]))
            .with_attribute("alpha", AttributeValue::Float(1.0));
        relu_like().check_invocation(&node).unwrap();
    }

    #[test]
    fn test_check_rejects_constraint_violation() {
        let node = OperatorInvocation::new("ThresholdedRelu", 1)
            .with_input(TensorTypeInfo::fixed(ElemType::I32, &[2]));
        let err = relu_like().check_invocation(&node).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { .. }));
    }

    #[test]
    fn test_check_allows_unknown_elem_type() {
        // Absence of information is never an error
        let node = OperatorInvocation::new("ThresholdedRelu", 1)
            .with_input(TensorTypeInfo::unknown());
        relu_like().check_invocation(&node).unwrap();
    }

    #[test]
    fn test_check_rejects_bad_arity() {
        let too_many = OperatorInvocation::new("ThresholdedRelu", 1)
            .with_input(TensorTypeInfo::unknown())
            .with_input(TensorTypeInfo::unknown());
        assert!(relu_like().check_invocation(&too_many).is_err());

        let no_outputs = OperatorInvocation::new("ThresholdedRelu", 0)
            .with_input(TensorTypeInfo::unknown());
        assert!(relu_like().check_invocation(&no_outputs).is_err());
    }

    #[test]
    fn test_check_rejects_unknown_and_malformed_attributes() {
        let unknown = OperatorInvocation::new("ThresholdedRelu", 1)
            .with_input(TensorTypeInfo::unknown())
            .with_attribute("gamma", AttributeValue::Float(1.0));
        assert!(relu_like().check_invocation(&unknown).is_err());

        let malformed = OperatorInvocation::new("ThresholdedRelu", 1)
            .with_input(TensorTypeInfo::unknown())
            .with_attribute("alpha", AttributeValue::Ints(vec![1]));
        assert!(relu_like().check_invocation(&malformed).is_err());
    }

    #[test]
    fn test_unchecked_attributes_bypass_declaration() {
        let schema = OpSchema::new("ATen")
            .allow_unchecked_attributes()
            .variadic_input("input", "", "T")
            .variadic_output("output", "", "T")
            .type_constraint("T", &ElemType::ALL, "any tensor");

        let node = OperatorInvocation::new("ATen", 2)
            .with_input(TensorTypeInfo::fixed(ElemType::I64, &[3]))
            .with_attribute("operator", AttributeValue::Int(7));
        schema.check_invocation(&node).unwrap();
    }

    #[test]
    fn test_variadic_positions_share_constraint() {
        let schema = OpSchema::new("ATen")
            .variadic_input("input", "", "T")
            .variadic_output("output", "", "T")
            .type_constraint("T", &ElemType::FLOATS, "float tensors");

        let node = OperatorInvocation::new("ATen", 1)
            .with_input(TensorTypeInfo::with_elem_type(ElemType::F32))
            .with_input(TensorTypeInfo::with_elem_type(ElemType::Bool));
        // Second variadic position is still bound to "T"
        assert!(schema.check_invocation(&node).is_err());
    }
}
