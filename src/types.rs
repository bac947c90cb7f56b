//! Core data model: element types, dimensions, tensor metadata, attributes.
//!
//! All knowledge in this model is partial by design. A [`TensorTypeInfo`] may
//! know its element type but not its shape (or vice versa), and a shape may
//! mix concrete and symbolic dimensions. Consumers must treat unset fields as
//! "unknown", never as zero or wildcard.

/// Scalar element type of a tensor's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemType {
    Bool,
    I32,
    I64,
    F16,
    F32,
    F64,
}

impl ElemType {
    /// Every element type the data model supports.
    pub const ALL: [ElemType; 6] = [
        ElemType::Bool,
        ElemType::I32,
        ElemType::I64,
        ElemType::F16,
        ElemType::F32,
        ElemType::F64,
    ];

    /// The floating-point subset (the common constraint for math operators).
    pub const FLOATS: [ElemType; 3] = [ElemType::F16, ElemType::F32, ElemType::F64];

    /// Lowercase name used in constraint docs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ElemType::Bool => "bool",
            ElemType::I32 => "int32",
            ElemType::I64 => "int64",
            ElemType::F16 => "float16",
            ElemType::F32 => "float32",
            ElemType::F64 => "float64",
        }
    }
}

impl std::fmt::Display for ElemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single dimension in a tensor shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Known non-negative extent.
    Fixed(usize),

    /// Symbolic dimension (e.g., "batch", "sequence"). The actual value is
    /// only known at execution time.
    Symbolic(String),
}

impl Dimension {
    /// Check if this dimension has a concrete extent.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Dimension::Fixed(_))
    }

    /// Get the concrete extent if available.
    pub fn as_fixed(&self) -> Option<usize> {
        match self {
            Dimension::Fixed(n) => Some(*n),
            Dimension::Symbolic(_) => None,
        }
    }
}

/// Statically known type and shape of a tensor.
///
/// Either field (or both) may be absent, representing partial knowledge.
/// Shape inference fills these in where the operator semantics allow it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TensorTypeInfo {
    /// Element type, if known.
    pub elem_type: Option<ElemType>,

    /// Ordered dimensions, if known.
    pub shape: Option<Vec<Dimension>>,
}

impl TensorTypeInfo {
    /// A tensor about which nothing is known yet.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// A tensor with known element type and shape.
    pub fn new(elem_type: ElemType, shape: Vec<Dimension>) -> Self {
        Self {
            elem_type: Some(elem_type),
            shape: Some(shape),
        }
    }

    /// A tensor with known element type and fully concrete dimensions.
    pub fn fixed(elem_type: ElemType, dims: &[usize]) -> Self {
        Self::new(elem_type, dims.iter().map(|&d| Dimension::Fixed(d)).collect())
    }

    /// A tensor with known element type but unknown shape.
    pub fn with_elem_type(elem_type: ElemType) -> Self {
        Self {
            elem_type: Some(elem_type),
            shape: None,
        }
    }

    /// Number of dimensions, if the shape is known.
    pub fn ndim(&self) -> Option<usize> {
        self.shape.as_ref().map(|dims| dims.len())
    }

    /// Check whether both element type and shape are unset.
    pub fn is_unknown(&self) -> bool {
        self.elem_type.is_none() && self.shape.is_none()
    }
}

/// Attribute value types.
///
/// Attributes are statically bound parameters on an operator instance,
/// distinct from runtime inputs. An absent attribute is simply not present in
/// the invocation's attribute map.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    /// Raw tensor literal (opaque to the inference engine).
    Tensor(Vec<u8>),
}

impl TryFrom<AttributeValue> for f32 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Float(v) => Ok(v),
            _ => Err("Not a float".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for i64 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Int(v) => Ok(v),
            _ => Err("Not an int".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<i64> {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Ints(v) => Ok(v),
            _ => Err("Not an int array".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<f32> {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Floats(v) => Ok(v),
            _ => Err("Not a float array".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_type_info_constructors() {
        let full = TensorTypeInfo::fixed(ElemType::F32, &[2, 3]);
        assert_eq!(full.elem_type, Some(ElemType::F32));
        assert_eq!(full.ndim(), Some(2));
        assert!(!full.is_unknown());

        let typed = TensorTypeInfo::with_elem_type(ElemType::I64);
        assert_eq!(typed.elem_type, Some(ElemType::I64));
        assert_eq!(typed.shape, None);
        assert_eq!(typed.ndim(), None);

        assert!(TensorTypeInfo::unknown().is_unknown());
    }

    #[test]
    fn test_dimension_accessors() {
        assert_eq!(Dimension::Fixed(4).as_fixed(), Some(4));
        assert!(Dimension::Fixed(4).is_fixed());

        let symbolic = Dimension::Symbolic("batch".to_string());
        assert_eq!(symbolic.as_fixed(), None);
        assert!(!symbolic.is_fixed());
    }

    #[test]
    fn test_attribute_conversions() {
        let alpha: f32 = AttributeValue::Float(1.5).try_into().unwrap();
        assert_eq!(alpha, 1.5);

        let axes: Vec<i64> = AttributeValue::Ints(vec![0, 2]).try_into().unwrap();
        assert_eq!(axes, vec![0, 2]);

        let wrong: Result<i64, _> = AttributeValue::Float(1.0).try_into();
        assert!(wrong.is_err());
    }

    #[test]
    fn test_elem_type_names() {
        assert_eq!(ElemType::F32.name(), "float32");
        assert_eq!(ElemType::Bool.to_string(), "bool");
        assert_eq!(ElemType::ALL.len(), 6);
        assert!(ElemType::FLOATS.contains(&ElemType::F16));
    }
}
