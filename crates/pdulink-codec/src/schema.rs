use std::collections::HashMap;

/// Base-region footprint of a variable-length array: `[count: i32][heap offset: i32]`.
pub const VARRAY_DESCRIPTOR_SIZE: u32 = 8;

/// Primitive type keywords understood by the codec.
pub const PRIMITIVE_TYPES: [&str; 12] = [
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float32", "float64",
    "bool", "string",
];

/// Returns true if `type_name` is a primitive keyword rather than a nested type.
pub fn is_primitive(type_name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&type_name)
}

/// How a field occupies the base region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// One value at the declared offset.
    Scalar,
    /// `array_len` contiguous elements at the declared offset.
    FixedArray,
    /// An 8-byte descriptor at the declared offset; elements in the heap region.
    VariableArray,
}

/// One field of a PDU structure definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Member name.
    pub name: String,
    pub kind: FieldKind,
    /// True when `type_name` is a primitive keyword, false for nested structs.
    pub is_primitive: bool,
    /// Primitive keyword or fully qualified `"package/Type"` reference.
    pub type_name: String,
    /// Byte offset within the owning structure's base region.
    pub offset: u32,
    /// Size of one element (for scalars, the whole slot).
    pub elem_size: u32,
    /// Declared element count for `FixedArray`, -1 otherwise.
    pub array_len: i32,
}

impl FieldDefinition {
    /// Bytes this field occupies in the base region.
    pub fn footprint(&self) -> u32 {
        match self.kind {
            FieldKind::Scalar => self.elem_size,
            FieldKind::FixedArray => self.elem_size * self.array_len.max(0) as u32,
            FieldKind::VariableArray => VARRAY_DESCRIPTOR_SIZE,
        }
    }
}

/// An immutable PDU structure definition: fields in declaration order plus
/// the size of the fixed (base) region. Variable-length data is not counted
/// in `total_size` — it lives in the heap region.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDefinition {
    fields: Vec<FieldDefinition>,
    index: HashMap<String, usize>,
    total_size: u32,
}

impl StructDefinition {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        let total_size = fields
            .iter()
            .map(|f| f.offset + f.footprint())
            .max()
            .unwrap_or(0);
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            fields,
            index,
            total_size,
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Look up a field by member name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Size of the base region in bytes.
    pub fn total_size(&self) -> u32 {
        self.total_size
    }
}
