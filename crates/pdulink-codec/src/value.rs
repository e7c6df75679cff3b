use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CodecError, Result};
use crate::schema::{FieldDefinition, FieldKind, StructDefinition};

/// A runtime PDU field value.
///
/// Values are validated against the schema when stored, not on every
/// access.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    String(String),
    /// A nested structure instance.
    Struct(PduInstance),
    /// Elements of a fixed or variable-length array.
    Array(Vec<Value>),
}

impl Value {
    /// Default value for a primitive type keyword.
    pub fn default_for(type_name: &str) -> Option<Value> {
        let value = match type_name {
            "int8" => Value::Int8(0),
            "int16" => Value::Int16(0),
            "int32" => Value::Int32(0),
            "int64" => Value::Int64(0),
            "uint8" => Value::UInt8(0),
            "uint16" => Value::UInt16(0),
            "uint32" => Value::UInt32(0),
            "uint64" => Value::UInt64(0),
            "float32" => Value::Float32(0.0),
            "float64" => Value::Float64(0.0),
            "bool" => Value::Bool(false),
            "string" => Value::String(String::new()),
            _ => return None,
        };
        Some(value)
    }

    /// Name of this value's variant, for error messages.
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
        }
    }

    /// True if this value is acceptable for a primitive field of `type_name`.
    fn matches_primitive(&self, type_name: &str) -> bool {
        self.type_label() == type_name
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::UInt8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&PduInstance> {
        match self {
            Value::Struct(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut PduInstance> {
        match self {
            Value::Struct(inner) => Some(inner),
            _ => None,
        }
    }
}

/// One named, schema-typed PDU instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PduInstance {
    name: String,
    type_key: String,
    definition: Arc<StructDefinition>,
    values: HashMap<String, Value>,
}

impl PduInstance {
    pub fn new(
        name: impl Into<String>,
        type_key: impl Into<String>,
        definition: Arc<StructDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            type_key: type_key.into(),
            definition,
            values: HashMap::new(),
        }
    }

    /// The PDU's logical name (e.g. the channel-configured name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `"package/Type"` key of this instance's schema.
    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn definition(&self) -> &Arc<StructDefinition> {
        &self.definition
    }

    /// Current value of a field, if one has been stored.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Store a field value after validating it against the schema.
    pub fn set(&mut self, field: &str, value: Value) -> Result<()> {
        let def = self
            .definition
            .field(field)
            .ok_or_else(|| CodecError::FieldNotFound {
                type_key: self.type_key.clone(),
                field: field.to_string(),
            })?;
        check_value(def, &value)?;
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Mutable access to a nested struct field.
    pub fn struct_mut(&mut self, field: &str) -> Result<&mut PduInstance> {
        let type_key = self.type_key.clone();
        self.values
            .get_mut(field)
            .and_then(Value::as_struct_mut)
            .ok_or(CodecError::FieldNotFound {
                type_key,
                field: field.to_string(),
            })
    }

    /// Store a decoded value without re-validating; the decoder only
    /// produces schema-consistent values.
    pub(crate) fn insert(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }
}

fn check_value(def: &FieldDefinition, value: &Value) -> Result<()> {
    match def.kind {
        FieldKind::Scalar => check_element(def, value),
        FieldKind::FixedArray | FieldKind::VariableArray => match value {
            Value::Array(items) => {
                for item in items {
                    check_element(def, item)?;
                }
                Ok(())
            }
            other => Err(mismatch(def, "array", other)),
        },
    }
}

fn check_element(def: &FieldDefinition, value: &Value) -> Result<()> {
    if def.is_primitive {
        if value.matches_primitive(&def.type_name) {
            Ok(())
        } else {
            Err(mismatch(def, &def.type_name, value))
        }
    } else {
        match value {
            Value::Struct(inner) if inner.type_key == def.type_name => Ok(()),
            other => Err(mismatch(def, &def.type_name, other)),
        }
    }
}

fn mismatch(def: &FieldDefinition, expected: &str, actual: &Value) -> CodecError {
    CodecError::TypeMismatch {
        field: def.name.clone(),
        expected: expected.to_string(),
        actual: actual.type_label().to_string(),
    }
}
