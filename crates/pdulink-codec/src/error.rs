/// Errors that can occur while loading schemas or encoding/decoding PDUs.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A definition line does not follow the offset-table grammar.
    #[error("malformed definition line for {type_key}: {line:?}")]
    Format { type_key: String, line: String },

    /// No definition text could be loaded for the given type key.
    #[error("definition not found for {0}")]
    DefinitionNotFound(String),

    /// A field name does not exist in the schema.
    #[error("field '{field}' not found in {type_key}")]
    FieldNotFound { type_key: String, field: String },

    /// A value's type does not match the schema's declared field type.
    #[error("field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// A field has no value to encode.
    #[error("field '{field}' has no value")]
    MissingValue { field: String },

    /// A fixed-length array value does not match the schema's length.
    #[error("fixed array '{field}' expects {expected} elements, got {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// The buffer is too short for a declared field or header.
    #[error("buffer too short (need {needed} bytes, have {available})")]
    ShortBuffer { needed: usize, available: usize },

    /// A variable-array descriptor carries a negative count or offset.
    #[error("corrupt array descriptor for field '{field}'")]
    InvalidDescriptor { field: String },

    /// A string slot has no null terminator within its bounds.
    #[error("string field '{field}' is missing its null terminator")]
    MissingTerminator { field: String },

    /// A string slot holds bytes that are not valid UTF-8.
    #[error("string field '{field}' is not valid UTF-8")]
    InvalidString { field: String },

    /// An I/O error occurred while loading a definition file.
    #[error("definition load failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
