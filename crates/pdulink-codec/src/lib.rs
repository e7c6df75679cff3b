//! Schema-driven binary PDU codec.
//!
//! A PDU (Protocol Data Unit) is a named, schema-typed structure exchanged
//! between robot/simulation processes. Schemas are loaded at runtime from
//! offset-table text files; encoded buffers are laid out as:
//!
//! ```text
//! ┌──────────────┬─────────────────────┬──────────────────────┐
//! │ Meta (24B)   │ Base region          │ Heap region          │
//! │ magic, offs  │ fixed layout per     │ variable-length      │
//! │              │ schema offsets       │ array elements       │
//! └──────────────┴─────────────────────┴──────────────────────┘
//! ```
//!
//! Variable-length arrays occupy an 8-byte `[count][heap offset]` descriptor
//! in the base region; their elements live in the heap region.

pub mod decode;
pub mod encode;
pub mod error;
pub mod loader;
pub mod meta;
pub mod schema;
pub mod value;

pub use decode::decode;
pub use encode::encode;
pub use error::{CodecError, Result};
pub use loader::{DefinitionRegistry, FileLoader, FsFileLoader, DEFINITION_EXTENSION};
pub use meta::{MetaHeader, META_MAGIC, META_SIZE, META_VERSION};
pub use schema::{is_primitive, FieldDefinition, FieldKind, StructDefinition, VARRAY_DESCRIPTOR_SIZE};
pub use value::{PduInstance, Value};
