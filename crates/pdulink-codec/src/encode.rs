use crate::error::{CodecError, Result};
use crate::loader::DefinitionRegistry;
use crate::meta::{MetaHeader, META_SIZE};
use crate::schema::{FieldDefinition, FieldKind, StructDefinition};
use crate::value::{PduInstance, Value};

/// Growable byte region with zero-filled random-offset writes.
///
/// The base region is pre-sized to the schema's total size; the heap region
/// starts empty and grows as variable-length elements are appended.
struct Region {
    buf: Vec<u8>,
}

impl Region {
    fn zeroed(size: usize) -> Self {
        Self {
            buf: vec![0; size],
        }
    }

    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn grow_to(&mut self, end: usize) {
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
    }

    /// Append `n` zero bytes, returning the offset they start at.
    fn reserve_zeroed(&mut self, n: usize) -> usize {
        let off = self.buf.len();
        self.buf.resize(off + n, 0);
        off
    }

    fn write_at(&mut self, off: usize, bytes: &[u8]) {
        self.grow_to(off + bytes.len());
        self.buf[off..off + bytes.len()].copy_from_slice(bytes);
    }

    fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Which region the current traversal writes into. Struct elements of a
/// variable-length array are laid out inside the heap region; everything
/// else lands in the base region.
#[derive(Debug, Clone, Copy)]
enum Target {
    Base,
    Heap,
}

fn select<'a>(target: Target, base: &'a mut Region, heap: &'a mut Region) -> &'a mut Region {
    match target {
        Target::Base => base,
        Target::Heap => heap,
    }
}

/// Encode a PDU instance into meta header ‖ base region ‖ heap region.
pub fn encode(defs: &DefinitionRegistry, pdu: &PduInstance) -> Result<Vec<u8>> {
    let def = defs.load(pdu.type_key())?;
    let mut base = Region::zeroed(def.total_size() as usize);
    let mut heap = Region::new();

    encode_struct(defs, pdu, &def, 0, Target::Base, &mut base, &mut heap)?;

    let mut header = MetaHeader::new(def.total_size());
    let total = META_SIZE + base.len() + heap.len();
    header.total_size = total as u32;

    let mut out = vec![0u8; total];
    header.write(&mut out)?;
    out[META_SIZE..META_SIZE + base.len()].copy_from_slice(base.as_slice());
    out[META_SIZE + base.len()..].copy_from_slice(heap.as_slice());
    Ok(out)
}

fn encode_struct(
    defs: &DefinitionRegistry,
    pdu: &PduInstance,
    def: &StructDefinition,
    parent_off: usize,
    target: Target,
    base: &mut Region,
    heap: &mut Region,
) -> Result<()> {
    for field in def.fields() {
        let value = pdu.get(&field.name).ok_or_else(|| CodecError::MissingValue {
            field: field.name.clone(),
        })?;
        let off = parent_off + field.offset as usize;
        let elem = field.elem_size as usize;

        match field.kind {
            FieldKind::Scalar => {
                if field.is_primitive {
                    write_primitive(select(target, base, heap), off, field, value)?;
                } else {
                    let child = expect_struct(field, value)?;
                    let child_def = defs.load(&field.type_name)?;
                    encode_struct(defs, child, &child_def, off, target, base, heap)?;
                }
            }
            FieldKind::FixedArray => {
                let items = expect_array(field, value)?;
                let expected = field.array_len.max(0) as usize;
                if items.len() != expected {
                    return Err(CodecError::LengthMismatch {
                        field: field.name.clone(),
                        expected,
                        actual: items.len(),
                    });
                }
                if field.is_primitive {
                    let region = select(target, base, heap);
                    for (i, item) in items.iter().enumerate() {
                        write_primitive(region, off + i * elem, field, item)?;
                    }
                } else {
                    let child_def = defs.load(&field.type_name)?;
                    for (i, item) in items.iter().enumerate() {
                        let child = expect_struct(field, item)?;
                        encode_struct(defs, child, &child_def, off + i * elem, target, base, heap)?;
                    }
                }
            }
            FieldKind::VariableArray => {
                let items = expect_array(field, value)?;
                // Heap-relative offset is fixed before any element (or any
                // nested variable array) grows the heap further.
                let rel = heap.len();
                heap.reserve_zeroed(items.len() * elem);
                if field.is_primitive {
                    for (i, item) in items.iter().enumerate() {
                        write_primitive(heap, rel + i * elem, field, item)?;
                    }
                } else {
                    let child_def = defs.load(&field.type_name)?;
                    for (i, item) in items.iter().enumerate() {
                        let child = expect_struct(field, item)?;
                        encode_struct(
                            defs,
                            child,
                            &child_def,
                            rel + i * elem,
                            Target::Heap,
                            base,
                            heap,
                        )?;
                    }
                }
                let region = select(target, base, heap);
                region.write_at(off, &(items.len() as i32).to_le_bytes());
                region.write_at(off + 4, &(rel as i32).to_le_bytes());
            }
        }
    }
    Ok(())
}

fn write_primitive(region: &mut Region, off: usize, field: &FieldDefinition, value: &Value) -> Result<()> {
    match (field.type_name.as_str(), value) {
        ("int8", Value::Int8(v)) => region.write_at(off, &v.to_le_bytes()),
        ("int16", Value::Int16(v)) => region.write_at(off, &v.to_le_bytes()),
        ("int32", Value::Int32(v)) => region.write_at(off, &v.to_le_bytes()),
        ("int64", Value::Int64(v)) => region.write_at(off, &v.to_le_bytes()),
        ("uint8", Value::UInt8(v)) => region.write_at(off, &v.to_le_bytes()),
        ("uint16", Value::UInt16(v)) => region.write_at(off, &v.to_le_bytes()),
        ("uint32", Value::UInt32(v)) => region.write_at(off, &v.to_le_bytes()),
        ("uint64", Value::UInt64(v)) => region.write_at(off, &v.to_le_bytes()),
        ("float32", Value::Float32(v)) => region.write_at(off, &v.to_le_bytes()),
        ("float64", Value::Float64(v)) => region.write_at(off, &v.to_le_bytes()),
        // 4-byte slot, value in the first byte.
        ("bool", Value::Bool(v)) => region.write_at(off, &[u8::from(*v), 0, 0, 0]),
        ("string", Value::String(s)) => {
            let slot = field.elem_size as usize;
            // Truncate to slot - 1 bytes at a character boundary; the
            // remainder of the zeroed slot is the null terminator.
            let mut cut = slot.saturating_sub(1).min(s.len());
            while cut > 0 && !s.is_char_boundary(cut) {
                cut -= 1;
            }
            region.grow_to(off + slot);
            region.write_at(off, &s.as_bytes()[..cut]);
        }
        (expected, actual) => {
            return Err(CodecError::TypeMismatch {
                field: field.name.clone(),
                expected: expected.to_string(),
                actual: actual.type_label().to_string(),
            })
        }
    }
    Ok(())
}

fn expect_array<'v>(field: &FieldDefinition, value: &'v Value) -> Result<&'v [Value]> {
    value.as_array().ok_or_else(|| CodecError::TypeMismatch {
        field: field.name.clone(),
        expected: "array".to_string(),
        actual: value.type_label().to_string(),
    })
}

fn expect_struct<'v>(field: &FieldDefinition, value: &'v Value) -> Result<&'v PduInstance> {
    value.as_struct().ok_or_else(|| CodecError::TypeMismatch {
        field: field.name.clone(),
        expected: field.type_name.clone(),
        actual: value.type_label().to_string(),
    })
}
