use crate::error::{CodecError, Result};
use crate::loader::DefinitionRegistry;
use crate::meta::{MetaHeader, META_SIZE};
use crate::schema::{FieldDefinition, FieldKind, StructDefinition};
use crate::value::{PduInstance, Value};

/// Decode an encoded buffer into a PDU instance.
///
/// The meta header is read leniently: only `heap_off` is consumed, so a
/// zero-filled buffer of `META_SIZE + total_size` bytes decodes to an
/// all-default instance (this is how fresh PDUs are materialized).
pub fn decode(
    defs: &DefinitionRegistry,
    name: &str,
    type_key: &str,
    bytes: &[u8],
) -> Result<PduInstance> {
    let def = defs.load(type_key)?;
    let meta = MetaHeader::read(bytes)?;
    let mut dst = PduInstance::new(name, type_key, def.clone());
    decode_struct(defs, &mut dst, &def, META_SIZE, &meta, bytes)?;
    Ok(dst)
}

fn decode_struct(
    defs: &DefinitionRegistry,
    dst: &mut PduInstance,
    def: &StructDefinition,
    base_off: usize,
    meta: &MetaHeader,
    buf: &[u8],
) -> Result<()> {
    for field in def.fields() {
        let off = base_off + field.offset as usize;
        let elem = field.elem_size as usize;

        let value = match field.kind {
            FieldKind::Scalar => {
                if field.is_primitive {
                    read_primitive(buf, off, field)?
                } else {
                    Value::Struct(decode_child(defs, field, off, meta, buf)?)
                }
            }
            FieldKind::FixedArray => {
                let len = field.array_len.max(0) as usize;
                decode_elements(defs, field, off, elem, len, meta, buf)?
            }
            FieldKind::VariableArray => {
                let count = read_i32(buf, off)?;
                let rel = read_i32(buf, off + 4)?;
                if count < 0 || rel < 0 {
                    return Err(CodecError::InvalidDescriptor {
                        field: field.name.clone(),
                    });
                }
                if count == 0 {
                    // A zero count decodes to a true empty array; the wire
                    // carries no elements either way.
                    Value::Array(Vec::new())
                } else {
                    let start = meta.heap_off as usize + rel as usize;
                    decode_elements(defs, field, start, elem, count as usize, meta, buf)?
                }
            }
        };
        dst.insert(&field.name, value);
    }
    Ok(())
}

fn decode_elements(
    defs: &DefinitionRegistry,
    field: &FieldDefinition,
    start: usize,
    elem: usize,
    len: usize,
    meta: &MetaHeader,
    buf: &[u8],
) -> Result<Value> {
    let mut items = Vec::with_capacity(len);
    if field.is_primitive {
        for i in 0..len {
            items.push(read_primitive(buf, start + i * elem, field)?);
        }
    } else {
        for i in 0..len {
            items.push(Value::Struct(decode_child(
                defs,
                field,
                start + i * elem,
                meta,
                buf,
            )?));
        }
    }
    Ok(Value::Array(items))
}

fn decode_child(
    defs: &DefinitionRegistry,
    field: &FieldDefinition,
    off: usize,
    meta: &MetaHeader,
    buf: &[u8],
) -> Result<PduInstance> {
    let child_def = defs.load(&field.type_name)?;
    let mut child = PduInstance::new(field.name.clone(), field.type_name.clone(), child_def.clone());
    decode_struct(defs, &mut child, &child_def, off, meta, buf)?;
    Ok(child)
}

fn take(buf: &[u8], off: usize, n: usize) -> Result<&[u8]> {
    buf.get(off..off + n).ok_or(CodecError::ShortBuffer {
        needed: off + n,
        available: buf.len(),
    })
}

fn read_i32(buf: &[u8], off: usize) -> Result<i32> {
    Ok(i32::from_le_bytes(take(buf, off, 4)?.try_into().unwrap()))
}

fn read_primitive(buf: &[u8], off: usize, field: &FieldDefinition) -> Result<Value> {
    let value = match field.type_name.as_str() {
        "int8" => Value::Int8(take(buf, off, 1)?[0] as i8),
        "int16" => Value::Int16(i16::from_le_bytes(take(buf, off, 2)?.try_into().unwrap())),
        "int32" => Value::Int32(i32::from_le_bytes(take(buf, off, 4)?.try_into().unwrap())),
        "int64" => Value::Int64(i64::from_le_bytes(take(buf, off, 8)?.try_into().unwrap())),
        "uint8" => Value::UInt8(take(buf, off, 1)?[0]),
        "uint16" => Value::UInt16(u16::from_le_bytes(take(buf, off, 2)?.try_into().unwrap())),
        "uint32" => Value::UInt32(u32::from_le_bytes(take(buf, off, 4)?.try_into().unwrap())),
        "uint64" => Value::UInt64(u64::from_le_bytes(take(buf, off, 8)?.try_into().unwrap())),
        "float32" => Value::Float32(f32::from_le_bytes(take(buf, off, 4)?.try_into().unwrap())),
        "float64" => Value::Float64(f64::from_le_bytes(take(buf, off, 8)?.try_into().unwrap())),
        // 4-byte slot, value in the first byte.
        "bool" => Value::Bool(take(buf, off, 4)?[0] != 0),
        "string" => {
            let slot = take(buf, off, field.elem_size as usize)?;
            let end = slot
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| CodecError::MissingTerminator {
                    field: field.name.clone(),
                })?;
            let text =
                std::str::from_utf8(&slot[..end]).map_err(|_| CodecError::InvalidString {
                    field: field.name.clone(),
                })?;
            Value::String(text.to_string())
        }
        other => {
            return Err(CodecError::TypeMismatch {
                field: field.name.clone(),
                expected: "primitive".to_string(),
                actual: other.to_string(),
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::encode::encode;
    use crate::loader::FileLoader;

    struct MapLoader {
        texts: HashMap<String, String>,
    }

    impl FileLoader for MapLoader {
        fn load_text(&self, name: &str, _extension: &str) -> Result<String> {
            self.texts
                .get(name)
                .cloned()
                .ok_or_else(|| CodecError::DefinitionNotFound(name.to_string()))
        }
    }

    fn registry(entries: &[(&str, &str)]) -> DefinitionRegistry {
        DefinitionRegistry::new(Arc::new(MapLoader {
            texts: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }))
    }

    fn scan_registry() -> DefinitionRegistry {
        registry(&[
            (
                "sensor_msgs/Range",
                "single:primitive:range:float32:0:4\nsingle:primitive:valid:bool:4:4\n",
            ),
            (
                "sensor_msgs/Sweep",
                "single:primitive:seq:uint32:0:4\n\
                 single:primitive:frame:string:4:16\n\
                 varray:struct:returns:Range:20:8\n\
                 varray:primitive:intensities:float32:28:4\n\
                 array:primitive:covariance:float64:36:32:4\n",
            ),
        ])
    }

    fn range(defs: &DefinitionRegistry, value: f32, valid: bool) -> PduInstance {
        let def = defs.load("sensor_msgs/Range").unwrap();
        let mut pdu = PduInstance::new("returns", "sensor_msgs/Range", def);
        pdu.set("range", Value::Float32(value)).unwrap();
        pdu.set("valid", Value::Bool(valid)).unwrap();
        pdu
    }

    fn sweep(defs: &DefinitionRegistry, returns: usize, intensities: usize) -> PduInstance {
        let def = defs.load("sensor_msgs/Sweep").unwrap();
        let mut pdu = PduInstance::new("lidar_sweep", "sensor_msgs/Sweep", def);
        pdu.set("seq", Value::UInt32(42)).unwrap();
        pdu.set("frame", Value::String("base_link".to_string()))
            .unwrap();
        pdu.set(
            "returns",
            Value::Array(
                (0..returns)
                    .map(|i| Value::Struct(range(defs, i as f32 * 0.5, i % 2 == 0)))
                    .collect(),
            ),
        )
        .unwrap();
        pdu.set(
            "intensities",
            Value::Array((0..intensities).map(|i| Value::Float32(i as f32)).collect()),
        )
        .unwrap();
        pdu.set(
            "covariance",
            Value::Array((0..4).map(|i| Value::Float64(i as f64 * 1.25)).collect()),
        )
        .unwrap();
        pdu
    }

    #[test]
    fn roundtrip_with_nested_varray_structs() {
        let defs = scan_registry();
        let original = sweep(&defs, 5, 3);

        let bytes = encode(&defs, &original).unwrap();
        let decoded = decode(&defs, "lidar_sweep", "sensor_msgs/Sweep", &bytes).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn roundtrip_zero_length_varray_is_empty() {
        let defs = scan_registry();
        let original = sweep(&defs, 0, 0);

        let bytes = encode(&defs, &original).unwrap();
        let decoded = decode(&defs, "lidar_sweep", "sensor_msgs/Sweep", &bytes).unwrap();

        assert_eq!(decoded.get("returns").unwrap().as_array().unwrap().len(), 0);
        assert_eq!(
            decoded.get("intensities").unwrap().as_array().unwrap().len(),
            0
        );
        assert_eq!(decoded, original);
    }

    #[test]
    fn roundtrip_single_element_varray() {
        let defs = scan_registry();
        let original = sweep(&defs, 1, 1);

        let bytes = encode(&defs, &original).unwrap();
        let decoded = decode(&defs, "lidar_sweep", "sensor_msgs/Sweep", &bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn zero_filled_buffer_decodes_to_defaults() {
        let defs = scan_registry();
        let def = defs.load("sensor_msgs/Sweep").unwrap();
        let buf = vec![0u8; META_SIZE + def.total_size() as usize];

        let decoded = decode(&defs, "lidar_sweep", "sensor_msgs/Sweep", &buf).unwrap();

        assert_eq!(decoded.get("seq").unwrap(), &Value::UInt32(0));
        assert_eq!(decoded.get("frame").unwrap().as_str(), Some(""));
        assert_eq!(decoded.get("returns").unwrap().as_array().unwrap().len(), 0);
        assert_eq!(
            decoded.get("covariance").unwrap(),
            &Value::Array(vec![Value::Float64(0.0); 4])
        );
    }

    #[test]
    fn size_invariants_hold() {
        let defs = scan_registry();
        let def = defs.load("sensor_msgs/Sweep").unwrap();
        let original = sweep(&defs, 3, 2);

        let bytes = encode(&defs, &original).unwrap();
        let meta = MetaHeader::read(&bytes).unwrap();

        let heap_len = bytes.len() - META_SIZE - def.total_size() as usize;
        assert_eq!(meta.heap_off as usize, META_SIZE + def.total_size() as usize);
        assert_eq!(
            meta.total_size as usize,
            META_SIZE + def.total_size() as usize + heap_len
        );
        assert_eq!(meta.total_size as usize, bytes.len());
        // 3 Range elements of 8 bytes + 2 float32 intensities
        assert_eq!(heap_len, 3 * 8 + 2 * 4);
    }

    #[test]
    fn missing_string_terminator_is_an_error() {
        let defs = registry(&[("demo_msgs/Tag", "single:primitive:label:string:0:4\n")]);
        let def = defs.load("demo_msgs/Tag").unwrap();
        let mut buf = vec![0u8; META_SIZE + def.total_size() as usize];
        buf[24..28].copy_from_slice(b"full");

        let err = decode(&defs, "tag", "demo_msgs/Tag", &buf).unwrap_err();
        assert!(matches!(err, CodecError::MissingTerminator { .. }));
    }

    #[test]
    fn truncated_buffer_is_an_error_not_a_panic() {
        let defs = scan_registry();
        let original = sweep(&defs, 2, 2);
        let bytes = encode(&defs, &original).unwrap();

        let err = decode(&defs, "lidar_sweep", "sensor_msgs/Sweep", &bytes[..40]).unwrap_err();
        assert!(matches!(err, CodecError::ShortBuffer { .. }));
    }

    #[test]
    fn negative_descriptor_is_rejected() {
        let defs = registry(&[("demo_msgs/Blob", "varray:primitive:data:uint8:0:1\n")]);
        let def = defs.load("demo_msgs/Blob").unwrap();
        let mut buf = vec![0u8; META_SIZE + def.total_size() as usize];
        buf[24..28].copy_from_slice(&(-1i32).to_le_bytes());

        let err = decode(&defs, "blob", "demo_msgs/Blob", &buf).unwrap_err();
        assert!(matches!(err, CodecError::InvalidDescriptor { .. }));
    }

    #[test]
    fn heap_descriptor_past_buffer_end_is_an_error() {
        let defs = registry(&[("demo_msgs/Blob", "varray:primitive:data:uint32:0:4\n")]);
        let def = defs.load("demo_msgs/Blob").unwrap();
        let mut buf = vec![0u8; META_SIZE + def.total_size() as usize];
        // claim 4 elements with an in-range offset, but no heap bytes exist
        let mut header = MetaHeader::new(def.total_size());
        header.total_size = buf.len() as u32;
        header.write(&mut buf).unwrap();
        buf[24..28].copy_from_slice(&4i32.to_le_bytes());

        let err = decode(&defs, "blob", "demo_msgs/Blob", &buf).unwrap_err();
        assert!(matches!(err, CodecError::ShortBuffer { .. }));
    }
}
