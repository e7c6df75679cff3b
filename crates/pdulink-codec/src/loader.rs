use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{CodecError, Result};
use crate::schema::{is_primitive, FieldDefinition, FieldKind, StructDefinition};

/// File extension of PDU definition files.
pub const DEFINITION_EXTENSION: &str = ".offset";

/// Source of definition and configuration text.
///
/// `name` is a loader-relative resource name (possibly containing `/`,
/// e.g. `"geometry_msgs/Twist"`); `extension` is appended verbatim.
pub trait FileLoader: Send + Sync {
    fn load_text(&self, name: &str, extension: &str) -> Result<String>;
}

/// Filesystem-backed loader rooted at a directory.
pub struct FsFileLoader {
    root: PathBuf,
}

impl FsFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl FileLoader for FsFileLoader {
    fn load_text(&self, name: &str, extension: &str) -> Result<String> {
        let path = self.root.join(format!("{name}{extension}"));
        std::fs::read_to_string(&path).map_err(CodecError::Io)
    }
}

/// Memoized registry of structure definitions, keyed by `"package/Type"`.
///
/// Owned by the orchestrator and shared with the encoder/decoder; cached
/// definitions live as long as the registry.
pub struct DefinitionRegistry {
    loader: Arc<dyn FileLoader>,
    cache: Mutex<HashMap<String, Arc<StructDefinition>>>,
}

impl DefinitionRegistry {
    pub fn new(loader: Arc<dyn FileLoader>) -> Self {
        Self {
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load (or fetch from cache) the definition for `type_key`.
    ///
    /// Nothing is cached for a key whose definition text fails to parse.
    pub fn load(&self, type_key: &str) -> Result<Arc<StructDefinition>> {
        if let Some(def) = self.cache.lock().unwrap().get(type_key) {
            return Ok(def.clone());
        }

        let text = self
            .loader
            .load_text(type_key, DEFINITION_EXTENSION)
            .map_err(|_| CodecError::DefinitionNotFound(type_key.to_string()))?;
        if text.trim().is_empty() {
            return Err(CodecError::DefinitionNotFound(type_key.to_string()));
        }

        let definition = Arc::new(parse_definition(type_key, &text)?);
        debug!(
            type_key,
            fields = definition.fields().len(),
            total_size = definition.total_size(),
            "loaded pdu definition"
        );
        self.cache
            .lock()
            .unwrap()
            .insert(type_key.to_string(), definition.clone());
        Ok(definition)
    }
}

/// Parse offset-table text: one field per line,
/// `kind:primitiveFlag:memberName:dataType:byteOffset:byteSize[:arrayLength]`.
fn parse_definition(type_key: &str, text: &str) -> Result<StructDefinition> {
    let package = type_key.split('/').next().unwrap_or(type_key);
    let mut fields = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        fields.push(parse_line(type_key, package, line)?);
    }

    Ok(StructDefinition::new(fields))
}

fn parse_line(type_key: &str, package: &str, line: &str) -> Result<FieldDefinition> {
    let format_err = || CodecError::Format {
        type_key: type_key.to_string(),
        line: line.to_string(),
    };

    let tokens: Vec<&str> = line.split(':').collect();
    if tokens.len() < 6 {
        return Err(format_err());
    }

    let kind = match tokens[0] {
        "single" => FieldKind::Scalar,
        "array" => FieldKind::FixedArray,
        "varray" => FieldKind::VariableArray,
        _ => return Err(format_err()),
    };
    let primitive = tokens[1] == "primitive";
    let name = tokens[2].to_string();
    let type_name = qualify(tokens[3], package);
    let offset: u32 = tokens[4].parse().map_err(|_| format_err())?;
    let byte_size: u32 = tokens[5].parse().map_err(|_| format_err())?;

    let (elem_size, array_len) = match kind {
        FieldKind::Scalar => (byte_size, -1),
        FieldKind::FixedArray => {
            // Declared size is the whole array; the 7th token is the length.
            let len: u32 = tokens.get(6).ok_or_else(format_err)?.parse().map_err(|_| format_err())?;
            if len == 0 {
                return Err(format_err());
            }
            (byte_size / len, len as i32)
        }
        // Declared size is the element size; a trailing token from legacy
        // emitters is accepted and ignored.
        FieldKind::VariableArray => (byte_size, -1),
    };

    Ok(FieldDefinition {
        name,
        kind,
        is_primitive: primitive,
        type_name,
        offset,
        elem_size,
        array_len,
    })
}

/// Qualify a bare type name with the owning package, unless it is already
/// qualified or a primitive keyword.
fn qualify(type_name: &str, package: &str) -> String {
    if type_name.contains('/') || is_primitive(type_name) {
        type_name.to_string()
    } else {
        format!("{package}/{type_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapLoader {
        texts: HashMap<String, String>,
    }

    impl MapLoader {
        fn new(entries: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                texts: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
        }
    }

    impl FileLoader for MapLoader {
        fn load_text(&self, name: &str, _extension: &str) -> Result<String> {
            self.texts
                .get(name)
                .cloned()
                .ok_or_else(|| CodecError::DefinitionNotFound(name.to_string()))
        }
    }

    const VECTOR3: &str = "\
single:primitive:x:float64:0:8
single:primitive:y:float64:8:8
single:primitive:z:float64:16:8
";

    #[test]
    fn parses_scalar_fields() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "geometry_msgs/Vector3",
            VECTOR3,
        )]));
        let def = registry.load("geometry_msgs/Vector3").unwrap();

        assert_eq!(def.total_size(), 24);
        let y = def.field("y").unwrap();
        assert_eq!(y.kind, FieldKind::Scalar);
        assert!(y.is_primitive);
        assert_eq!(y.offset, 8);
        assert_eq!(y.elem_size, 8);
    }

    #[test]
    fn qualifies_bare_struct_types_with_package() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "geometry_msgs/Twist",
            "single:struct:linear:Vector3:0:24\nsingle:struct:angular:Vector3:24:24\n",
        )]));
        let def = registry.load("geometry_msgs/Twist").unwrap();

        let linear = def.field("linear").unwrap();
        assert!(!linear.is_primitive);
        assert_eq!(linear.type_name, "geometry_msgs/Vector3");
        assert_eq!(def.total_size(), 48);
    }

    #[test]
    fn already_qualified_and_primitive_types_untouched() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "demo_msgs/Mixed",
            "single:struct:header:std_msgs/Header:0:16\nsingle:primitive:seq:uint32:16:4\n",
        )]));
        let def = registry.load("demo_msgs/Mixed").unwrap();

        assert_eq!(def.field("header").unwrap().type_name, "std_msgs/Header");
        assert_eq!(def.field("seq").unwrap().type_name, "uint32");
    }

    #[test]
    fn fixed_array_divides_total_size_by_length() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "demo_msgs/Block",
            "array:primitive:samples:float32:0:64:16\n",
        )]));
        let def = registry.load("demo_msgs/Block").unwrap();

        let samples = def.field("samples").unwrap();
        assert_eq!(samples.kind, FieldKind::FixedArray);
        assert_eq!(samples.elem_size, 4);
        assert_eq!(samples.array_len, 16);
        assert_eq!(def.total_size(), 64);
    }

    #[test]
    fn varray_keeps_element_size_and_ignores_trailing_token() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "demo_msgs/Scan",
            "varray:primitive:ranges:float32:4:4:8\nsingle:primitive:count:int32:0:4\n",
        )]));
        let def = registry.load("demo_msgs/Scan").unwrap();

        let ranges = def.field("ranges").unwrap();
        assert_eq!(ranges.kind, FieldKind::VariableArray);
        assert_eq!(ranges.elem_size, 4);
        assert_eq!(ranges.array_len, -1);
        // descriptor occupies 8 bytes at offset 4
        assert_eq!(def.total_size(), 12);
    }

    #[test]
    fn malformed_line_fails_and_caches_nothing() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "demo_msgs/Bad",
            "single:primitive:x:float64:0\n",
        )]));

        let err = registry.load("demo_msgs/Bad").unwrap_err();
        assert!(matches!(err, CodecError::Format { .. }));
        // still fails on retry: the malformed parse was not cached
        assert!(registry.load("demo_msgs/Bad").is_err());
    }

    #[test]
    fn unknown_kind_is_a_format_error() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "demo_msgs/Bad",
            "matrix:primitive:m:float64:0:8\n",
        )]));
        assert!(matches!(
            registry.load("demo_msgs/Bad").unwrap_err(),
            CodecError::Format { .. }
        ));
    }

    #[test]
    fn missing_definition_reports_type_key() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[]));
        let err = registry.load("nowhere/Nothing").unwrap_err();
        assert!(matches!(err, CodecError::DefinitionNotFound(key) if key == "nowhere/Nothing"));
    }

    #[test]
    fn memoizes_by_type_key() {
        let registry = DefinitionRegistry::new(MapLoader::new(&[(
            "geometry_msgs/Vector3",
            VECTOR3,
        )]));
        let first = registry.load("geometry_msgs/Vector3").unwrap();
        let second = registry.load("geometry_msgs/Vector3").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn fs_loader_reads_nested_paths() {
        let dir = std::env::temp_dir().join(format!(
            "pdulink-codec-fsloader-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(dir.join("geometry_msgs")).unwrap();
        std::fs::write(dir.join("geometry_msgs/Vector3.offset"), VECTOR3).unwrap();

        let loader = FsFileLoader::new(&dir);
        let text = loader
            .load_text("geometry_msgs/Vector3", DEFINITION_EXTENSION)
            .unwrap();
        assert_eq!(text, VECTOR3);
        assert!(loader.load_text("geometry_msgs/Missing", ".offset").is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
