use std::sync::Arc;

use pdulink_codec::{DefinitionRegistry, FieldKind, FsFileLoader};

use crate::cmd::SchemaArgs;
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let loader = Arc::new(FsFileLoader::new(&args.root));
    let registry = DefinitionRegistry::new(loader);
    let definition = registry
        .load(&args.type_key)
        .map_err(|err| codec_error("schema load failed", err))?;

    match format {
        OutputFormat::Json => {
            let fields: Vec<serde_json::Value> = definition
                .fields()
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name.clone(),
                        "kind": kind_name(f.kind),
                        "type": f.type_name.clone(),
                        "offset": f.offset,
                        "elem_size": f.elem_size,
                        "array_len": (f.array_len >= 0).then_some(f.array_len),
                    })
                })
                .collect();
            print_json(&serde_json::json!({
                "type_key": args.type_key,
                "total_size": definition.total_size(),
                "fields": fields,
            }));
        }
        OutputFormat::Table => {
            let mut out = table(vec!["FIELD", "KIND", "TYPE", "OFFSET", "ELEM", "LEN"]);
            for f in definition.fields() {
                out.add_row(vec![
                    f.name.clone(),
                    kind_name(f.kind).to_string(),
                    f.type_name.clone(),
                    f.offset.to_string(),
                    f.elem_size.to_string(),
                    if f.array_len >= 0 {
                        f.array_len.to_string()
                    } else {
                        "-".to_string()
                    },
                ]);
            }
            println!("{out}");
            println!("total base size: {} bytes", definition.total_size());
        }
    }

    Ok(SUCCESS)
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Scalar => "single",
        FieldKind::FixedArray => "array",
        FieldKind::VariableArray => "varray",
    }
}
