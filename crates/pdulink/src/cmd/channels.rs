use pdulink_channel::{load_registry, Direction, TransportKind};
use pdulink_codec::FsFileLoader;

use crate::cmd::ChannelsArgs;
use crate::exit::{channel_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_json, table, OutputFormat};

pub fn run(args: ChannelsArgs, format: OutputFormat) -> CliResult<i32> {
    let loader = FsFileLoader::new(&args.root);
    let registry = load_registry(&loader, &args.config)
        .map_err(|err| channel_error("channel config load failed", err))?;

    let robots: Vec<&str> = match &args.robot {
        Some(robot) => {
            if registry.entries(robot).is_none() {
                return Err(CliError::new(
                    USAGE,
                    format!("robot {robot:?} is not configured"),
                ));
            }
            vec![robot.as_str()]
        }
        None => registry.robots(),
    };

    match format {
        OutputFormat::Json => {
            let out: Vec<serde_json::Value> = robots
                .iter()
                .flat_map(|robot| registry.entries(robot).unwrap_or_default())
                .map(|e| {
                    serde_json::json!({
                        "robot": e.robot_name.clone(),
                        "pdu": e.pdu_name.clone(),
                        "type": e.type_name.clone(),
                        "channel_id": e.channel_id,
                        "pdu_size": e.pdu_size,
                        "direction": direction_name(e.direction),
                        "transport": transport_name(e.transport_kind),
                    })
                })
                .collect();
            print_json(&serde_json::Value::Array(out));
        }
        OutputFormat::Table => {
            let mut out = table(vec!["ROBOT", "PDU", "TYPE", "CHANNEL", "SIZE", "DIR", "VIA"]);
            for robot in &robots {
                for e in registry.entries(robot).unwrap_or_default() {
                    out.add_row(vec![
                        e.robot_name.clone(),
                        e.pdu_name.clone(),
                        e.type_name.clone(),
                        e.channel_id.to_string(),
                        e.pdu_size.to_string(),
                        direction_name(e.direction).to_string(),
                        transport_name(e.transport_kind).to_string(),
                    ]);
                }
            }
            println!("{out}");
        }
    }

    Ok(SUCCESS)
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Read => "read",
        Direction::Write => "write",
        Direction::ReadWrite => "read/write",
    }
}

fn transport_name(kind: TransportKind) -> &'static str {
    match kind {
        TransportKind::Shm => "shm",
        TransportKind::Rpc => "rpc",
    }
}
