use std::collections::HashMap;

use pdulink_codec::FileLoader;
use serde::Deserialize;
use tracing::info;

use crate::error::{ChannelError, Result};
use crate::registry::{ChannelEntry, ChannelRegistry, Direction, TransportKind};

/// File extension of channel configuration files.
pub const CONFIG_EXTENSION: &str = ".json";

/// Load a channel registry from configuration.
///
/// Two shapes are supported, auto-detected by the presence of a top-level
/// `paths` key:
///
/// - **legacy**: per-robot inline reader/writer channel lists;
/// - **compact**: a `paths` table mapping type-set ids to files of
///   `{channel_id, size, name, type}` records, and a `robots` table mapping
///   robot names to type-set ids.
pub fn load_registry(loader: &dyn FileLoader, path: &str) -> Result<ChannelRegistry> {
    let text = loader
        .load_text(path, CONFIG_EXTENSION)
        .map_err(|err| ChannelError::ConfigLoad {
            path: path.to_string(),
            reason: err.to_string(),
        })?;

    let raw: serde_json::Value = serde_json::from_str(&text)?;
    let entries = if raw.get("paths").is_some() {
        load_compact(loader, serde_json::from_value(raw)?)?
    } else {
        load_legacy(serde_json::from_value(raw)?)
    };

    info!(path, entries = entries.len(), "loaded channel config");
    Ok(ChannelRegistry::from_entries(entries))
}

#[derive(Debug, Deserialize)]
struct LegacyConfig {
    robots: Vec<LegacyRobot>,
}

#[derive(Debug, Deserialize)]
struct LegacyRobot {
    name: String,
    #[serde(default)]
    rpc_pdu_readers: Vec<LegacyChannel>,
    #[serde(default)]
    rpc_pdu_writers: Vec<LegacyChannel>,
    #[serde(default)]
    shm_pdu_readers: Vec<LegacyChannel>,
    #[serde(default)]
    shm_pdu_writers: Vec<LegacyChannel>,
}

/// One legacy channel record. Fields the codec does not consume
/// (`class_name`, `conv_class_name`, `write_cycle`, `method_type`) are
/// accepted and ignored.
#[derive(Debug, Deserialize)]
struct LegacyChannel {
    #[serde(rename = "type")]
    type_name: String,
    /// The logical PDU name applications address.
    org_name: String,
    channel_id: i32,
    #[serde(default)]
    pdu_size: i32,
}

fn load_legacy(config: LegacyConfig) -> Vec<ChannelEntry> {
    let mut entries = Vec::new();
    for robot in config.robots {
        let lists = [
            (&robot.shm_pdu_readers, Direction::Read, TransportKind::Shm),
            (&robot.shm_pdu_writers, Direction::Write, TransportKind::Shm),
            (&robot.rpc_pdu_readers, Direction::Read, TransportKind::Rpc),
            (&robot.rpc_pdu_writers, Direction::Write, TransportKind::Rpc),
        ];
        for (list, direction, transport_kind) in lists {
            for channel in list {
                entries.push(ChannelEntry {
                    robot_name: robot.name.clone(),
                    pdu_name: channel.org_name.clone(),
                    type_name: channel.type_name.clone(),
                    channel_id: channel.channel_id,
                    pdu_size: channel.pdu_size,
                    direction,
                    transport_kind,
                });
            }
        }
    }
    entries
}

#[derive(Debug, Deserialize)]
struct CompactConfig {
    /// Type-set id → loader-relative file name (loaded with ".json").
    paths: HashMap<String, String>,
    /// Robot name → type-set id.
    robots: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CompactChannel {
    channel_id: i32,
    #[serde(default)]
    size: i32,
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

fn load_compact(loader: &dyn FileLoader, config: CompactConfig) -> Result<Vec<ChannelEntry>> {
    // Parse each referenced type set once, then fan out per robot.
    let mut sets: HashMap<&str, Vec<CompactChannel>> = HashMap::new();
    for (set_id, file) in &config.paths {
        let text =
            loader
                .load_text(file, CONFIG_EXTENSION)
                .map_err(|err| ChannelError::ConfigLoad {
                    path: file.clone(),
                    reason: err.to_string(),
                })?;
        sets.insert(set_id.as_str(), serde_json::from_str(&text)?);
    }

    let mut robots: Vec<(&String, &String)> = config.robots.iter().collect();
    robots.sort();

    let mut entries = Vec::new();
    for (robot_name, set_id) in robots {
        let set = sets
            .get(set_id.as_str())
            .ok_or_else(|| ChannelError::UnknownTypeSet {
                robot: robot_name.clone(),
                set_id: set_id.clone(),
            })?;
        for channel in set {
            entries.push(ChannelEntry {
                robot_name: robot_name.clone(),
                pdu_name: channel.name.clone(),
                type_name: channel.type_name.clone(),
                channel_id: channel.channel_id,
                pdu_size: channel.size,
                direction: Direction::ReadWrite,
                transport_kind: TransportKind::Shm,
            });
        }
    }
    Ok(entries)
}
