use std::collections::HashMap;

/// Whether the owning robot reads or writes this channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
    /// Compact type-set configs carry no reader/writer split.
    ReadWrite,
}

/// Which transport family the entry was configured under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Shared-memory style channel lists (`shm_pdu_*`, and compact sets).
    Shm,
    /// RPC style channel lists (`rpc_pdu_*`).
    Rpc,
}

/// One configured channel: the binding between a semantic PDU address and
/// its numeric wire addressing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEntry {
    pub robot_name: String,
    /// Logical PDU name applications address.
    pub pdu_name: String,
    /// Wire type as `"package/Type"`.
    pub type_name: String,
    pub channel_id: i32,
    /// Configured size of an encoded PDU, meta header included.
    /// Non-positive means "unchecked".
    pub pdu_size: i32,
    pub direction: Direction,
    pub transport_kind: TransportKind,
}

/// Read-only lookup tables mapping (robot, PDU name) ↔ channel id.
///
/// Loaded once at startup. All lookups return `Option`: an absent robot,
/// name, or id means "not configured", which callers distinguish from hard
/// failure.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    robots: HashMap<String, RobotChannels>,
}

#[derive(Debug, Default)]
struct RobotChannels {
    entries: Vec<ChannelEntry>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<i32, usize>,
}

impl ChannelRegistry {
    /// Build a registry from configured entries. Within a robot, the first
    /// entry for a given name or id wins.
    pub fn from_entries(entries: Vec<ChannelEntry>) -> Self {
        let mut robots: HashMap<String, RobotChannels> = HashMap::new();
        for entry in entries {
            let robot = robots.entry(entry.robot_name.clone()).or_default();
            let index = robot.entries.len();
            robot
                .by_name
                .entry(entry.pdu_name.clone())
                .or_insert(index);
            robot.by_id.entry(entry.channel_id).or_insert(index);
            robot.entries.push(entry);
        }
        Self { robots }
    }

    fn entry_by_name(&self, robot: &str, pdu_name: &str) -> Option<&ChannelEntry> {
        let channels = self.robots.get(robot)?;
        channels
            .by_name
            .get(pdu_name)
            .map(|&i| &channels.entries[i])
    }

    /// Logical PDU name for a numeric channel id.
    pub fn pdu_name_for(&self, robot: &str, channel_id: i32) -> Option<&str> {
        let channels = self.robots.get(robot)?;
        channels
            .by_id
            .get(&channel_id)
            .map(|&i| channels.entries[i].pdu_name.as_str())
    }

    /// Numeric channel id for a logical PDU name.
    pub fn channel_id_for(&self, robot: &str, pdu_name: &str) -> Option<i32> {
        self.entry_by_name(robot, pdu_name).map(|e| e.channel_id)
    }

    /// Wire type (`"package/Type"`) for a logical PDU name.
    pub fn type_name_for(&self, robot: &str, pdu_name: &str) -> Option<&str> {
        self.entry_by_name(robot, pdu_name)
            .map(|e| e.type_name.as_str())
    }

    /// Configured encoded size for a logical PDU name.
    pub fn pdu_size_for(&self, robot: &str, pdu_name: &str) -> Option<i32> {
        self.entry_by_name(robot, pdu_name).map(|e| e.pdu_size)
    }

    /// Configured robot names, sorted.
    pub fn robots(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.robots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All entries for a robot, in configuration order.
    pub fn entries(&self, robot: &str) -> Option<&[ChannelEntry]> {
        self.robots.get(robot).map(|r| r.entries.as_slice())
    }
}
