use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pdulink_frame::Envelope;
use tracing::warn;

use crate::error::{ChannelError, Result};
use crate::registry::ChannelRegistry;

/// Separator between robot name and PDU name in mailbox keys (ASCII unit
/// separator, which cannot appear in either name).
pub const KEY_SEPARATOR: char = '\u{1F}';

/// Compose a mailbox key from a robot name and a PDU name.
pub fn key_of(robot: &str, pdu_name: &str) -> String {
    format!("{robot}{KEY_SEPARATOR}{pdu_name}")
}

/// Split a mailbox key back into (robot name, PDU name).
pub fn split_key(key: &str) -> Result<(&str, &str)> {
    let mut parts = key.split(KEY_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(robot), Some(pdu), None) => Ok((robot, pdu)),
        _ => Err(ChannelError::InvalidKey(key.to_string())),
    }
}

/// Last-value-wins buffer of encoded PDUs, keyed by (robot, PDU name).
///
/// The sole shared mutable resource between the application thread and a
/// transport's receive loop. One mutex, no nested locking; reads are
/// destructive (read-and-clear); a fast producer overwrites unread entries.
pub struct Mailbox {
    registry: Arc<ChannelRegistry>,
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl Mailbox {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Store the most recent encoded bytes for a key, replacing any unread
    /// predecessor.
    pub fn set(&self, key: &str, data: Vec<u8>) {
        self.slots.lock().unwrap().insert(key.to_string(), data);
    }

    /// Remove and return the buffered bytes for a key.
    pub fn take(&self, key: &str) -> Option<Vec<u8>> {
        self.slots.lock().unwrap().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.lock().unwrap().contains_key(key)
    }

    pub fn clear(&self) {
        self.slots.lock().unwrap().clear();
    }

    /// Deliver a received envelope into the mailbox.
    ///
    /// The (robot, channel id) pair is resolved to a PDU name through the
    /// registry; an unknown channel drops the packet (`Ok(false)`). A body
    /// shorter than the configured PDU size is an integrity error and
    /// leaves the mailbox untouched.
    pub fn put_packet(&self, envelope: &Envelope) -> Result<bool> {
        self.put_raw(&envelope.robot_name, envelope.channel_id, &envelope.body)
    }

    /// `put_packet` for transports that have already unpacked the envelope.
    pub fn put_raw(&self, robot: &str, channel_id: i32, body: &[u8]) -> Result<bool> {
        let Some(pdu_name) = self.registry.pdu_name_for(robot, channel_id) else {
            warn!(robot, channel_id, "dropping packet for unconfigured channel");
            return Ok(false);
        };

        let configured = self.registry.pdu_size_for(robot, pdu_name).unwrap_or(0);
        if configured > 0 && body.len() < configured as usize {
            return Err(ChannelError::ShortPayload {
                robot: robot.to_string(),
                pdu_name: pdu_name.to_string(),
                received: body.len(),
                configured: configured as usize,
            });
        }

        self.set(&key_of(robot, pdu_name), body.to_vec());
        Ok(true)
    }
}
