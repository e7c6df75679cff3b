use std::sync::Arc;

use pdulink_channel::{key_of, load_registry, split_key, ChannelRegistry, Mailbox};
use pdulink_codec::{decode, encode, DefinitionRegistry, FileLoader, PduInstance, META_SIZE};
use pdulink_transport::Transport;
use tracing::debug;

use crate::error::{ManagerError, Result};

/// Orchestrates the codec, channel registry, mailbox and an injected
/// transport behind create/write/flush/read operations.
///
/// Transient states — service not started, nothing buffered — surface as
/// `Ok(None)` / `Ok(false)`, since callers routinely poll. Structural
/// problems (missing channel mapping, unloadable schema) are errors: they
/// indicate misconfiguration, not a state to retry.
pub struct PduManager {
    transport: Box<dyn Transport>,
    definitions: Arc<DefinitionRegistry>,
    registry: Arc<ChannelRegistry>,
    mailbox: Arc<Mailbox>,
}

impl PduManager {
    /// Load the channel registry from `config_name` (via `loader`) and
    /// assemble the manager. The transport stays stopped until
    /// [`start_service`](Self::start_service).
    pub fn new(
        transport: Box<dyn Transport>,
        loader: Arc<dyn FileLoader>,
        config_name: &str,
    ) -> Result<Self> {
        let registry = Arc::new(load_registry(loader.as_ref(), config_name)?);
        let definitions = Arc::new(DefinitionRegistry::new(loader));
        let mailbox = Arc::new(Mailbox::new(Arc::clone(&registry)));
        Ok(Self {
            transport,
            definitions,
            registry,
            mailbox,
        })
    }

    pub fn start_service(&mut self, uri: Option<&str>) -> Result<bool> {
        Ok(self.transport.start(Arc::clone(&self.mailbox), uri)?)
    }

    pub fn stop_service(&mut self) -> Result<bool> {
        Ok(self.transport.stop()?)
    }

    pub fn is_service_enabled(&self) -> bool {
        self.transport.is_running()
    }

    /// Numeric channel id for a configured PDU, if any.
    pub fn channel_id(&self, robot: &str, pdu_name: &str) -> Option<i32> {
        self.registry.channel_id_for(robot, pdu_name)
    }

    /// Configured encoded size for a PDU, if any.
    pub fn pdu_size(&self, robot: &str, pdu_name: &str) -> Option<i32> {
        self.registry.pdu_size_for(robot, pdu_name)
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    pub fn definitions(&self) -> &Arc<DefinitionRegistry> {
        &self.definitions
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Materialize an all-default PDU instance for a configured channel.
    ///
    /// Returns `Ok(None)` while the service is stopped; an unconfigured
    /// (robot, name) pair is an error.
    pub fn create_pdu(&self, robot: &str, pdu_name: &str) -> Result<Option<PduInstance>> {
        if !self.is_service_enabled() {
            return Ok(None);
        }
        let type_key = self.wire_type(robot, pdu_name)?;
        self.materialize(pdu_name, &type_key).map(Some)
    }

    /// Materialize an all-default PDU instance directly from a type key,
    /// bypassing the channel registry.
    pub fn create_pdu_by_type(&self, pdu_name: &str, type_key: &str) -> Result<Option<PduInstance>> {
        if !self.is_service_enabled() {
            return Ok(None);
        }
        check_type_key(type_key)?;
        self.materialize(pdu_name, type_key).map(Some)
    }

    /// Decode a zero-filled buffer of the definition's size: every field
    /// comes out with its default value, nested structs included.
    fn materialize(&self, pdu_name: &str, type_key: &str) -> Result<PduInstance> {
        let definition = self.definitions.load(type_key)?;
        let buf = vec![0u8; META_SIZE + definition.total_size() as usize];
        Ok(decode(&self.definitions, pdu_name, type_key, &buf)?)
    }

    /// Encode `pdu` and buffer it under `(robot, pdu.name())`, returning
    /// the mailbox key. `Ok(None)` while the service is stopped.
    pub fn write_pdu(&self, robot: &str, pdu: &PduInstance) -> Result<Option<String>> {
        if !self.is_service_enabled() {
            return Ok(None);
        }
        let encoded = encode(&self.definitions, pdu)?;
        let key = key_of(robot, pdu.name());
        self.mailbox.set(&key, encoded);
        Ok(Some(key))
    }

    /// Pop the buffered bytes for `key` and hand them to the transport.
    /// `Ok(false)` when nothing is buffered or the service is stopped.
    pub fn flush_pdu(&self, key: &str) -> Result<bool> {
        if !self.is_service_enabled() {
            return Ok(false);
        }
        let Some(bytes) = self.mailbox.take(key) else {
            return Ok(false);
        };
        let (robot, pdu_name) = split_key(key)?;
        let channel_id =
            self.registry
                .channel_id_for(robot, pdu_name)
                .ok_or_else(|| ManagerError::NotConfigured {
                    robot: robot.to_string(),
                    pdu_name: pdu_name.to_string(),
                })?;
        debug!(robot, pdu_name, channel_id, len = bytes.len(), "flushing pdu");
        Ok(self.transport.send(robot, channel_id, &bytes)?)
    }

    /// [`flush_pdu`](Self::flush_pdu) addressed by (robot, PDU name).
    pub fn flush_robot_pdu(&self, robot: &str, pdu_name: &str) -> Result<bool> {
        self.flush_pdu(&key_of(robot, pdu_name))
    }

    /// Pop and decode the most recent PDU for `(robot, pdu_name)`.
    /// `Ok(None)` when nothing has arrived since the last read or the
    /// service is stopped.
    pub fn read_pdu(&self, robot: &str, pdu_name: &str) -> Result<Option<PduInstance>> {
        if !self.is_service_enabled() {
            return Ok(None);
        }
        let Some(bytes) = self.mailbox.take(&key_of(robot, pdu_name)) else {
            return Ok(None);
        };
        let type_key = self.wire_type(robot, pdu_name)?;
        Ok(Some(decode(&self.definitions, pdu_name, &type_key, &bytes)?))
    }

    fn wire_type(&self, robot: &str, pdu_name: &str) -> Result<String> {
        let type_key = self
            .registry
            .type_name_for(robot, pdu_name)
            .ok_or_else(|| ManagerError::NotConfigured {
                robot: robot.to_string(),
                pdu_name: pdu_name.to_string(),
            })?;
        check_type_key(type_key)?;
        Ok(type_key.to_string())
    }
}

fn check_type_key(type_key: &str) -> Result<()> {
    let mut parts = type_key.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(package), Some(name), None) if !package.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(ManagerError::BadTypeKey(type_key.to_string())),
    }
}
