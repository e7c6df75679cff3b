use std::sync::Arc;

use pdulink_channel::Mailbox;
use pdulink_frame::{Envelope, WireVersion};
use tracing::debug;

use crate::error::Result;
use crate::traits::Transport;

/// In-process transport that delivers its own sends back into the mailbox.
///
/// Every send goes through a full envelope encode/decode cycle before
/// delivery, so tests exercise the same wire path a networked transport
/// would.
pub struct LoopbackTransport {
    version: WireVersion,
    mailbox: Option<Arc<Mailbox>>,
}

impl LoopbackTransport {
    pub fn new(version: WireVersion) -> Self {
        Self {
            version,
            mailbox: None,
        }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(WireVersion::V2)
    }
}

impl Transport for LoopbackTransport {
    fn start(&mut self, mailbox: Arc<Mailbox>, _uri: Option<&str>) -> Result<bool> {
        if self.mailbox.is_some() {
            return Ok(false);
        }
        debug!("loopback transport started");
        self.mailbox = Some(mailbox);
        Ok(true)
    }

    fn stop(&mut self) -> Result<bool> {
        if self.mailbox.is_none() {
            return Ok(false);
        }
        debug!("loopback transport stopped");
        self.mailbox = None;
        Ok(true)
    }

    fn is_running(&self) -> bool {
        self.mailbox.is_some()
    }

    fn send(&self, robot_name: &str, channel_id: i32, body: &[u8]) -> Result<bool> {
        let Some(mailbox) = &self.mailbox else {
            return Ok(false);
        };

        let wire = Envelope::new(robot_name, channel_id, body.to_vec()).encode(self.version);
        let envelope = Envelope::decode(self.version, &wire)?;
        mailbox.put_packet(&envelope)?;
        Ok(true)
    }
}
