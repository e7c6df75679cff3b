use std::sync::Arc;

use pdulink_channel::Mailbox;

use crate::error::Result;

/// A bidirectional PDU transport.
///
/// Start/stop are idempotent: starting a running transport and stopping a
/// stopped one return `Ok(false)`. On receipt of data a transport decodes
/// the agreed wire-envelope version and delivers the packet through
/// [`Mailbox::put_packet`]; per-packet protocol and integrity errors are
/// logged and dropped without stopping the receive loop.
pub trait Transport: Send {
    /// Bind resources and begin receiving into `mailbox`.
    ///
    /// `uri` optionally overrides the construction-time remote address;
    /// transports without that notion ignore it.
    fn start(&mut self, mailbox: Arc<Mailbox>, uri: Option<&str>) -> Result<bool>;

    /// Stop receiving and release resources. Safe to call concurrently
    /// with a running receive loop, and more than once.
    fn stop(&mut self) -> Result<bool>;

    fn is_running(&self) -> bool;

    /// Frame and send one encoded PDU. Returns `Ok(false)` while the
    /// transport is not running.
    fn send(&self, robot_name: &str, channel_id: i32, body: &[u8]) -> Result<bool>;
}
