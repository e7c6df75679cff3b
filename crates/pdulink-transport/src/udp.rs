use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pdulink_channel::Mailbox;
use pdulink_frame::{Envelope, WireVersion};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Largest datagram the receive loop accepts (64 KiB, the UDP maximum).
const MAX_DATAGRAM: usize = 64 * 1024;

/// How often the receive loop checks the stop flag while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// UDP datagram transport: one envelope per datagram.
///
/// A background thread receives datagrams, decodes the agreed envelope
/// version, and delivers packets into the mailbox. Per-packet protocol and
/// integrity errors are logged and dropped; the loop keeps running until
/// [`Transport::stop`], which is idempotent and joins the thread.
pub struct UdpTransport {
    local_addr: String,
    remote_addr: String,
    version: WireVersion,
    socket: Option<Arc<UdpSocket>>,
    stop_flag: Arc<AtomicBool>,
    receiver: Option<std::thread::JoinHandle<()>>,
}

impl UdpTransport {
    /// `local_addr` is bound for receiving; `remote_addr` is where sends go
    /// unless `start` is given a uri override.
    pub fn new(
        local_addr: impl Into<String>,
        remote_addr: impl Into<String>,
        version: WireVersion,
    ) -> Self {
        Self {
            local_addr: local_addr.into(),
            remote_addr: remote_addr.into(),
            version,
            socket: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            receiver: None,
        }
    }
}

impl Transport for UdpTransport {
    fn start(&mut self, mailbox: Arc<Mailbox>, uri: Option<&str>) -> Result<bool> {
        if self.socket.is_some() {
            return Ok(false);
        }
        if let Some(uri) = uri {
            self.remote_addr = uri.to_string();
        }

        let socket = UdpSocket::bind(&self.local_addr).map_err(|source| TransportError::Bind {
            addr: self.local_addr.clone(),
            source,
        })?;
        // The read timeout doubles as the stop-flag poll interval.
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let socket = Arc::new(socket);

        self.stop_flag.store(false, Ordering::SeqCst);
        let receiver = {
            let socket = Arc::clone(&socket);
            let stop_flag = Arc::clone(&self.stop_flag);
            let version = self.version;
            std::thread::spawn(move || receive_loop(&socket, &stop_flag, version, &mailbox))
        };

        info!(local = %self.local_addr, remote = %self.remote_addr, "udp transport started");
        self.socket = Some(socket);
        self.receiver = Some(receiver);
        Ok(true)
    }

    fn stop(&mut self) -> Result<bool> {
        if self.socket.is_none() {
            return Ok(false);
        }

        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(receiver) = self.receiver.take() {
            let _ = receiver.join();
        }
        self.socket = None;
        info!(local = %self.local_addr, "udp transport stopped");
        Ok(true)
    }

    fn is_running(&self) -> bool {
        self.socket.is_some()
    }

    fn send(&self, robot_name: &str, channel_id: i32, body: &[u8]) -> Result<bool> {
        let Some(socket) = &self.socket else {
            return Ok(false);
        };

        let wire = Envelope::new(robot_name, channel_id, body.to_vec()).encode(self.version);
        socket.send_to(&wire, &self.remote_addr)?;
        Ok(true)
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn receive_loop(
    socket: &UdpSocket,
    stop_flag: &AtomicBool,
    version: WireVersion,
    mailbox: &Mailbox,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    while !stop_flag.load(Ordering::SeqCst) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(err) => {
                warn!(error = %err, "udp receive failed");
                continue;
            }
        };

        match Envelope::decode(version, &buf[..len]) {
            Ok(envelope) => {
                if let Err(err) = mailbox.put_packet(&envelope) {
                    warn!(%from, error = %err, "dropping packet");
                }
            }
            Err(err) => {
                warn!(%from, error = %err, "dropping malformed datagram");
            }
        }
    }
    debug!("udp receive loop exited");
}
