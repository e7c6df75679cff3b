//! Pluggable transports for PDU exchange.
//!
//! A transport moves wire envelopes between processes and delivers inbound
//! packets into the [`Mailbox`](pdulink_channel::Mailbox). The codec core
//! never branches on the transport kind; implementations are selected at
//! construction time behind the [`Transport`] trait.

pub mod error;
pub mod loopback;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use loopback::LoopbackTransport;
pub use traits::Transport;
pub use udp::UdpTransport;
