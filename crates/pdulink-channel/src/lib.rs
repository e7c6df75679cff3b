//! Channel registry, configuration loading, and mailbox buffering.
//!
//! A channel maps a semantic address — (robot name, PDU name) — to the
//! numeric channel id a transport uses on the wire, together with the PDU's
//! wire type and configured size. The mailbox holds the most recent encoded
//! bytes per channel, with destructive (read-and-clear) semantics.

pub mod config;
pub mod error;
pub mod mailbox;
pub mod registry;

pub use config::{load_registry, CONFIG_EXTENSION};
pub use error::{ChannelError, Result};
pub use mailbox::{key_of, split_key, Mailbox, KEY_SEPARATOR};
pub use registry::{ChannelEntry, ChannelRegistry, Direction, TransportKind};
