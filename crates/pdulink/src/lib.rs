//! Schema-driven PDU middleware for robot telemetry and control exchange.
//!
//! This is the facade crate: it re-exports the codec, channel, framing and
//! transport layers and provides the [`PduManager`] orchestrator tying them
//! together.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pdulink::{FsFileLoader, LoopbackTransport, PduManager, Value, WireVersion};
//!
//! # fn main() -> Result<(), pdulink::ManagerError> {
//! let loader = Arc::new(FsFileLoader::new("config/pdu"));
//! let transport = Box::new(LoopbackTransport::new(WireVersion::V2));
//! let mut manager = PduManager::new(transport, loader, "custom")?;
//! manager.start_service(None)?;
//!
//! let mut pos = manager.create_pdu("DroneTransporter", "drone_pos")?.unwrap();
//! pos.struct_mut("linear")?.set("x", Value::Float64(1.0))?;
//! let key = manager.write_pdu("DroneTransporter", &pos)?.unwrap();
//! manager.flush_pdu(&key)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod manager;

pub use error::{ManagerError, Result};
pub use manager::PduManager;

pub use pdulink_channel::{
    key_of, load_registry, split_key, ChannelEntry, ChannelRegistry, Direction, Mailbox,
    TransportKind,
};
pub use pdulink_codec::{
    decode, encode, DefinitionRegistry, FileLoader, FsFileLoader, MetaHeader, PduInstance,
    StructDefinition, Value,
};
pub use pdulink_frame::{Envelope, WireVersion};
pub use pdulink_transport::{LoopbackTransport, Transport, UdpTransport};
