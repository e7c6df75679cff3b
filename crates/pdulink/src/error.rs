/// Errors surfaced by the PDU manager.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Codec-level error (schema load, encode, decode).
    #[error("codec error: {0}")]
    Codec(#[from] pdulink_codec::CodecError),

    /// Channel configuration or mailbox error.
    #[error("channel error: {0}")]
    Channel(#[from] pdulink_channel::ChannelError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pdulink_transport::TransportError),

    /// The channel registry has no mapping for the requested PDU.
    #[error("no channel configured for {robot}/{pdu_name}")]
    NotConfigured { robot: String, pdu_name: String },

    /// A configured wire type is not of the `"package/Type"` form.
    #[error("invalid wire type key: {0:?}")]
    BadTypeKey(String),
}

pub type Result<T> = std::result::Result<T, ManagerError>;
