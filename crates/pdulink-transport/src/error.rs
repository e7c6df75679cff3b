/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the local socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred while sending or receiving.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope framing failed.
    #[error("envelope error: {0}")]
    Envelope(#[from] pdulink_frame::EnvelopeError),

    /// Mailbox delivery failed.
    #[error("mailbox error: {0}")]
    Channel(#[from] pdulink_channel::ChannelError),
}

pub type Result<T> = std::result::Result<T, TransportError>;
