/// Errors that can occur while loading channel configuration or buffering
/// packets.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The configuration text could not be loaded.
    #[error("channel config load failed for {path}: {reason}")]
    ConfigLoad { path: String, reason: String },

    /// The configuration JSON does not match either supported shape.
    #[error("channel config parse failed: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A compact config references a type set with no `paths` entry.
    #[error("robot '{robot}' references unknown type set '{set_id}'")]
    UnknownTypeSet { robot: String, set_id: String },

    /// A received payload is shorter than the configured PDU size.
    #[error(
        "payload for {robot}/{pdu_name} is shorter than configured \
         (received={received}, configured={configured}); \
         check that both sides use the same definitions and packet version"
    )]
    ShortPayload {
        robot: String,
        pdu_name: String,
        received: usize,
        configured: usize,
    },

    /// A mailbox key does not follow the `robot ‖ SEP ‖ pdu` form.
    #[error("invalid mailbox key: {0:?}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
