use std::fmt;

pub const SUCCESS: i32 = 0;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn codec_error(context: &str, err: pdulink_codec::CodecError) -> CliError {
    let code = match err {
        pdulink_codec::CodecError::DefinitionNotFound(_) => USAGE,
        pdulink_codec::CodecError::Format { .. } => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: pdulink_channel::ChannelError) -> CliError {
    let code = match err {
        pdulink_channel::ChannelError::ConfigLoad { .. } => USAGE,
        pdulink_channel::ChannelError::ConfigParse(_)
        | pdulink_channel::ChannelError::UnknownTypeSet { .. } => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}
