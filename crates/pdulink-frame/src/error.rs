/// Errors that can occur during envelope encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The buffer is shorter than the envelope's minimum header.
    #[error("envelope too short ({size} bytes, need {needed})")]
    TooShort { size: usize, needed: usize },

    /// A declared length field is inconsistent with the buffer.
    #[error("envelope length field out of bounds ({declared} declared, {available} available)")]
    BadLength { declared: usize, available: usize },

    /// The v2 meta block carries the wrong magic number.
    #[error("invalid envelope magic 0x{0:08X} (expected 0x48414B4F)")]
    BadMagic(u32),

    /// The v2 meta block carries an unsupported packet version.
    #[error("unsupported envelope version {0} (expected 2)")]
    BadVersion(u16),

    /// The v2 meta block carries an unexpected request type.
    #[error("unexpected envelope request type 0x{0:08X} (expected 0x42555043)")]
    BadRequestType(u32),

    /// The robot name is not valid UTF-8.
    #[error("robot name is not valid UTF-8")]
    BadRobotName,
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
