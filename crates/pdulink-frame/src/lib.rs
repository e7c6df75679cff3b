//! Wire envelope framing for PDU exchange.
//!
//! An envelope carries one encoded PDU together with its routing metadata
//! (robot name, channel id) across a transport. Two on-wire formats exist;
//! both ends agree on the version out-of-band:
//!
//! - **v1**: length-prefixed, no integrity markers beyond length fields.
//! - **v2**: fixed 304-byte header with magic/version/request-type
//!   validation on decode.

pub mod envelope;
pub mod error;

pub use envelope::{
    Envelope, WireVersion, V1_MIN_SIZE, V2_HEADER_SIZE, V2_MAGIC, V2_META_SIZE, V2_NAME_SIZE,
    V2_REQUEST_TYPE, V2_VERSION,
};
pub use error::{EnvelopeError, Result};
