use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{EnvelopeError, Result};

/// Minimum size of a v1 envelope: header length + name length + channel id.
pub const V1_MIN_SIZE: usize = 12;

/// v2 meta block magic ("HAKO").
pub const V2_MAGIC: u32 = 0x4841_4B4F;

/// v2 packet version.
pub const V2_VERSION: u16 = 2;

/// v2 request type for PDU data ("CPUB").
pub const V2_REQUEST_TYPE: u32 = 0x4255_5043;

/// Size of the null-padded robot name field in a v2 envelope.
pub const V2_NAME_SIZE: usize = 128;

/// Size of the fixed v2 meta block following the robot name.
pub const V2_META_SIZE: usize = 176;

/// Total v2 header size preceding the body.
pub const V2_HEADER_SIZE: usize = V2_NAME_SIZE + V2_META_SIZE;

/// Which on-wire envelope format both ends agreed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireVersion {
    V1,
    V2,
}

/// A wire envelope: one encoded PDU plus its routing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Robot the PDU belongs to.
    pub robot_name: String,
    /// Numeric channel addressing the PDU stream.
    pub channel_id: i32,
    /// The encoded PDU bytes, opaque at this layer.
    pub body: Bytes,
}

impl Envelope {
    pub fn new(robot_name: impl Into<String>, channel_id: i32, body: impl Into<Bytes>) -> Self {
        Self {
            robot_name: robot_name.into(),
            channel_id,
            body: body.into(),
        }
    }

    /// Total encoded size under the given wire version.
    pub fn wire_size(&self, version: WireVersion) -> usize {
        match version {
            WireVersion::V1 => V1_MIN_SIZE + self.robot_name.len() + self.body.len(),
            WireVersion::V2 => V2_HEADER_SIZE + self.body.len(),
        }
    }

    pub fn encode(&self, version: WireVersion) -> Bytes {
        match version {
            WireVersion::V1 => self.encode_v1(),
            WireVersion::V2 => self.encode_v2(),
        }
    }

    pub fn decode(version: WireVersion, data: &[u8]) -> Result<Self> {
        match version {
            WireVersion::V1 => Self::decode_v1(data),
            WireVersion::V2 => Self::decode_v2(data),
        }
    }

    /// v1 wire format:
    ///
    /// ```text
    /// ┌────────────┬────────────┬──────────┬────────────┬──────────┐
    /// │ header len │ name len   │ name     │ channel id │ body     │
    /// │ (4B LE)    │ (4B LE)    │ (UTF-8)  │ (4B LE)    │          │
    /// └────────────┴────────────┴──────────┴────────────┴──────────┘
    /// ```
    ///
    /// `header len` covers everything after itself, body included.
    fn encode_v1(&self) -> Bytes {
        let name = self.robot_name.as_bytes();
        let header_len = 4 + name.len() + 4 + self.body.len();

        let mut dst = BytesMut::with_capacity(4 + header_len);
        dst.put_i32_le(header_len as i32);
        dst.put_i32_le(name.len() as i32);
        dst.put_slice(name);
        dst.put_i32_le(self.channel_id);
        dst.put_slice(&self.body);
        dst.freeze()
    }

    /// v1 carries no integrity markers; only length bounds are checked.
    fn decode_v1(data: &[u8]) -> Result<Self> {
        if data.len() < V1_MIN_SIZE {
            return Err(EnvelopeError::TooShort {
                size: data.len(),
                needed: V1_MIN_SIZE,
            });
        }

        let header_len = read_i32(data, 0).max(0) as usize;
        if data.len() < 4 + header_len {
            return Err(EnvelopeError::BadLength {
                declared: 4 + header_len,
                available: data.len(),
            });
        }

        let name_len = read_i32(data, 4).max(0) as usize;
        let name_end = 8 + name_len;
        if data.len() < name_end + 4 {
            return Err(EnvelopeError::BadLength {
                declared: name_end + 4,
                available: data.len(),
            });
        }

        let robot_name = std::str::from_utf8(&data[8..name_end])
            .map_err(|_| EnvelopeError::BadRobotName)?
            .to_string();
        let channel_id = read_i32(data, name_end);
        let body = Bytes::copy_from_slice(&data[name_end + 4..]);

        Ok(Self {
            robot_name,
            channel_id,
            body,
        })
    }

    /// v2 wire format: 128-byte null-padded robot name, then a 176-byte
    /// meta block (magic, version, request type, lengths, channel id),
    /// then the body.
    fn encode_v2(&self) -> Bytes {
        let mut dst = BytesMut::zeroed(V2_HEADER_SIZE);

        write_fixed_str(&mut dst[0..V2_NAME_SIZE], &self.robot_name);

        let meta = &mut dst[V2_NAME_SIZE..];
        meta[0..4].copy_from_slice(&V2_MAGIC.to_le_bytes());
        meta[4..6].copy_from_slice(&V2_VERSION.to_le_bytes());
        // bytes 6..12 reserved
        meta[12..16].copy_from_slice(&V2_REQUEST_TYPE.to_le_bytes());
        let frame_len = (V2_META_SIZE - 4 + self.body.len()) as u32;
        meta[16..20].copy_from_slice(&frame_len.to_le_bytes());
        meta[20..24].copy_from_slice(&(self.body.len() as u32).to_le_bytes());
        // bytes 24..48 reserved
        meta[48..52].copy_from_slice(&self.channel_id.to_le_bytes());

        dst.put_slice(&self.body);
        dst.freeze()
    }

    /// v2 validates magic, version and request type exactly; any mismatch
    /// rejects the packet.
    fn decode_v2(data: &[u8]) -> Result<Self> {
        if data.len() < V2_HEADER_SIZE {
            return Err(EnvelopeError::TooShort {
                size: data.len(),
                needed: V2_HEADER_SIZE,
            });
        }

        let robot_name = read_fixed_str(&data[0..V2_NAME_SIZE])?;
        let meta = &data[V2_NAME_SIZE..];

        let magic = u32::from_le_bytes(meta[0..4].try_into().unwrap());
        if magic != V2_MAGIC {
            trace!(magic, "rejecting envelope with bad magic");
            return Err(EnvelopeError::BadMagic(magic));
        }
        let version = u16::from_le_bytes(meta[4..6].try_into().unwrap());
        if version != V2_VERSION {
            return Err(EnvelopeError::BadVersion(version));
        }
        let request_type = u32::from_le_bytes(meta[12..16].try_into().unwrap());
        if request_type != V2_REQUEST_TYPE {
            return Err(EnvelopeError::BadRequestType(request_type));
        }

        let body_len = u32::from_le_bytes(meta[20..24].try_into().unwrap()) as usize;
        if data.len() < V2_HEADER_SIZE + body_len {
            return Err(EnvelopeError::BadLength {
                declared: V2_HEADER_SIZE + body_len,
                available: data.len(),
            });
        }
        let channel_id = i32::from_le_bytes(meta[48..52].try_into().unwrap());
        let body = Bytes::copy_from_slice(&data[V2_HEADER_SIZE..V2_HEADER_SIZE + body_len]);

        Ok(Self {
            robot_name,
            channel_id,
            body,
        })
    }
}

fn read_i32(data: &[u8], off: usize) -> i32 {
    i32::from_le_bytes(data[off..off + 4].try_into().unwrap())
}

/// Write a string into a zeroed fixed-size field, truncated to size - 1
/// bytes at a character boundary; the padding doubles as the terminator.
fn write_fixed_str(field: &mut [u8], value: &str) {
    let mut cut = (field.len() - 1).min(value.len());
    while cut > 0 && !value.is_char_boundary(cut) {
        cut -= 1;
    }
    field[..cut].copy_from_slice(&value.as_bytes()[..cut]);
}

/// Read a null-terminated string from a fixed-size field; a field with no
/// terminator is taken whole.
fn read_fixed_str(field: &[u8]) -> Result<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_string)
        .map_err(|_| EnvelopeError::BadRobotName)
}
