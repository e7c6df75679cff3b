use crate::error::{CodecError, Result};

/// Size of the meta header prologue. Bytes 20..24 are reserved padding.
pub const META_SIZE: usize = 24;

/// Magic number identifying an encoded PDU buffer.
pub const META_MAGIC: u32 = 0x1234_5678;

/// Meta header layout version.
pub const META_VERSION: u32 = 1;

/// Fixed-size prologue prepended to every encoded PDU.
///
/// All fields little-endian. `heap_off` always equals
/// `META_SIZE + base region size`; `total_size` is written last, once the
/// heap region length is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaHeader {
    pub magic: u32,
    pub version: u32,
    pub base_off: u32,
    pub heap_off: u32,
    pub total_size: u32,
}

impl MetaHeader {
    /// Header for a structure whose base region is `base_size` bytes.
    /// `total_size` starts at zero and is filled in at the end of encoding.
    pub fn new(base_size: u32) -> Self {
        Self {
            magic: META_MAGIC,
            version: META_VERSION,
            base_off: META_SIZE as u32,
            heap_off: META_SIZE as u32 + base_size,
            total_size: 0,
        }
    }

    /// Read a header from the front of `buf`.
    ///
    /// Magic and version are not checked: a zero-filled buffer must decode
    /// to an all-default instance, and decoding consumes `heap_off` only.
    pub fn read(buf: &[u8]) -> Result<Self> {
        if buf.len() < META_SIZE {
            return Err(CodecError::ShortBuffer {
                needed: META_SIZE,
                available: buf.len(),
            });
        }
        Ok(Self {
            magic: read_u32(buf, 0),
            version: read_u32(buf, 4),
            base_off: read_u32(buf, 8),
            heap_off: read_u32(buf, 12),
            total_size: read_u32(buf, 16),
        })
    }

    /// Write this header to the front of `buf`.
    pub fn write(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < META_SIZE {
            return Err(CodecError::ShortBuffer {
                needed: META_SIZE,
                available: buf.len(),
            });
        }
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&self.base_off.to_le_bytes());
        buf[12..16].copy_from_slice(&self.heap_off.to_le_bytes());
        buf[16..20].copy_from_slice(&self.total_size.to_le_bytes());
        Ok(())
    }
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}
