//! Fixed-capacity container records.
//!
//! A container is a byte field of exactly `capacity` bytes, holding a compressed ISON document:
//!
//! ```text
//! +------------+----------------------+--------------+
//! | u16 LE len | len compressed bytes | zero padding |
//! +------------+----------------------+--------------+
//! ```
//!
//! The compression strategy, capacity, and interning table all come from the [`VersionProfile`].

use crate::decode::{Decoded, Decoder};
use crate::encode::encode;
use crate::error::{Error, Result};
use crate::profile::VersionProfile;
use crate::value::Value;
use crate::MAX_PAYLOAD_SIZE;
use byteorder::{ByteOrder, LittleEndian};

const LEN_PREFIX: usize = 2;

/// Extract the ISON document bytes from a container.
pub fn unpack(raw: &[u8], profile: &VersionProfile) -> Result<Vec<u8>> {
    let capacity = profile.capacity();
    if raw.len() != capacity {
        return Err(Error::CapacityMismatch {
            expected: capacity,
            actual: raw.len(),
        });
    }
    let declared = LittleEndian::read_u16(&raw[..LEN_PREFIX]) as usize;
    if LEN_PREFIX + declared > capacity {
        return Err(Error::CorruptContainer { declared, capacity });
    }
    let payload = profile
        .compress()
        .decompress(&raw[LEN_PREFIX..LEN_PREFIX + declared], MAX_PAYLOAD_SIZE)?;
    tracing::debug!(
        profile = profile.name(),
        compressed = declared,
        len = payload.len(),
        "unpacked container"
    );
    Ok(payload)
}

/// Compress an ISON document into a newly allocated container.
pub fn pack(payload: &[u8], profile: &VersionProfile) -> Result<Vec<u8>> {
    let mut out = vec![0u8; profile.capacity()];
    pack_into(payload, profile, &mut out)?;
    Ok(out)
}

/// Compress an ISON document into an existing container buffer.
///
/// The buffer must be exactly the profile's capacity. On any failure, it is left untouched.
pub fn pack_into(payload: &[u8], profile: &VersionProfile, out: &mut [u8]) -> Result<()> {
    let capacity = profile.capacity();
    if out.len() != capacity {
        return Err(Error::CapacityMismatch {
            expected: capacity,
            actual: out.len(),
        });
    }
    let compressed = profile.compress().compress(payload)?;
    let needed = LEN_PREFIX + compressed.len();
    if needed > capacity {
        return Err(Error::PayloadTooLarge {
            capacity,
            actual: needed,
        });
    }
    // Fits in capacity, and capacity is at most u16::MAX + 2
    LittleEndian::write_u16(&mut out[..LEN_PREFIX], compressed.len() as u16);
    out[LEN_PREFIX..needed].copy_from_slice(&compressed);
    out[needed..].fill(0);
    tracing::debug!(
        profile = profile.name(),
        len = payload.len(),
        compressed = compressed.len(),
        capacity,
        "packed container"
    );
    Ok(())
}

/// Unpack and decode a container, using the profile's interning table.
pub fn read_document(raw: &[u8], profile: &VersionProfile) -> Result<Decoded> {
    let payload = unpack(raw, profile)?;
    Decoder::new(profile.strings()).decode(&payload)
}

/// Encode and pack a value, using the profile's interning table.
pub fn write_document(value: &Value, profile: &VersionProfile) -> Result<Vec<u8>> {
    let payload = encode(value, profile.strings());
    pack(&payload, profile)
}
