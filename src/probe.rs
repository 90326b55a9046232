//! Cipher method detection for the directory block.
//!
//! Methods are tried in [`Method::PROBE_ORDER`].  Each attempt starts from a
//! fresh copy of the obfuscated bytes because [`decipher`] works in place.
//! The first method whose output begins with [`SIGNATURE`] wins.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use std::io::{Read, Seek, SeekFrom};

use crate::cipher::{decipher, Method};
use crate::error::{PackError, Result};
use crate::header::ContainerHeader;

/// Little-endian value of the first four bytes of a deciphered directory.
pub const SIGNATURE: u32 = 0x0403_0201;

/// A directory block after successful method detection.
#[derive(Debug, Clone)]
pub struct Deciphered {
    pub method: Method,
    pub block:  Vec<u8>,
}

fn has_signature(buf: &[u8]) -> bool {
    buf.len() >= 4 && LittleEndian::read_u32(buf) == SIGNATURE
}

/// Probe an in-memory obfuscated directory block.
pub fn probe_block(raw: &[u8]) -> Result<Deciphered> {
    if raw.len() < 4 {
        return Err(PackError::TruncatedDirectory { needed: 4, available: raw.len() });
    }
    let mut buf = vec![0u8; raw.len()];
    for method in Method::PROBE_ORDER {
        buf.copy_from_slice(raw);
        decipher(&mut buf, method);
        if has_signature(&buf) {
            debug!("Directory signature matched with {}", method);
            return Ok(Deciphered { method, block: buf });
        }
        debug!("Directory signature mismatch with {}", method);
    }
    Err(PackError::UnsupportedVersion)
}

/// Probe the directory block described by `header`, re-reading it from
/// `reader` for every attempt.
pub fn probe_reader<R: Read + Seek>(reader: &mut R, header: &ContainerHeader) -> Result<Deciphered> {
    let size = header.directory_size as usize;
    if size < 4 {
        return Err(PackError::TruncatedDirectory { needed: 4, available: size });
    }
    // Size the buffer only after the stream proves it holds the block.
    let stream_len = reader.seek(SeekFrom::End(0))?;
    let available = stream_len.saturating_sub(header.directory_offset as u64);
    if (size as u64) > available {
        return Err(PackError::TruncatedDirectory { needed: size, available: available as usize });
    }
    let mut buf = vec![0u8; size];
    for method in Method::PROBE_ORDER {
        reader.seek(SeekFrom::Start(header.directory_offset as u64))?;
        reader.read_exact(&mut buf)?;
        decipher(&mut buf, method);
        if has_signature(&buf) {
            debug!("Directory signature matched with {}", method);
            return Ok(Deciphered { method, block: buf });
        }
        debug!("Directory signature mismatch with {}", method);
    }
    Err(PackError::UnsupportedVersion)
}
