//! Offset table: interned strings of the deciphered directory block.
//!
//! # Layout
//! ```text
//! block[8..12]        table_pos (u32 LE), 12 <= table_pos < len - 4
//! block[table_pos]    marker byte 7
//! block[table_pos+1..] u32 LE offsets, terminated by 0xFFFFFFFF
//! ```
//! Each offset points at a NUL-terminated string inside the same block.
//! Values refer to strings by their position in this table.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::error::{PackError, Result};

/// Bytes preceding the value tree: signature, reserved word, table position.
pub const DIRECTORY_PREAMBLE: usize = 12;
/// Byte found at `table_pos`.
pub const TABLE_MARKER: u8 = 7;
/// Terminates the offset list; never part of the table.
pub const TABLE_SENTINEL: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    entries: Vec<i32>,
}

impl OffsetTable {
    /// Locate and parse the table inside a deciphered directory block.
    pub fn read(block: &[u8]) -> Result<Self> {
        if block.len() < DIRECTORY_PREAMBLE {
            return Err(PackError::TruncatedDirectory {
                needed:    DIRECTORY_PREAMBLE,
                available: block.len(),
            });
        }
        let table_pos = LittleEndian::read_u32(&block[8..12]);
        if (table_pos as usize) < DIRECTORY_PREAMBLE || table_pos as usize >= block.len() - 4 {
            return Err(PackError::InvalidTableLocation(table_pos));
        }
        let marker = block[table_pos as usize];
        if marker != TABLE_MARKER {
            return Err(PackError::TableMarkerNotFound(marker));
        }

        let mut entries = Vec::new();
        let mut pos = table_pos as usize + 1;
        while pos + 4 <= block.len() {
            let offset = LittleEndian::read_u32(&block[pos..pos + 4]);
            if offset == TABLE_SENTINEL {
                break;
            }
            entries.push(offset as i32);
            pos += 4;
        }
        debug!("Offset table at {} with {} entries", table_pos, entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<i32> {
        self.entries.get(idx).copied()
    }

    pub fn entries(&self) -> &[i32] {
        &self.entries
    }

    /// Resolve table entry `idx` to the NUL-terminated text it points at.
    ///
    /// The scan stops at the first zero byte or at the end of `block`.
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD, so a name
    /// returned here may not match the raw bytes stored in the container.
    pub fn resolve(&self, block: &[u8], idx: i32) -> Result<String> {
        if idx < 0 || idx as usize >= self.entries.len() {
            return Err(PackError::InvalidStringIndex(idx));
        }
        let ofs = self.entries[idx as usize];
        if ofs < 0 || ofs as usize >= block.len() {
            return Err(PackError::InvalidStringOffset(ofs));
        }
        let tail = &block[ofs as usize..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }
}

impl From<Vec<i32>> for OffsetTable {
    fn from(entries: Vec<i32>) -> Self {
        Self { entries }
    }
}
