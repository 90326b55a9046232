//! Decoded container: directory tree plus the state needed to decipher payloads.
//!
//! ```no_run
//! use std::fs::File;
//! use ggpack::pack::Pack;
//!
//! let mut f = File::open("Weird.ggpack1")?;
//! let pack = Pack::read(&mut f)?;
//! for entry in pack.files()? {
//!     let data = pack.read_payload(&mut f, &entry)?;
//!     println!("{}\t{}", entry.name, data.len());
//! }
//! # Ok::<(), ggpack::PackError>(())
//! ```

use log::{debug, warn};
use std::io::{Read, Seek, SeekFrom};

use crate::cipher::{decipher, Method};
use crate::error::{PackError, Result};
use crate::header::ContainerHeader;
use crate::offsets::OffsetTable;
use crate::probe::{probe_block, probe_reader, Deciphered};
use crate::value::{decode_root, DecodeOptions, Value};

// ── FileEntry ────────────────────────────────────────────────────────────────

/// One embedded file described by the directory's `"files"` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name:   String,
    /// Absolute byte position of the obfuscated payload in the container.
    pub offset: u64,
    pub size:   u64,
}

impl FileEntry {
    fn from_value(v: &Value) -> Option<Self> {
        let name   = v.find("filename")?.as_str()?;
        let offset = v.find("offset")?.as_integer()?;
        let size   = v.find("size")?.as_integer()?;
        Some(Self {
            name:   name.to_owned(),
            offset: u64::try_from(offset).ok()?,
            size:   u64::try_from(size).ok()?,
        })
    }
}

// ── Pack ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Pack {
    header:  ContainerHeader,
    method:  Method,
    offsets: OffsetTable,
    entries: Value,
}

impl Pack {
    /// Decode the container at the start of `reader`.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Self::read_with_options(reader, &DecodeOptions::default())
    }

    pub fn read_with_options<R: Read + Seek>(reader: &mut R, options: &DecodeOptions) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = ContainerHeader::read(&mut *reader)?;
        debug!(
            "Directory at {} ({} bytes)",
            header.directory_offset, header.directory_size
        );
        let deciphered = probe_reader(reader, &header)?;
        Self::from_deciphered(header, deciphered, options)
    }

    /// Decode an obfuscated directory block already held in memory.
    pub fn from_directory(header: ContainerHeader, raw: &[u8], options: &DecodeOptions) -> Result<Self> {
        let deciphered = probe_block(raw)?;
        Self::from_deciphered(header, deciphered, options)
    }

    fn from_deciphered(header: ContainerHeader, d: Deciphered, options: &DecodeOptions) -> Result<Self> {
        let offsets = OffsetTable::read(&d.block)?;
        let entries = decode_root(&d.block, &offsets, options)?;
        Ok(Self { header, method: d.method, offsets, entries })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Cipher method detected for this container.
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Root hash of the directory.
    pub fn entries(&self) -> &Value {
        &self.entries
    }

    /// Embedded files listed in the directory.
    ///
    /// Elements of `"files"` that are not hashes with a string `filename` and
    /// non-negative integer `offset`/`size` are skipped.
    pub fn files(&self) -> Result<Vec<FileEntry>> {
        let files = self
            .entries
            .find("files")
            .and_then(Value::as_array)
            .ok_or(PackError::MissingFiles)?;

        let mut out = Vec::with_capacity(files.len());
        for (i, v) in files.iter().enumerate() {
            match FileEntry::from_value(v) {
                Some(entry) => out.push(entry),
                None => warn!("Skipping malformed file record #{} ({})", i, v.value_type()),
            }
        }
        Ok(out)
    }

    /// Decipher a payload buffer in place with this container's method.
    pub fn decode_payload(&self, buf: &mut [u8]) {
        decipher(buf, self.method);
    }

    /// Read and decipher the payload of `entry` from the container stream.
    pub fn read_payload<R: Read + Seek>(&self, reader: &mut R, entry: &FileEntry) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(entry.offset))?;
        let mut buf = Vec::new();
        reader.by_ref().take(entry.size).read_to_end(&mut buf)?;
        if (buf.len() as u64) < entry.size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("payload of {} truncated: {} of {} bytes", entry.name, buf.len(), entry.size),
            )
            .into());
        }
        self.decode_payload(&mut buf);
        Ok(buf)
    }
}
