//! Recursive decoder for the directory value encoding.
//!
//! # Wire format
//! Every value starts with a one-byte tag (see [`ValueType`]).
//!
//! | Tag | Body |
//! |-----|------|
//! | Null    | none |
//! | Hash    | `u32 n` (n > 0), n × (`i32 key index`, value), tag 2 |
//! | Array   | `u32 n`, n × value, tag 3 |
//! | String  | `i32 index` into the offset table |
//! | Integer | `i32 index`, text parsed as base-10 i64 |
//! | Double  | `i32 index`, text parsed as f64 |
//!
//! The trailing tag of hashes and arrays is the only integrity check in the
//! format and is always enforced.

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use super::{tag_name, HashEntry, Value, ValueType};
use crate::error::{PackError, Result};
use crate::offsets::{OffsetTable, DIRECTORY_PREAMBLE};

/// Default nesting limit for [`DecodeOptions`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Upper bound on speculative allocation for a declared element count.
const MAX_PREALLOC: usize = 1024;

/// Tunables for decoding a directory.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Deepest hash/array nesting accepted before failing with
    /// [`PackError::DepthExceeded`].
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Cursor over a deciphered directory block.
pub struct Decoder<'a> {
    block:     &'a [u8],
    table:     &'a OffsetTable,
    pos:       usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(block: &'a [u8], table: &'a OffsetTable, start: usize, options: &DecodeOptions) -> Self {
        Self { block, table, pos: start, max_depth: options.max_depth }
    }

    /// Current byte position within the block.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn truncated(&self, needed: usize) -> PackError {
        PackError::TruncatedDirectory {
            needed,
            available: self.block.len().saturating_sub(self.pos),
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self.block.get(self.pos).ok_or_else(|| self.truncated(1))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes4(&mut self) -> Result<&'a [u8]> {
        let end = self.pos + 4;
        if end > self.block.len() {
            return Err(self.truncated(4));
        }
        let bytes = &self.block[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes4()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes4()?))
    }

    fn read_text(&mut self) -> Result<String> {
        let idx = self.read_i32()?;
        self.table.resolve(self.block, idx)
    }

    fn enter(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(PackError::DepthExceeded(self.max_depth));
        }
        Ok(())
    }

    /// Decode a value that must be a hash.
    pub fn decode_hash(&mut self, depth: usize) -> Result<Value> {
        let tag = self.read_u8()?;
        if tag != ValueType::Hash.tag() {
            return Err(PackError::UnexpectedType { expected: ValueType::Hash, found: tag });
        }
        self.hash_body(depth)
    }

    /// Decode any value.
    pub fn decode_value(&mut self, depth: usize) -> Result<Value> {
        let tag = self.read_u8()?;
        trace!("Value tag {} at {}", tag_name(tag), self.pos - 1);
        let ty = ValueType::try_from(tag).map_err(PackError::UnsupportedValueType)?;
        match ty {
            ValueType::Null  => Ok(Value::Null),
            ValueType::Hash  => self.hash_body(depth),
            ValueType::Array => self.array_body(depth),
            ValueType::String => Ok(Value::String(self.read_text()?)),
            ValueType::Integer => {
                let text = self.read_text()?;
                text.parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| PackError::NumericParseError { kind: ty, text })
            }
            ValueType::Double => {
                let text = self.read_text()?;
                match parse_double(&text) {
                    Some(d) => Ok(Value::Double(d)),
                    None => Err(PackError::NumericParseError { kind: ty, text }),
                }
            }
        }
    }

    fn hash_body(&mut self, depth: usize) -> Result<Value> {
        self.enter(depth)?;
        let count = self.read_u32()?;
        if count == 0 {
            return Err(PackError::EmptyHash);
        }

        let mut entries = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
        for _ in 0..count {
            let entry = self.hash_entry(depth).map_err(|e| {
                if ends_body(&e) { PackError::UnterminatedHash(None) } else { e }
            })?;
            entries.push(entry);
        }

        let end = self.read_u8().map_err(|_| PackError::UnterminatedHash(None))?;
        if end != ValueType::Hash.tag() {
            return Err(PackError::UnterminatedHash(Some(end)));
        }

        // Stable: duplicate keys keep decode order.
        entries.sort_by(|a: &HashEntry, b: &HashEntry| a.key.as_bytes().cmp(b.key.as_bytes()));
        Ok(Value::Hash(entries))
    }

    fn hash_entry(&mut self, depth: usize) -> Result<HashEntry> {
        let key = self.read_text()?;
        let value = self.decode_value(depth + 1)?;
        Ok(HashEntry { key, value })
    }

    fn array_body(&mut self, depth: usize) -> Result<Value> {
        self.enter(depth)?;
        let count = self.read_u32()?;

        let mut items = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
        for _ in 0..count {
            let item = self.decode_value(depth + 1).map_err(|e| {
                if ends_body(&e) { PackError::UnterminatedArray(None) } else { e }
            })?;
            items.push(item);
        }

        let end = self.read_u8().map_err(|_| PackError::UnterminatedArray(None))?;
        if end != ValueType::Array.tag() {
            return Err(PackError::UnterminatedArray(Some(end)));
        }
        Ok(Value::Array(items))
    }
}

/// Errors that mean a hash or array declared more elements than it holds.
///
/// Once the real elements run out the cursor sits on the terminator tag and
/// then the string pool, so the next "element" fails on its tag or on its
/// string index.  Nested containers have already mapped their own failures,
/// and numeric parse errors come from a well-formed index, so neither is
/// rewritten.
fn ends_body(err: &PackError) -> bool {
    matches!(
        err,
        PackError::TruncatedDirectory { .. }
            | PackError::InvalidStringIndex(_)
            | PackError::InvalidStringOffset(_)
            | PackError::UnsupportedValueType(_)
    )
}

/// Parse double text, rejecting literals outside the f64 range.
///
/// `str::parse` rounds overflow to infinity; only an explicit `inf`,
/// `infinity` or `nan` spelling may produce a non-finite value.
fn parse_double(text: &str) -> Option<f64> {
    let d = text.parse::<f64>().ok()?;
    if d.is_finite() {
        return Some(d);
    }
    let word = text.trim_start_matches(['+', '-']).to_ascii_lowercase();
    matches!(word.as_str(), "inf" | "infinity" | "nan").then_some(d)
}

/// Decode the root hash of a deciphered directory block.
pub fn decode_root(block: &[u8], table: &OffsetTable, options: &DecodeOptions) -> Result<Value> {
    Decoder::new(block, table, DIRECTORY_PREAMBLE, options).decode_hash(0)
}
