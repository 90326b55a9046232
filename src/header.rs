use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::error::{PackError, Result};

/// Size in bytes of the container header.
pub const HEADER_SIZE: usize = 8;

/// The two little-endian fields at the very start of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Absolute byte position of the obfuscated directory block.
    pub directory_offset: u32,
    /// Byte length of the directory block.
    pub directory_size: u32,
}

impl ContainerHeader {
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let offset = reader.read_i32::<LittleEndian>()?;
        let size = reader.read_i32::<LittleEndian>()?;
        if offset < 0 {
            return Err(PackError::NegativeHeaderField { field: "directory_offset", value: offset });
        }
        if size < 0 {
            return Err(PackError::NegativeHeaderField { field: "directory_size", value: size });
        }
        Ok(Self {
            directory_offset: offset as u32,
            directory_size: size as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_little_endian_fields() {
        let bytes = [0x08, 0, 0, 0, 0x10, 0x01, 0, 0];
        let h = ContainerHeader::read(Cursor::new(&bytes)).unwrap();
        assert_eq!(h.directory_offset, 8);
        assert_eq!(h.directory_size, 0x110);
    }

    #[test]
    fn rejects_negative_size() {
        let bytes = [0x08, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
        let err = ContainerHeader::read(Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, PackError::NegativeHeaderField { field: "directory_size", value: -1 }));
    }

    #[test]
    fn short_input_is_io_error() {
        let err = ContainerHeader::read(Cursor::new(&[1u8, 2, 3])).unwrap_err();
        assert!(matches!(err, PackError::Io(_)));
    }
}
