pub mod error;
pub mod header;
pub mod cipher;
pub mod probe;
pub mod offsets;
pub mod value;
pub mod pack;
pub mod archive;

pub use error::{PackError, Result};
pub use header::ContainerHeader;
pub use cipher::{decipher, encipher, Method};
pub use offsets::OffsetTable;
pub use value::{DecodeOptions, HashEntry, Value, ValueType};
pub use pack::{FileEntry, Pack};
pub use archive::{Archive, ExtractOptions};
