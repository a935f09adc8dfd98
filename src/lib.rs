//! ison-pack reads and writes ISON, a compact tagged binary encoding of JSON-like value trees,
//! along with the fixed-capacity compressed containers ISON documents are stored in.
//!
//! An ISON document is a header tag, exactly one value, and a terminator tag. Each value starts
//! with a one-byte tag:
//!
//! | Tag    | Meaning                                  | Payload                          |
//! | ------ | ---------------------------------------- | -------------------------------- |
//! | `0x00` | Null                                     | none                             |
//! | `0x01` | Byte                                     | 1 byte                           |
//! | `0x02` | Double                                   | 8 bytes, little-endian           |
//! | `0x03` | String                                   | u32 LE length, then UTF-8 bytes  |
//! | `0x04` | Interned string                          | u16 LE key into the string table |
//! | `0x05` | Object start                             | none                             |
//! | `0x06` | Object end                               | none                             |
//! | `0x07` | Array start                              | none                             |
//! | `0x08` | Array end                                | none                             |
//! | `0x09` | Key-value pair, followed by key & value  | none                             |
//! | `0x0E` | Document end                             | none                             |
//! | `0x0F` | Document start                           | none                             |
//!
//! Strings that appear in the active [`InterningTable`] are written as their 2-byte key instead of
//! their full text. The table is chosen by the caller, through a [`VersionProfile`] or directly.
//!
//! Decoding is lenient where the data allows it: unknown tags decode as null in value position and
//! are skipped between object members, unknown interned keys decode as [`UNKNOWN_STRING`], and a
//! missing terminator is ignored. Every such event is reported in the [`Diagnostics`] returned
//! with the value, and logged through `tracing`. An unknown tag where an object key belongs is
//! still an error, since keys must be strings. A strict [`Decoder`] also refuses truncated
//! documents and trailing bytes.
//!
//! # Example
//!
//! ```
//! # use ison_pack::*;
//! # use std::sync::Arc;
//! # fn main() -> Result<()> {
//! let strings: InterningTable = [(1u16, "slotType"), (2, "Hat")].into_iter().collect();
//! let profile = VersionProfile::new("v2", SMALL_CAPACITY, Compress::default(), Arc::new(strings))?;
//!
//! let value = Value::Object(vec![("slotType".into(), "hat".into())]);
//! let raw = write_document(&value, &profile)?;
//! assert_eq!(raw.len(), SMALL_CAPACITY);
//!
//! let decoded = read_document(&raw, &profile)?;
//! assert!(decoded.diagnostics.is_clean());
//! // Interned strings come back in the table's spelling
//! assert_eq!(decoded.value["slotType"].as_str(), Some("Hat"));
//! # Ok(())
//! # }
//! ```

mod compress;
mod container;
mod decode;
mod depth_tracking;
mod diagnostics;
mod element;
mod encode;
mod error;
mod intern;
mod marker;
mod profile;
mod value;

pub use compress::{
    train_dictionary, Compress, CompressionError, Dictionary, DEFAULT_DEFLATE_LEVEL,
    DICT_COMPRESSION_LEVEL,
};
pub use container::{pack, pack_into, read_document, unpack, write_document};
pub use decode::{decode, Decoded, Decoder};
pub use diagnostics::{Diagnostics, Warning};
pub use encode::{encode, encode_into};
pub use error::{Error, Result};
pub use intern::{InterningTable, UNKNOWN_STRING};
pub use profile::{ProfileRegistry, VersionProfile, LARGE_CAPACITY, SMALL_CAPACITY};
pub use value::{clamp_byte, Value};

/// The maximum nesting depth of objects and arrays in a document. Deeper documents fail to decode.
pub const MAX_DEPTH: usize = 100;

/// The maximum size of a decompressed document is 64 kiB. Containers that decompress to anything
/// larger are rejected before the whole output is produced.
pub const MAX_PAYLOAD_SIZE: usize = 1usize << 16; // 64 kiB
