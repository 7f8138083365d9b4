//! # lz78-codec
//!
//! A general-purpose LZ78 dictionary coder: a self-describing container
//! (metadata records followed by a codeword stream) built on top of a
//! hash-addressed phrase trie.
//!
//! * `bitio` — arbitrary-width bit-level I/O over any `Read`/`Write`
//! * `metadata` — the tag-length-value records that precede the codeword stream
//! * `dictionary` — the phrase trie shared by the encoder and decoder
//! * `digest` — an abstract streaming-hasher capability, backed by MD5
//! * `encoder` / `decoder` — the compression and expansion pipelines
//!
//! ## Buffer example
//!
//! ```rs
//! use lz78_codec::*;
//! use std::io::Cursor;
//! let test_data = b"I am Sam. Sam I am. I do not like this Sam I am.";
//! let mut src = Cursor::new(&test_data[..]);
//! let mut compressed = Cursor::new(Vec::new());
//! encoder::compress(&mut src, &mut compressed, &STD_OPTIONS).expect("compression failed");
//! ```

pub mod bitio;
pub mod metadata;
pub mod dictionary;
pub mod digest;
pub mod encoder;
pub mod decoder;

pub use encoder::compress;
pub use decoder::expand;

/// Error type spanning the five failure kinds the codec can produce.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("corrupt stream: {detail}")]
    CorruptStream { detail: String },
    #[error("integrity check failed")]
    IntegrityFailure,
    #[error("resource exhausted: {detail}")]
    ResourceExhausted { detail: String },
}

/// Number of leaf symbols in the alphabet (one byte value each).
pub const NUM_SYMBOLS: usize = 256;

/// The out-of-band symbol used to terminate the codeword stream.
pub const EOF_SYMBOL: u16 = NUM_SYMBOLS as u16;

/// Smallest legal dictionary size: the alphabet plus the EOF symbol.
pub const DICT_MIN_SIZE: u32 = NUM_SYMBOLS as u32 + 1;

/// Largest dictionary size a `u32` codeword can address.
pub const DICT_MAX_SIZE: u32 = u32::MAX - 1;

/// Metadata record types, in the TLV container.
pub const META_END: u8 = 0;
pub const META_DICT_SIZE: u8 = 1;
pub const META_NAME: u8 = 2;
pub const META_TIMESTAMP: u8 = 4;
pub const META_MD5: u8 = 8;

/// Requests that `expand` recover the original filename from `META_NAME`.
pub const DEC_ORIG_FILENAME: u8 = 1;

/// Parameters for a single `compress` call.
///
/// Filename and modification-time values are supplied by the caller (the CLI
/// layer, which is the one allowed to touch the filesystem) rather than
/// derived here, so the core stays free of path/`stat` concerns.
#[derive(Clone, Debug)]
pub struct Options {
    /// Number of codewords the dictionary may hold before it is flushed and
    /// reinitialized.
    pub dict_size: u32,
    /// Size of the backing hash table; must be `>= dict_size`.
    pub ht_size: u32,
    /// Emit a `META_DICT_SIZE` record.
    pub write_dict_size: bool,
    /// Emit a `META_NAME` record with this basename, if present.
    pub name: Option<String>,
    /// Emit a `META_TIMESTAMP` record with this value (seconds since epoch), if present.
    pub mtime: Option<i64>,
    /// Digest the input before encoding and emit a `META_MD5` record.
    /// Only honored by `compress_seekable`/`compress_seekable_to_stdout`,
    /// which can rewind the input after hashing it; `compress`'s plain
    /// streaming path has no way to rewind and silently skips recording.
    pub compute_digest: bool,
}

/// Default parameters, mirroring the original implementation's defaults
/// (1 MiB dictionary, an oversized hash table to keep probe chains short,
/// dictionary size + name + timestamp recorded, digest off).
pub const STD_OPTIONS: Options = Options {
    dict_size: 1_048_576,
    ht_size: 1_499_933 + NUM_SYMBOLS as u32 + 1,
    write_dict_size: true,
    name: None,
    mtime: None,
    compute_digest: false,
};
