//! The compression pipeline: digest (optional) + metadata header + codeword
//! stream. Mirrors `compressor.c`'s `compress()`.
//!
//! [`compress`] only requires `Read`, streaming the input in one pass, and
//! never records a digest — there is nowhere to rewind to once the header is
//! already written. [`compress_seekable`] additionally requires `Seek`: it
//! makes a first pass to compute the digest (if requested), rewinds, then
//! runs the same single-pass encoder. `compress_to_stdout` and
//! `compress_seekable_to_stdout` are the same two pipelines targeting the
//! ambient standard output.

use std::io::{Read, Seek, SeekFrom, Write};

use log::{debug, trace};

use crate::bitio::BitWriter;
use crate::dictionary::{Dictionary, Link};
use crate::digest::{Hasher, Md5Hasher};
use crate::metadata;
use crate::{Error, Options, EOF_SYMBOL, META_DICT_SIZE, META_MD5, META_NAME, META_TIMESTAMP};

/// Summary of a completed compression.
pub struct CompressOutcome {
    pub bytes_read: u64,
    pub bytes_written: u64,
}

fn emit<W: Write>(bw: &mut BitWriter<W>, codeword: u32, bits: u8) -> Result<(), Error> {
    trace!("emit codeword {} in {} bits", codeword, bits);
    bw.write(codeword as u64, bits as usize)?;
    Ok(())
}

/// Width, in bits, of the smallest unsigned integer that can hold `0..count`
/// distinct values, plus the corresponding growth mask.
fn initial_width(count: u32) -> (u8, u32) {
    let mut bits = 0u8;
    let mut mask = 1u32;
    while mask < count {
        mask <<= 1;
        bits += 1;
    }
    (bits, mask)
}

/// Compress `input` into `output` under `opt`, reading `input` exactly once.
///
/// `opt.compute_digest` is silently skipped here: with no way to rewind
/// `input`, there is no way to hash the whole stream before the metadata
/// header (which precedes the codeword stream, and so precedes the data the
/// digest covers) has already been written. Use [`compress_seekable`] when a
/// digest is wanted.
pub fn compress<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    opt: &Options,
) -> Result<CompressOutcome, Error> {
    if opt.compute_digest {
        debug!("input is not seekable; skipping integrity digest");
    }
    encode(input, BitWriter::new(output), opt, None)
}

/// Compress `input` into the ambient standard output. See [`compress`].
pub fn compress_to_stdout<R: Read>(input: &mut R, opt: &Options) -> Result<CompressOutcome, Error> {
    if opt.compute_digest {
        debug!("input is not seekable; skipping integrity digest");
    }
    encode(input, BitWriter::stdout(), opt, None)
}

/// Compress `input` into `output` under `opt`. Unlike [`compress`], a seekable
/// `input` lets `opt.compute_digest` be honored: the whole stream is hashed
/// first, the read position is rewound, and the encoder then runs its usual
/// single pass.
pub fn compress_seekable<R: Read + Seek, W: Write>(
    input: &mut R,
    output: &mut W,
    opt: &Options,
) -> Result<CompressOutcome, Error> {
    let digest = compute_digest(input, opt)?;
    encode(input, BitWriter::new(output), opt, digest)
}

/// Compress `input` into the ambient standard output. See [`compress_seekable`].
pub fn compress_seekable_to_stdout<R: Read + Seek>(
    input: &mut R,
    opt: &Options,
) -> Result<CompressOutcome, Error> {
    let digest = compute_digest(input, opt)?;
    encode(input, BitWriter::stdout(), opt, digest)
}

fn compute_digest<R: Read + Seek>(input: &mut R, opt: &Options) -> Result<Option<Vec<u8>>, Error> {
    if !opt.compute_digest {
        return Ok(None);
    }
    let mut hasher = Md5Hasher::init();
    let mut buf = [0u8; 65536];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    input.seek(SeekFrom::Start(0))?;
    Ok(Some(hasher.finalize()))
}

fn encode<R: Read, W: Write>(
    input: &mut R,
    mut bw: BitWriter<W>,
    opt: &Options,
    digest: Option<Vec<u8>>,
) -> Result<CompressOutcome, Error> {
    if opt.write_dict_size {
        metadata::write_record(&mut bw, META_DICT_SIZE, &opt.dict_size.to_le_bytes())?;
    }
    if let Some(d) = &digest {
        metadata::write_record(&mut bw, META_MD5, d)?;
    }
    if let Some(name) = &opt.name {
        metadata::write_record(&mut bw, META_NAME, &metadata::encode_name(name))?;
    }
    if let Some(mtime) = opt.mtime {
        metadata::write_record(&mut bw, META_TIMESTAMP, &mtime.to_le_bytes())?;
    }
    metadata::finalize(&mut bw)?;

    let mut dict = Dictionary::new(opt.dict_size, opt.ht_size, true)?;
    let mut next_record = dict.init();
    let (initial_bits, initial_mask) = initial_width(next_record);
    let mut bits = initial_bits;
    let mut bit_mask = initial_mask;

    let mut cur = Link::Root;
    let mut bytes_read: u64 = 0;
    let mut byte = [0u8; 1];

    loop {
        let n = input.read(&mut byte)?;
        if n == 0 {
            if let Link::Node(c) = cur {
                emit(&mut bw, c, bits)?;
            }
            let (_, eof_slot) = dict.lookup(Link::Root, EOF_SYMBOL)?;
            emit(&mut bw, dict.next_of(eof_slot), bits)?;
            break;
        }
        bytes_read += 1;
        let c = byte[0] as u16;
        let (found, slot) = dict.lookup(cur, c)?;
        if found {
            cur = Link::Node(dict.next_of(slot));
            continue;
        }

        let cur_code = match cur {
            Link::Node(v) => v,
            _ => unreachable!("lookup(Root, _) always succeeds"),
        };
        emit(&mut bw, cur_code, bits)?;
        dict.fill(slot, cur, c, next_record);
        next_record += 1;
        if next_record & bit_mask != 0 {
            bit_mask <<= 1;
            bits += 1;
        }
        if next_record == opt.dict_size {
            debug!("dictionary full at {} entries, flushing", opt.dict_size);
            next_record = dict.reinit();
            bits = initial_bits;
            bit_mask = initial_mask;
        }
        let (_, restart_slot) = dict.lookup(Link::Root, c)?;
        cur = Link::Node(dict.next_of(restart_slot));
    }

    bw.flush()?;
    let bytes_written = bw.byte_count();
    debug!(
        "compressed {} bytes into {} bytes",
        bytes_read, bytes_written
    );
    Ok(CompressOutcome {
        bytes_read,
        bytes_written,
    })
}
