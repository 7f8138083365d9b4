//! The expansion pipeline: metadata header + codeword stream, with the
//! deferred-symbol trick that lets the decoder assign codewords in the same
//! order as the encoder despite seeing each phrase extension one iteration
//! later. Mirrors `decompressor.c`'s `decompress()`.

use std::io::{Read, Write};

use log::{debug, error, trace};

use crate::bitio::BitReader;
use crate::dictionary::{Dictionary, Link};
use crate::digest::{Hasher, Md5Hasher};
use crate::metadata;
use crate::{Error, EOF_SYMBOL, META_DICT_SIZE, META_MD5, META_NAME, META_TIMESTAMP};

/// Summary of a completed expansion, including any metadata the stream carried.
pub struct ExpandOutcome {
    pub bytes_written: u64,
    pub name: Option<String>,
    pub mtime: Option<i64>,
}

fn initial_width(count: u32) -> (u8, u32) {
    let mut bits = 0u8;
    let mut mask = 1u32;
    while mask < count {
        mask <<= 1;
        bits += 1;
    }
    (bits, mask)
}

/// Expand the codeword stream in `input` into `output`.
pub fn expand<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<ExpandOutcome, Error> {
    decode(BitReader::new(input), output)
}

/// Expand the codeword stream read from the ambient standard input into `output`.
pub fn expand_from_stdin<W: Write>(output: &mut W) -> Result<ExpandOutcome, Error> {
    decode(BitReader::stdin(), output)
}

fn decode<R: Read, W: Write>(mut br: BitReader<R>, output: &mut W) -> Result<ExpandOutcome, Error> {
    let mut dict_size: Option<u32> = None;
    let mut name: Option<String> = None;
    let mut mtime: Option<i64> = None;
    let mut expected_digest: Option<Vec<u8>> = None;

    while let Some(rec) = metadata::read_record(&mut br)? {
        match rec.typ {
            META_DICT_SIZE => {
                if rec.data.len() != 4 {
                    return Err(Error::CorruptStream {
                        detail: "META_DICT_SIZE payload must be 4 bytes".into(),
                    });
                }
                dict_size = Some(u32::from_le_bytes(rec.data[..4].try_into().unwrap()));
            }
            META_NAME => {
                name = Some(metadata::decode_name(&rec.data)?);
            }
            META_TIMESTAMP => {
                if rec.data.len() != 8 {
                    return Err(Error::CorruptStream {
                        detail: "META_TIMESTAMP payload must be 8 bytes".into(),
                    });
                }
                mtime = Some(i64::from_le_bytes(rec.data[..8].try_into().unwrap()));
            }
            META_MD5 => {
                expected_digest = Some(rec.data);
            }
            other => {
                error!("unrecognized metadata type {}", other);
                return Err(Error::CorruptStream {
                    detail: format!("unrecognized metadata type {}", other),
                });
            }
        }
    }

    let dict_size = dict_size.ok_or_else(|| Error::CorruptStream {
        detail: "missing META_DICT_SIZE record".into(),
    })?;
    // Decompression needs no oversized hash table: a codeword addresses its
    // own slot directly, so ht_size == dict_size.
    let mut dict = Dictionary::new(dict_size, dict_size, false)?;
    let first_record = dict.init();
    let mut next_record = first_record;
    let (initial_bits, initial_mask) = initial_width(next_record);
    let mut bits = initial_bits;
    let mut bit_mask = initial_mask;
    let mut first = true;

    let mut hasher = expected_digest.as_ref().map(|_| Md5Hasher::init());
    let mut bytes_written: u64 = 0;

    loop {
        let (val, n) = br.read(bits as usize)?;
        if n < bits as usize {
            return Err(Error::CorruptStream {
                detail: "truncated codeword".into(),
            });
        }
        let cur = val as u32;
        trace!("codeword {} ({} bits)", cur, bits);
        if cur == EOF_SYMBOL as u32 {
            break;
        }

        let c = dict.first_symbol(cur)?;
        if c == EOF_SYMBOL {
            return Err(Error::CorruptStream {
                detail: "EOF symbol reached mid-phrase".into(),
            });
        }

        if first {
            first = false;
        } else {
            dict.fill(next_record, Link::Root, c, 0);
            next_record += 1;
            if (next_record + 1) & bit_mask != 0 {
                bit_mask <<= 1;
                bits += 1;
            }
        }

        let word = dict.word(cur)?.to_vec();
        output.write_all(&word)?;
        if let Some(h) = hasher.as_mut() {
            h.update(&word);
        }
        bytes_written += word.len() as u64;

        if next_record + 1 == dict_size {
            debug!("dictionary full at {} entries, flushing", dict_size);
            next_record = first_record;
            bits = initial_bits;
            bit_mask = initial_mask;
            first = true;
        }

        dict.fill(next_record, Link::Node(cur), 0, 0);
    }

    if let (Some(h), Some(expected)) = (hasher, &expected_digest) {
        let got = h.finalize();
        if &got != expected {
            error!("digest mismatch on expanded output");
            return Err(Error::IntegrityFailure);
        }
    }

    debug!("expanded into {} bytes", bytes_written);
    Ok(ExpandOutcome {
        bytes_written,
        name,
        mtime,
    })
}
