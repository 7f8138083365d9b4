//! Tag-length-value metadata records that precede the codeword stream.
//!
//! Record layout: `type:u8`, then — unless `type == META_END` — `length:u8`
//! followed by `length` payload bytes. A `META_END` record has no length or
//! payload and terminates the metadata section. Mirrors `metadata.c`'s
//! `meta_write`/`meta_read`.

use std::io::{Read, Write};

use crate::bitio::{BitReader, BitWriter};
use crate::{Error, META_END};

/// A single decoded metadata record.
pub struct Record {
    pub typ: u8,
    pub data: Vec<u8>,
}

/// Write one metadata record. `typ == META_END` writes only the type byte.
pub fn write_record<W: Write>(bw: &mut BitWriter<W>, typ: u8, data: &[u8]) -> Result<(), Error> {
    bw.write(typ as u64, 8)?;
    if typ == META_END {
        return Ok(());
    }
    if data.len() > u8::MAX as usize {
        return Err(Error::InvalidArgument {
            detail: format!("metadata payload of {} bytes exceeds 255", data.len()),
        });
    }
    bw.write(data.len() as u64, 8)?;
    for chunk in data.chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        bw.write(u64::from_le_bytes(word), chunk.len() * 8)?;
    }
    Ok(())
}

/// Write the terminating `META_END` record.
pub fn finalize<W: Write>(bw: &mut BitWriter<W>) -> Result<(), Error> {
    write_record(bw, META_END, &[])
}

/// Read one metadata record, or `None` once `META_END` is reached.
pub fn read_record<R: Read>(br: &mut BitReader<R>) -> Result<Option<Record>, Error> {
    let (typ_val, n) = br.read(8)?;
    if n < 8 {
        return Err(Error::CorruptStream {
            detail: "truncated metadata type byte".into(),
        });
    }
    let typ = typ_val as u8;
    if typ == META_END {
        return Ok(None);
    }
    let (size_val, n) = br.read(8)?;
    if n < 8 {
        return Err(Error::CorruptStream {
            detail: "truncated metadata length byte".into(),
        });
    }
    let size = size_val as u8 as usize;
    let mut data = Vec::with_capacity(size);
    let mut remaining = size;
    while remaining > 0 {
        let step = remaining.min(8);
        let (val, n) = br.read(step * 8)?;
        if n < step * 8 {
            return Err(Error::CorruptStream {
                detail: "truncated metadata payload".into(),
            });
        }
        data.extend_from_slice(&val.to_le_bytes()[..step]);
        remaining -= step;
    }
    Ok(Some(Record { typ, data }))
}

/// Encode a filename as a NUL-terminated `META_NAME` payload.
pub fn encode_name(name: &str) -> Vec<u8> {
    let mut v = name.as_bytes().to_vec();
    v.push(0);
    v
}

/// Decode a `META_NAME` payload, validating the NUL terminator.
pub fn decode_name(data: &[u8]) -> Result<String, Error> {
    if data.last() != Some(&0) {
        return Err(Error::CorruptStream {
            detail: "META_NAME payload is not NUL-terminated".into(),
        });
    }
    Ok(String::from_utf8_lossy(&data[..data.len() - 1]).into_owned())
}
