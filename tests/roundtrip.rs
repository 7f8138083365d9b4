use std::io::Cursor;

use lz78_codec::{decoder, encoder, Error, Options, STD_OPTIONS};

fn round_trip(data: &[u8], opt: &Options) -> Vec<u8> {
    let mut src = Cursor::new(data.to_vec());
    let mut compressed = Cursor::new(Vec::new());
    encoder::compress(&mut src, &mut compressed, opt).expect("compression failed");
    let mut decoded = Vec::new();
    let mut reader = Cursor::new(compressed.into_inner());
    decoder::expand(&mut reader, &mut decoded).expect("expansion failed");
    decoded
}

#[test]
fn empty_input_round_trips() {
    assert_eq!(round_trip(b"", &STD_OPTIONS), Vec::<u8>::new());
}

#[test]
fn single_byte_round_trips() {
    assert_eq!(round_trip(b"A", &STD_OPTIONS), b"A".to_vec());
}

#[test]
fn repeated_pair_round_trips() {
    assert_eq!(round_trip(b"AA", &STD_OPTIONS), b"AA".to_vec());
}

#[test]
fn alternating_pattern_round_trips() {
    assert_eq!(round_trip(b"ABAB", &STD_OPTIONS), b"ABAB".to_vec());
}

#[test]
fn all_256_byte_values_round_trip() {
    let data: Vec<u8> = (0..=255u8).collect();
    assert_eq!(round_trip(&data, &STD_OPTIONS), data);
}

#[test]
fn forced_dictionary_flush_round_trips() {
    // A dictionary just above the alphabet forces several reinit cycles
    // over a long, repetitive input.
    let opt = Options {
        dict_size: lz78_codec::DICT_MIN_SIZE + 8,
        ht_size: lz78_codec::DICT_MIN_SIZE + 80,
        write_dict_size: true,
        name: None,
        mtime: None,
        compute_digest: false,
    };
    let data = "the quick brown fox jumps over the lazy dog ".repeat(200);
    assert_eq!(round_trip(data.as_bytes(), &opt), data.into_bytes());
}

#[test]
fn digest_round_trips_and_detects_tampering() {
    let mut opt = STD_OPTIONS;
    opt.compute_digest = true;
    let data = b"I am Sam. Sam I am.";

    let mut src = Cursor::new(data.to_vec());
    let mut compressed = Cursor::new(Vec::new());
    encoder::compress_seekable(&mut src, &mut compressed, &opt).expect("compression failed");

    let mut bytes = compressed.into_inner();
    let mut decoded = Vec::new();
    decoder::expand(&mut Cursor::new(bytes.clone()), &mut decoded).expect("expansion failed");
    assert_eq!(decoded, data);

    // Flip a bit well past the metadata header, inside the codeword stream,
    // and confirm the corruption is surfaced rather than silently accepted.
    let flip_at = bytes.len() - 1;
    bytes[flip_at] ^= 0x01;
    let mut decoded2 = Vec::new();
    let result = decoder::expand(&mut Cursor::new(bytes), &mut decoded2);
    assert!(
        matches!(result, Err(Error::IntegrityFailure) | Err(Error::CorruptStream { .. })),
        "expected tampering to be detected, got {:?}",
        result.map(|_| ())
    );
}

#[test]
fn truncated_stream_is_rejected() {
    let mut src = Cursor::new(b"hello, world".to_vec());
    let mut compressed = Cursor::new(Vec::new());
    encoder::compress(&mut src, &mut compressed, &STD_OPTIONS).expect("compression failed");
    let bytes = compressed.into_inner();
    let truncated = &bytes[..bytes.len() / 2];

    let mut decoded = Vec::new();
    let result = decoder::expand(&mut Cursor::new(truncated.to_vec()), &mut decoded);
    assert!(result.is_err());
}

#[test]
fn missing_dict_size_metadata_is_rejected() {
    // A stream with only the META_END terminator and no codewords at all.
    let bytes = vec![0u8];
    let mut decoded = Vec::new();
    let result = decoder::expand(&mut Cursor::new(bytes), &mut decoded);
    assert!(matches!(result, Err(Error::CorruptStream { .. })));
}

#[test]
fn name_and_timestamp_metadata_round_trip() {
    let mut opt = STD_OPTIONS;
    opt.name = Some("hamlet.txt".to_string());
    opt.mtime = Some(1_700_000_000);

    let mut src = Cursor::new(b"to be or not to be".to_vec());
    let mut compressed = Cursor::new(Vec::new());
    encoder::compress(&mut src, &mut compressed, &opt).expect("compression failed");

    let mut decoded = Vec::new();
    let outcome = decoder::expand(&mut Cursor::new(compressed.into_inner()), &mut decoded)
        .expect("expansion failed");
    assert_eq!(outcome.name.as_deref(), Some("hamlet.txt"));
    assert_eq!(outcome.mtime, Some(1_700_000_000));
}
