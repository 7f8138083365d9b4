//! An abstract streaming-hasher capability.
//!
//! The encoder and decoder depend only on the [`Hasher`] trait, never on a
//! concrete hash algorithm, so the integrity check can be swapped without
//! touching the codec. [`Md5Hasher`] is the concrete instance, built on the
//! `md-5` crate's `digest::Digest` trait, matching the original's use of MD5
//! (`compute_digest` in `common.c`).

use digest::Digest as _;

pub trait Hasher {
    fn init() -> Self
    where
        Self: Sized;
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
    /// Digest size in bytes.
    fn size() -> usize
    where
        Self: Sized;
}

pub struct Md5Hasher(md5::Md5);

impl Hasher for Md5Hasher {
    fn init() -> Self {
        Md5Hasher(md5::Md5::new())
    }

    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self) -> Vec<u8> {
        self.0.finalize().to_vec()
    }

    fn size() -> usize {
        16
    }
}
