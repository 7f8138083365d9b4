//! The phrase trie shared by the encoder and decoder.
//!
//! Nodes live in three parallel arrays (`parent`, `symbol`, `next`) indexed
//! by codeword, following `dictionary.c`'s `ht_t`. Rather than the original's
//! sentinel integers `ROOT_NODE`/`EMPTY_NODE` sharing the codeword's integer
//! space, a parent link is a tagged `Link`, so a stray codeword can never be
//! mistaken for a sentinel.

use crate::{Error, DICT_MAX_SIZE, DICT_MIN_SIZE, EOF_SYMBOL, NUM_SYMBOLS};

/// A node's parent pointer: either unused, the trie root, or another node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Link {
    Empty,
    Root,
    Node(u32),
}

/// The hash-addressed phrase trie.
///
/// `next` is only meaningful in compression mode, where it caches the
/// codeword a node advances to; the decoder has no use for it since it
/// already receives codewords directly off the wire.
pub struct Dictionary {
    ht_size: u32,
    compression: bool,
    parent: Vec<Link>,
    symbol: Vec<u16>,
    next: Vec<u32>,
    word_buf: Vec<u8>,
}

impl Dictionary {
    pub fn new(dict_size: u32, ht_size: u32, compression: bool) -> Result<Self, Error> {
        if dict_size < DICT_MIN_SIZE || dict_size > DICT_MAX_SIZE || dict_size > ht_size {
            return Err(Error::InvalidArgument {
                detail: format!(
                    "dict_size {} must be in [{}, min({}, ht_size={})]",
                    dict_size, DICT_MIN_SIZE, DICT_MAX_SIZE, ht_size
                ),
            });
        }
        Ok(Self {
            ht_size,
            compression,
            parent: vec![Link::Empty; ht_size as usize],
            symbol: vec![0u16; ht_size as usize],
            next: if compression {
                vec![0u32; ht_size as usize]
            } else {
                Vec::new()
            },
            word_buf: Vec::with_capacity(16),
        })
    }

    fn hash(&self, current: u32, symbol: u16) -> u32 {
        let span = self.ht_size - DICT_MIN_SIZE;
        let key = ((current as u64) << 8 | symbol as u64) % span as u64;
        DICT_MIN_SIZE + key as u32
    }

    /// Seed the alphabet (256 byte values plus the EOF symbol) and, for a
    /// compressing dictionary, reinitialize the hashed region. Returns the
    /// first codeword available for a new phrase.
    pub fn init(&mut self) -> u32 {
        for s in 0..NUM_SYMBOLS as u32 {
            self.parent[s as usize] = Link::Root;
            self.symbol[s as usize] = s as u16;
            if self.compression {
                self.next[s as usize] = s;
            }
        }
        let eof_idx = NUM_SYMBOLS;
        self.parent[eof_idx] = Link::Root;
        self.symbol[eof_idx] = EOF_SYMBOL;
        if self.compression {
            self.next[eof_idx] = eof_idx as u32;
            self.reinit()
        } else {
            DICT_MIN_SIZE
        }
    }

    /// Clear the hashed region above the alphabet, keeping the seeded
    /// entries. Returns the first codeword available for a new phrase.
    pub fn reinit(&mut self) -> u32 {
        for slot in self.parent.iter_mut().skip(NUM_SYMBOLS + 1) {
            *slot = Link::Empty;
        }
        DICT_MIN_SIZE
    }

    /// Look up the child of `current` reached by `symbol`. Looking up from
    /// `Link::Root` is the alphabet shortcut: it always succeeds, returning
    /// `symbol` itself as the slot index. Otherwise probes the hash table
    /// with linear probing, wrapping past the alphabet prefix.
    pub fn lookup(&self, current: Link, symbol: u16) -> Result<(bool, u32), Error> {
        if current == Link::Root {
            return Ok((true, symbol as u32));
        }
        let cur = match current {
            Link::Node(c) => c,
            Link::Empty => {
                return Err(Error::InvalidArgument {
                    detail: "lookup from an empty link".into(),
                })
            }
            Link::Root => unreachable!(),
        };
        let mut idx = self.hash(cur, symbol);
        loop {
            match self.parent[idx as usize] {
                Link::Node(p) if p == cur && self.symbol[idx as usize] == symbol => {
                    return Ok((true, idx))
                }
                Link::Empty => return Ok((false, idx)),
                _ => {}
            }
            idx += 1;
            if idx == self.ht_size {
                idx = DICT_MIN_SIZE;
            }
        }
    }

    /// Fill in a slot found by `lookup`. `current == Link::Root` leaves the
    /// slot's existing parent untouched (used by the decoder to complete a
    /// reserved slot one iteration after it first reserved it).
    pub fn fill(&mut self, slot: u32, current: Link, symbol: u16, next_code: u32) {
        if current != Link::Root {
            self.parent[slot as usize] = current;
        }
        self.symbol[slot as usize] = symbol;
        if self.compression {
            self.next[slot as usize] = next_code;
        }
    }

    /// The codeword a node advances to (compression mode only).
    pub fn next_of(&self, slot: u32) -> u32 {
        self.next[slot as usize]
    }

    fn bounds_check(&self, idx: u32) -> Result<(), Error> {
        if idx as usize >= self.ht_size as usize {
            return Err(Error::CorruptStream {
                detail: format!("codeword {} out of range", idx),
            });
        }
        Ok(())
    }

    /// The full phrase spelled out by `codeword`, oldest symbol first. The
    /// returned slice borrows a reused scratch buffer, valid until the next
    /// call to `word`.
    pub fn word(&mut self, codeword: u32) -> Result<&[u8], Error> {
        self.word_buf.clear();
        let mut cur = Link::Node(codeword);
        loop {
            match cur {
                Link::Node(idx) => {
                    self.bounds_check(idx)?;
                    self.word_buf.push(self.symbol[idx as usize] as u8);
                    cur = self.parent[idx as usize];
                }
                Link::Root => break,
                Link::Empty => {
                    return Err(Error::CorruptStream {
                        detail: format!("codeword {} has no parent", codeword),
                    })
                }
            }
        }
        self.word_buf.reverse();
        Ok(&self.word_buf)
    }

    /// The first symbol of the phrase spelled out by `codeword` (i.e. the
    /// symbol at the phrase's root, reached by following parent links to
    /// `Link::Root`).
    pub fn first_symbol(&self, codeword: u32) -> Result<u16, Error> {
        self.bounds_check(codeword)?;
        let mut idx = codeword;
        let mut last = idx;
        loop {
            last = idx;
            match self.parent[idx as usize] {
                Link::Node(p) => {
                    self.bounds_check(p)?;
                    idx = p;
                }
                Link::Root => break,
                Link::Empty => {
                    return Err(Error::CorruptStream {
                        detail: format!("codeword {} has no parent", codeword),
                    })
                }
            }
        }
        Ok(self.symbol[last as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_lookup_from_root_is_a_shortcut() {
        let mut dict = Dictionary::new(DICT_MIN_SIZE, DICT_MIN_SIZE + 10, true).unwrap();
        dict.init();
        let (found, slot) = dict.lookup(Link::Root, b'A' as u16).unwrap();
        assert!(found);
        assert_eq!(slot, b'A' as u32);
        assert_eq!(dict.first_symbol(slot).unwrap(), b'A' as u16);
        assert_eq!(dict.word(slot).unwrap(), &[b'A']);
    }

    #[test]
    fn compression_mode_assigns_independent_codeword_and_slot() {
        // In a compressing dictionary the hash slot returned by `lookup` is
        // just a bucket address; the codeword handed out for the new phrase
        // is whatever the caller passes as `next_code`, and is recovered via
        // `next_of`, not by treating the slot itself as a codeword.
        let mut dict = Dictionary::new(DICT_MIN_SIZE + 4, DICT_MIN_SIZE + 40, true).unwrap();
        let next_record = dict.init();
        let a = b'A' as u16;
        let (found, slot) = dict.lookup(Link::Node(a as u32), a).unwrap();
        assert!(!found);
        dict.fill(slot, Link::Node(a as u32), a, next_record);
        assert_eq!(dict.next_of(slot), next_record);
        let (found_again, slot_again) = dict.lookup(Link::Node(a as u32), a).unwrap();
        assert!(found_again);
        assert_eq!(slot_again, slot);
        assert_eq!(dict.next_of(slot_again), next_record);
    }

    #[test]
    fn decompression_mode_reconstructs_phrase_from_codeword() {
        // A decompressing dictionary has no oversized hash table: the slot
        // a record lives in *is* its codeword, so `fill` is called directly
        // with the codeword as the slot, as the decoder does.
        let mut dict = Dictionary::new(DICT_MIN_SIZE + 4, DICT_MIN_SIZE + 4, false).unwrap();
        let next_record = dict.init();
        let a = b'A' as u16;
        // Phrase "AA": parent is the alphabet entry for 'A', extended by 'A'.
        dict.fill(next_record, Link::Node(a as u32), a, 0);
        assert_eq!(dict.word(next_record).unwrap(), &[b'A', b'A']);
        assert_eq!(dict.first_symbol(next_record).unwrap(), a);
    }

    #[test]
    fn reinit_clears_hashed_region_but_not_alphabet() {
        let mut dict = Dictionary::new(DICT_MIN_SIZE + 4, DICT_MIN_SIZE + 40, true).unwrap();
        let next_record = dict.init();
        let a = b'A' as u16;
        let (_, slot) = dict.lookup(Link::Node(a as u32), a).unwrap();
        dict.fill(slot, Link::Node(a as u32), a, next_record);
        dict.reinit();
        let (found, _) = dict.lookup(Link::Node(a as u32), a).unwrap();
        assert!(!found);
        let (found, _) = dict.lookup(Link::Root, a).unwrap();
        assert!(found);
    }

    #[test]
    fn word_rejects_a_slot_with_no_parent() {
        let mut dict = Dictionary::new(DICT_MIN_SIZE + 4, DICT_MIN_SIZE + 4, false).unwrap();
        dict.init();
        // A reserved-but-not-yet-completed slot has no parent recorded.
        assert!(dict.word(DICT_MIN_SIZE).is_err());
    }

    #[test]
    fn rejects_dict_size_below_minimum() {
        assert!(Dictionary::new(DICT_MIN_SIZE - 1, DICT_MIN_SIZE + 40, true).is_err());
    }

    #[test]
    fn rejects_dict_size_larger_than_hash_table() {
        assert!(Dictionary::new(DICT_MIN_SIZE + 40, DICT_MIN_SIZE + 4, true).is_err());
    }
}
