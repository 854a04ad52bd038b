//! 128-bit content hash
//!
//! SipHash-2-4 with ClickHouse's 128-bit finalization (`sipHash128`): a single
//! `0xff` finalization round, output `v0 ^ v1` then `v2 ^ v3`, little-endian.
//! The backend recomputes it over stored content, so the variant has to match
//! bit for bit; the reference 128-bit SipHash gives different digests.

use crate::locator::HASH_LEN;

/// Streaming hasher keyed with two 64-bit halves
#[derive(Debug, Clone)]
pub struct SipHasher128 {
    v0: u64,
    v1: u64,
    v2: u64,
    v3: u64,
    tail: u64,
    ntail: usize,
    length: usize,
}

impl Default for SipHasher128 {
    fn default() -> Self {
        Self::new_with_keys(0, 0)
    }
}

impl SipHasher128 {
    pub fn new_with_keys(k0: u64, k1: u64) -> Self {
        Self {
            v0: 0x736f6d6570736575 ^ k0,
            v1: 0x646f72616e646f6d ^ k1,
            v2: 0x6c7967656e657261 ^ k0,
            v3: 0x7465646279746573 ^ k1,
            tail: 0,
            ntail: 0,
            length: 0,
        }
    }

    #[inline]
    fn round(&mut self) {
        self.v0 = self.v0.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(13);
        self.v1 ^= self.v0;
        self.v0 = self.v0.rotate_left(32);
        self.v2 = self.v2.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(16);
        self.v3 ^= self.v2;
        self.v0 = self.v0.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(21);
        self.v3 ^= self.v0;
        self.v2 = self.v2.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(17);
        self.v1 ^= self.v2;
        self.v2 = self.v2.rotate_left(32);
    }

    #[inline]
    fn compress(&mut self, word: u64) {
        self.v3 ^= word;
        self.round();
        self.round();
        self.v0 ^= word;
    }

    pub fn write(&mut self, mut data: &[u8]) {
        self.length = self.length.wrapping_add(data.len());

        // Top up a partially filled word first
        while self.ntail != 0 && !data.is_empty() {
            self.tail |= (data[0] as u64) << (8 * self.ntail);
            self.ntail += 1;
            data = &data[1..];
            if self.ntail == 8 {
                let word = self.tail;
                self.compress(word);
                self.tail = 0;
                self.ntail = 0;
            }
        }

        let mut chunks = data.chunks_exact(8);
        for chunk in &mut chunks {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            self.compress(u64::from_le_bytes(word));
        }

        let rest = chunks.remainder();
        for (i, byte) in rest.iter().enumerate() {
            self.tail |= (*byte as u64) << (8 * (self.ntail + i));
        }
        self.ntail += rest.len();
    }

    pub fn finish128(mut self) -> [u8; HASH_LEN] {
        let last = self.tail | ((self.length as u64 & 0xff) << 56);
        self.compress(last);

        self.v2 ^= 0xff;
        for _ in 0..4 {
            self.round();
        }

        let mut out = [0u8; HASH_LEN];
        out[..8].copy_from_slice(&(self.v0 ^ self.v1).to_le_bytes());
        out[8..].copy_from_slice(&(self.v2 ^ self.v3).to_le_bytes());
        out
    }
}

/// Hash `data` with the zero key
pub fn sip_hash128(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = SipHasher128::default();
    hasher.write(data);
    hasher.finish128()
}
