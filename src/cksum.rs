//! POSIX `cksum` compatible CRC-32.
//!
//! `cksum` runs the CRC-32 polynomial MSB-first with a zero initial
//! register, appends the input length, and complements the result. A
//! reflected (LSB-first) engine such as `crc32fast` computes the same
//! register when every input byte is bit-reversed, the hasher's internal
//! register starts at zero (initial value all-ones), and the final value
//! is bit-reversed again.

use crc32fast::Hasher;

const BLOCK: usize = 4096;

/// Incremental `cksum` state.
#[derive(Clone)]
pub struct Cksum {
    hasher: Hasher,
    len: u64,
}

impl Cksum {
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new_with_initial(u32::MAX),
            len: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut block = [0u8; BLOCK];
        for piece in data.chunks(BLOCK) {
            for (dst, src) in block.iter_mut().zip(piece) {
                *dst = src.reverse_bits();
            }
            self.hasher.update(&block[..piece.len()]);
        }
        self.len += data.len() as u64;
    }

    pub fn finalize(self) -> u32 {
        let Self { mut hasher, len } = self;
        // Length goes in least significant byte first, trailing zeros dropped.
        let mut n = len;
        while n != 0 {
            hasher.update(&[(n as u8).reverse_bits()]);
            n >>= 8;
        }
        hasher.finalize().reverse_bits()
    }
}

impl Default for Cksum {
    fn default() -> Self {
        Self::new()
    }
}

/// `cksum` of `data`, the first number `cksum(1)` prints.
pub fn cksum(data: &[u8]) -> u32 {
    let mut state = Cksum::new();
    state.update(data);
    state.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straight transcription of the POSIX algorithm, one bit at a time.
    fn reference(data: &[u8]) -> u32 {
        const POLY: u32 = 0x04C1_1DB7;
        let mut crc = 0u32;
        let mut feed = |byte: u8| {
            crc ^= (byte as u32) << 24;
            for _ in 0..8 {
                crc = if crc & 0x8000_0000 != 0 {
                    (crc << 1) ^ POLY
                } else {
                    crc << 1
                };
            }
        };
        for &b in data {
            feed(b);
        }
        let mut n = data.len() as u64;
        while n != 0 {
            feed(n as u8);
            n >>= 8;
        }
        !crc
    }

    #[test]
    fn empty_input() {
        assert_eq!(cksum(&[]), 4_294_967_295);
    }

    #[test]
    fn matches_reference() {
        let inputs: Vec<Vec<u8>> = vec![
            b"123456789".to_vec(),
            b"a".to_vec(),
            vec![0u8; 256],
            (0..=255u8).cycle().take(BLOCK * 3 + 17).collect(),
        ];
        for input in inputs {
            assert_eq!(cksum(&input), reference(&input), "len {}", input.len());
        }
    }

    #[test]
    fn incremental_equals_one_shot() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let mut state = Cksum::new();
        for piece in data.chunks(777) {
            state.update(piece);
        }
        assert_eq!(state.finalize(), cksum(&data));
    }
}
