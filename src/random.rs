//! Deterministic byte source for the write buffer.
//!
//! Reproduces glibc's `srandom`/`random` (the TYPE_3 additive feedback
//! generator) so that a given seed yields the same bytes on every host,
//! matching files written by other tools seeded the same way.

const DEGREE: usize = 31;
const SEPARATION: usize = 3;
const DISCARD: usize = DEGREE * 10;

#[derive(Debug, Clone)]
pub struct GlibcRandom {
    state: [u32; DEGREE],
    front: usize,
    rear: usize,
}

impl GlibcRandom {
    pub fn new(seed: u32) -> Self {
        let seed = if seed == 0 { 1 } else { seed };
        let mut state = [0u32; DEGREE];
        state[0] = seed;
        let mut word = seed as i32 as i64;
        for slot in state.iter_mut().skip(1) {
            let hi = word / 127_773;
            let lo = word % 127_773;
            word = 16_807 * lo - 2_836 * hi;
            if word < 0 {
                word += 2_147_483_647;
            }
            *slot = word as u32;
        }

        let mut rng = Self {
            state,
            front: SEPARATION,
            rear: 0,
        };
        for _ in 0..DISCARD {
            rng.next_u31();
        }
        rng
    }

    /// Next value in `0..2^31`, identical to `random()`.
    pub fn next_u31(&mut self) -> u32 {
        let val = self.state[self.front].wrapping_add(self.state[self.rear]);
        self.state[self.front] = val;
        self.front = (self.front + 1) % DEGREE;
        self.rear = (self.rear + 1) % DEGREE;
        val >> 1
    }

    /// Fill `buf` with `random() % 0xff` per byte, so values span 0..=254.
    pub fn fill(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = (self.next_u31() % 0xff) as u8;
        }
    }
}
