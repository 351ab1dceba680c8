// Copyright @yucwang 2026

use rand::{Error, RngCore, SeedableRng};

use crate::math::constants::Float;

const PCG_MULT: u64 = 6364136223846793005;

// PCG (RXS-M-XS) generator with selectable stream. Every transport worker
// owns one; chunks of histories get their own `(seed, stream)` pair.
#[derive(Clone, Debug)]
pub struct PcgRng {
    state: u64,
    inc: u64,
}

impl PcgRng {
    pub fn new(seed: u64) -> Self {
        Self::with_stream(seed, 0)
    }

    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = Self { state: 0, inc: (stream << 1) | 1 };
        rng.step();
        rng.state = rng.state.wrapping_add(splitmix64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)));
        rng.step();
        rng
    }

    #[inline]
    fn step(&mut self) {
        self.state = self.state.wrapping_mul(PCG_MULT).wrapping_add(self.inc);
    }

    #[inline]
    pub fn next_float(&mut self) -> Float {
        (self.next_u64() >> 11) as Float * (1.0 / (1u64 << 53) as Float)
    }
}

impl RngCore for PcgRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let old = self.state;
        self.step();
        let word = ((old >> ((old >> 59) + 5)) ^ old).wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for PcgRng {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&seed[..8]);
        hi.copy_from_slice(&seed[8..]);
        Self::with_stream(u64::from_le_bytes(lo), u64::from_le_bytes(hi))
    }

    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed)
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = PcgRng::with_stream(42, 7);
        let mut b = PcgRng::with_stream(42, 7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn streams_differ() {
        let mut a = PcgRng::with_stream(42, 0);
        let mut b = PcgRng::with_stream(42, 1);
        let same = (0..100).filter(|_| a.next_u64() == b.next_u64()).count();
        assert_eq!(same, 0);
    }

    #[test]
    fn floats_are_uniform_in_unit_interval() {
        let mut rng = PcgRng::new(3);
        let n = 100_000;
        let mut sum = 0.0;
        let mut bins = [0usize; 10];
        for _ in 0..n {
            let u = rng.next_float();
            assert!((0.0..1.0).contains(&u));
            sum += u;
            bins[(u * 10.0) as usize] += 1;
        }
        assert!((sum / n as Float - 0.5).abs() < 0.01);
        for count in bins.iter() {
            assert!((*count as Float - 10_000.0).abs() < 500.0);
        }
        let v: f64 = rng.gen();
        assert!((0.0..1.0).contains(&v));
    }
}
