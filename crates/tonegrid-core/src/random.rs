//! Tiny xorshift PRNG for audio-rate randomness.
//!
//! Noise oscillators, grain jitter and random arpeggio steps all need a source
//! of cheap, allocation-free numbers. Quality requirements are low; determinism
//! for a given seed is what matters for tests.

/// 32-bit xorshift generator.
#[derive(Debug, Clone)]
pub struct Xorshift32 {
    state: u32,
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}

impl Xorshift32 {
    /// Create a generator. A zero seed is replaced, since xorshift would stay at zero forever.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x1234_5678 } else { seed },
        }
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        // Top 24 bits fit the f32 mantissa exactly.
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    /// Uniform value in `[-1, 1]`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        ((self.next_u32() as i32) as f32 / i32::MAX as f32).clamp(-1.0, 1.0)
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    #[inline]
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u32() as usize) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bipolar_stays_in_range() {
        let mut rng = Xorshift32::default();
        for _ in 0..10_000 {
            let v = rng.next_bipolar();
            assert!((-1.0..=1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn unit_stays_in_range_and_spreads() {
        let mut rng = Xorshift32::new(99);
        let mut low = 0;
        for _ in 0..10_000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
            if v < 0.5 {
                low += 1;
            }
        }
        assert!((4000..6000).contains(&low), "poor spread: {low} below 0.5");
    }

    #[test]
    fn zero_seed_is_replaced() {
        let mut rng = Xorshift32::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Xorshift32::new(7);
        let mut b = Xorshift32::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn index_respects_len() {
        let mut rng = Xorshift32::new(3);
        for _ in 0..1000 {
            assert!(rng.next_index(5) < 5);
        }
        assert_eq!(rng.next_index(0), 0);
    }
}
