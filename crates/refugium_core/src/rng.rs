//! Seeded 32-bit xorshift generator.
//!
//! Every stochastic decision of the engine draws from a single instance, in a
//! fixed order, so that a seed and a configuration fully determine a run.

use crate::error::{Result, SimError};
use rand::RngCore;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    /// Seeds the generator with the low 32 bits of `seed`; zero maps to one.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let state = seed as u32;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    fn advance(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform float in `[0, 1)`.
    pub fn float(&mut self) -> f64 {
        f64::from(self.advance()) / 4_294_967_296.0
    }

    /// Uniform integer in `[0, max_exclusive)`.
    pub fn int(&mut self, max_exclusive: usize) -> Result<usize> {
        if max_exclusive == 0 {
            return Err(SimError::InvalidRange { max_exclusive });
        }
        let value = (self.float() * max_exclusive as f64).floor() as usize;
        Ok(value.min(max_exclusive - 1))
    }

    pub fn pick<'a, T>(&mut self, values: &'a [T]) -> Result<&'a T> {
        let index = self.int(values.len())?;
        Ok(&values[index])
    }

    /// In-place Fisher-Yates shuffle walking from the back.
    pub fn shuffle<T>(&mut self, values: &mut [T]) -> Result<()> {
        for i in (1..values.len()).rev() {
            let j = self.int(i + 1)?;
            values.swap(i, j);
        }
        Ok(())
    }
}

impl RngCore for Rng {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.advance());
        let low = u64::from(self.advance());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
