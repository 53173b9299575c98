//! Entropy pool backing seed generation
//!
//! The pool is an explicit, constructor-injected random source rather than
//! ambient global state, so callers can hand it a deterministic RNG in tests.
//! Caller-supplied text can be absorbed into the pool once; every drawn seed
//! mixes the pool state with fresh CSPRNG output and a draw counter through
//! Blake2b, and the pool ratchets forward after each draw.

use blake2::{Blake2b512, Digest};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};

use super::seed::{Seed, SEED_LEN};

pub struct EntropyPool<R: RngCore + CryptoRng> {
    rng: R,
    state: [u8; 64],
    draws: u64,
}

impl EntropyPool<OsRng> {
    /// Pool seeded from the operating system CSPRNG.
    pub fn from_system() -> Self {
        Self::new(OsRng)
    }
}

impl<R: RngCore + CryptoRng> EntropyPool<R> {
    pub fn new(mut rng: R) -> Self {
        let mut state = [0u8; 64];
        rng.fill_bytes(&mut state);
        Self {
            rng,
            state,
            draws: 0,
        }
    }

    /// Mix caller-supplied text into the pool state.
    pub fn absorb(&mut self, extra: &str) {
        let mut hasher = Blake2b512::new();
        hasher.update(b"absorb");
        hasher.update(self.state);
        hasher.update(extra.as_bytes());
        self.state.copy_from_slice(&hasher.finalize());
    }

    /// Draw a fresh 256-bit seed.
    pub fn draw_seed(&mut self) -> Seed {
        let mut fresh = [0u8; 32];
        self.rng.fill_bytes(&mut fresh);

        let mut output = Blake2b512::new();
        output.update(b"seed");
        output.update(self.state);
        output.update(fresh);
        output.update(self.draws.to_le_bytes());
        let digest = output.finalize();

        // Ratchet the pool so the emitted seed cannot be recomputed from the
        // next state.
        let mut ratchet = Blake2b512::new();
        ratchet.update(b"ratchet");
        ratchet.update(self.state);
        ratchet.update(fresh);
        self.state.copy_from_slice(&ratchet.finalize());
        self.draws += 1;

        let mut seed = [0u8; SEED_LEN];
        seed.copy_from_slice(&digest[..SEED_LEN]);
        Seed::new(seed)
    }
}

impl<R: RngCore + CryptoRng> RngCore for EntropyPool<R> {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

impl<R: RngCore + CryptoRng> CryptoRng for EntropyPool<R> {}
