//! Seed generation and extended-key derivation

mod entropy;
mod seed;

pub use entropy::EntropyPool;
pub use seed::{derive_master_key, MasterKey, Seed, SEED_LEN};
