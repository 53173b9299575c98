//! Split-key custody and cross-chain recovery libraries for hosted multisig
//! wallets
//!
//! This crate implements the two subsystems of a hosted-wallet CLI that
//! handle private key material outside the normal server-mediated flow:
//!
//! - **Split-key generation and recovery**: a root seed is split into N
//!   password-encrypted shares of which any M reconstruct it, and recovery
//!   rediscovers the password-to-share mapping by trial decryption before
//!   verifying the regenerated key pair against the recorded public key.
//! - **Cross-chain stuck-funds recovery**: a raw multisignature sweep is
//!   rebuilt from public chain data for funds sent to a wallet's deposit
//!   addresses on a different but script-compatible network, then locally
//!   half-signed for hand-off to the co-signing counterparty.
//!
//! The interactive front end, session handling, and ordinary wallet
//! operations are out of scope; collaborators are modeled as traits
//! ([`wallet::WalletApi`], [`scanning::ChainExplorer`],
//! [`sharing::PasswordSource`]) with HTTP implementations where the real
//! services exist.

pub mod chain;
pub mod errors;
pub mod key_management;
pub mod recovery;
pub mod scanning;
pub mod sharing;
pub mod wallet;

pub use chain::*;
pub use errors::*;
pub use key_management::*;
pub use recovery::*;
pub use scanning::*;
pub use sharing::*;
pub use wallet::*;
