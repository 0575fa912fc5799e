//! Opaque ciphertext handles and the homomorphic engine seam.
//!
//! The core never looks inside a handle. Everything it does with encrypted
//! values goes through [`HomomorphicEngine`].

use anchor_lang::prelude::*;
use std::fmt;

/// Reference to an encrypted value held by the homomorphic runtime.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CiphertextHandle(pub [u8; 32]);

impl CiphertextHandle {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CiphertextHandle(")?;
        for byte in &self.0[..6] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

/// Primitives exposed by the FHE runtime.
///
/// `add` must be commutative and associative over the plaintexts the
/// handles refer to; the aggregation accumulator relies on it.
pub trait HomomorphicEngine {
    fn add(&mut self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle>;

    fn encode_zero(&mut self) -> Result<CiphertextHandle>;

    /// Serialized form handed to the decryption oracle.
    fn to_transport_handle(&self, value: &CiphertextHandle) -> Vec<u8>;
}
