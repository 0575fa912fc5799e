//! Simulated collaborators for local runs and tests.
//!
//! `SimulatedFhe` keeps a plaintext table behind random-looking handles,
//! `SimulatedOracle` authenticates cleartexts with a keyed SHA-256 digest in
//! place of the threshold signature a real oracle would produce, and
//! `SimulatedRegistry` hands out sequential artifact ids.

use anchor_lang::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::cleartext::{self, SamplePlaintext};
use crate::config::DaoConfig;
use crate::dao::DataDao;
use crate::error::DaoError;
use crate::handle::{CiphertextHandle, HomomorphicEngine};
use crate::oracle::{ArtifactRegistry, CallbackSelector, DecryptionOracle, SequentialIds};

pub type SimulatedDao = DataDao<SimulatedFhe, SimulatedOracle, SimulatedRegistry, SequentialIds>;

pub const DEFAULT_ORACLE_SECRET: [u8; 32] = [0x5a; 32];

/// Builds a DAO wired to fresh simulated collaborators.
pub fn simulated_dao(config: DaoConfig) -> Result<SimulatedDao> {
    DataDao::new(
        config,
        SimulatedFhe::new(),
        SimulatedOracle::new(DEFAULT_ORACLE_SECRET),
        SimulatedRegistry::default(),
        SequentialIds::default(),
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Plaintext {
    Integer(u64),
    Text(String),
}

#[derive(Debug, Default)]
pub struct SimulatedFhe {
    values: BTreeMap<CiphertextHandle, Plaintext>,
    nonce: u64,
}

impl SimulatedFhe {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&mut self, value: Plaintext) -> CiphertextHandle {
        self.nonce += 1;
        let digest = Sha256::new()
            .chain_update(b"sim-fhe")
            .chain_update(self.nonce.to_le_bytes())
            .finalize();
        let handle = CiphertextHandle::new(digest.into());
        self.values.insert(handle, value);
        handle
    }

    pub fn encrypt_u64(&mut self, value: u64) -> CiphertextHandle {
        self.store(Plaintext::Integer(value))
    }

    pub fn encrypt_text(&mut self, value: &str) -> CiphertextHandle {
        self.store(Plaintext::Text(value.to_string()))
    }

    pub fn integer(&self, handle: &CiphertextHandle) -> Option<u64> {
        match self.values.get(handle) {
            Some(Plaintext::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    fn text(&self, handle: &CiphertextHandle) -> Option<String> {
        match self.values.get(handle) {
            Some(Plaintext::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Inverse of [`HomomorphicEngine::to_transport_handle`].
    pub fn from_transport(bytes: &[u8]) -> Option<CiphertextHandle> {
        let raw: [u8; 32] = bytes.try_into().ok()?;
        Some(CiphertextHandle::new(raw))
    }
}

impl HomomorphicEngine for SimulatedFhe {
    fn add(&mut self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle> {
        let (Some(a), Some(b)) = (self.integer(lhs), self.integer(rhs)) else {
            return err!(DaoError::CiphertextRejected);
        };
        // FHE integers wrap modulo 2^64.
        Ok(self.encrypt_u64(a.wrapping_add(b)))
    }

    fn encode_zero(&mut self) -> Result<CiphertextHandle> {
        Ok(self.encrypt_u64(0))
    }

    fn to_transport_handle(&self, value: &CiphertextHandle) -> Vec<u8> {
        value.as_bytes().to_vec()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedRequest {
    pub request_id: u64,
    pub handles: Vec<Vec<u8>>,
    pub comp_def_offset: u32,
}

#[derive(Debug)]
pub struct SimulatedOracle {
    secret: [u8; 32],
    next_request_id: u64,
    issued: BTreeMap<u64, IssuedRequest>,
}

impl SimulatedOracle {
    pub fn new(secret: [u8; 32]) -> Self {
        Self::starting_at(secret, 1)
    }

    /// Oracle whose first request id is `first_request_id`.
    pub fn starting_at(secret: [u8; 32], first_request_id: u64) -> Self {
        Self {
            secret,
            next_request_id: first_request_id,
            issued: BTreeMap::new(),
        }
    }

    pub fn sign(&self, request_id: u64, cleartext: &[u8]) -> Vec<u8> {
        Sha256::new()
            .chain_update(self.secret)
            .chain_update(request_id.to_le_bytes())
            .chain_update(cleartext)
            .finalize()
            .to_vec()
    }

    pub fn issued(&self, request_id: u64) -> Option<&IssuedRequest> {
        self.issued.get(&request_id)
    }

    pub fn last_issued(&self) -> Option<&IssuedRequest> {
        self.issued.values().next_back()
    }

    /// Decrypts what `request_id` asked for and returns `(cleartext, proof)`
    /// the way the real oracle would deliver them to the callback.
    pub fn fulfil(&self, fhe: &SimulatedFhe, request_id: u64) -> Option<(Vec<u8>, Vec<u8>)> {
        let request = self.issued.get(&request_id)?;
        let handles: Vec<CiphertextHandle> = request
            .handles
            .iter()
            .map(|bytes| SimulatedFhe::from_transport(bytes))
            .collect::<Option<_>>()?;

        let selector = CallbackSelector::from_comp_def_offset(request.comp_def_offset)?;
        let cleartext = match selector {
            CallbackSelector::RevealSample => {
                let [url, headers] = handles.as_slice() else {
                    return None;
                };
                cleartext::encode(&SamplePlaintext {
                    url: fhe.text(url)?,
                    headers: fhe.text(headers)?,
                })
                .ok()?
            }
            CallbackSelector::RevealAggregate => {
                let [sum] = handles.as_slice() else {
                    return None;
                };
                cleartext::encode(&fhe.integer(sum)?).ok()?
            }
            CallbackSelector::RunAnalysis => {
                cleartext::encode(&format!("sim://analysis/{}", request_id)).ok()?
            }
        };
        let proof = self.sign(request_id, &cleartext);
        Some((cleartext, proof))
    }
}

impl DecryptionOracle for SimulatedOracle {
    fn request_decryption(&mut self, handles: &[Vec<u8>], selector: CallbackSelector) -> Result<u64> {
        let request_id = self.next_request_id;
        self.next_request_id = request_id
            .checked_add(1)
            .ok_or_else(|| error!(DaoError::InvalidRequestId))?;
        self.issued.insert(
            request_id,
            IssuedRequest {
                request_id,
                handles: handles.to_vec(),
                comp_def_offset: selector.comp_def_offset(),
            },
        );
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: u64, cleartext: &[u8], proof: &[u8]) -> bool {
        let expected = self.sign(request_id, cleartext);
        expected.len() == proof.len()
            && expected
                .iter()
                .zip(proof)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

#[derive(Debug, Default)]
pub struct SimulatedRegistry {
    owners: Vec<Pubkey>,
}

impl SimulatedRegistry {
    pub fn owner_of(&self, artifact_id: u64) -> Option<&Pubkey> {
        let index = usize::try_from(artifact_id.checked_sub(1)?).ok()?;
        self.owners.get(index)
    }

    pub fn minted(&self) -> usize {
        self.owners.len()
    }
}

impl ArtifactRegistry for SimulatedRegistry {
    fn mint(&mut self, owner: &Pubkey) -> Result<u64> {
        self.owners.push(*owner);
        Ok(self.owners.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sums_plaintexts() {
        let mut fhe = SimulatedFhe::new();
        let a = fhe.encrypt_u64(2);
        let b = fhe.encrypt_u64(40);
        let sum = fhe.add(&a, &b).unwrap();
        assert_eq!(fhe.integer(&sum), Some(42));
        assert_ne!(sum, a);
    }

    #[test]
    fn test_add_rejects_text_and_unknown_handles() {
        let mut fhe = SimulatedFhe::new();
        let a = fhe.encrypt_u64(2);
        let text = fhe.encrypt_text("hello");
        assert!(fhe.add(&a, &text).is_err());
        assert!(fhe.add(&a, &CiphertextHandle::default()).is_err());
    }

    #[test]
    fn test_transport_round_trip() {
        let mut fhe = SimulatedFhe::new();
        let a = fhe.encrypt_u64(2);
        let bytes = fhe.to_transport_handle(&a);
        assert_eq!(SimulatedFhe::from_transport(&bytes), Some(a));
        assert_eq!(SimulatedFhe::from_transport(&bytes[..31]), None);
    }

    #[test]
    fn test_oracle_proof_binds_request_and_cleartext() {
        let oracle = SimulatedOracle::new(DEFAULT_ORACLE_SECRET);
        let proof = oracle.sign(3, b"payload");
        assert!(oracle.verify_proof(3, b"payload", &proof));
        assert!(!oracle.verify_proof(4, b"payload", &proof));
        assert!(!oracle.verify_proof(3, b"payloae", &proof));
        assert!(!oracle.verify_proof(3, b"payload", &proof[..16]));

        let other = SimulatedOracle::new([1; 32]);
        assert!(!other.verify_proof(3, b"payload", &proof));
    }

    #[test]
    fn test_oracle_request_ids_are_sequential() {
        let mut oracle = SimulatedOracle::starting_at(DEFAULT_ORACLE_SECRET, 100);
        let first = oracle
            .request_decryption(&[vec![0; 32]], CallbackSelector::RevealAggregate)
            .unwrap();
        let second = oracle
            .request_decryption(&[vec![1; 32]], CallbackSelector::RevealAggregate)
            .unwrap();
        assert_eq!((first, second), (100, 101));
        assert_eq!(oracle.last_issued().map(|r| r.request_id), Some(101));
    }

    #[test]
    fn test_fulfil_sample_request() {
        let mut fhe = SimulatedFhe::new();
        let url = fhe.encrypt_text("http://evil.test");
        let headers = fhe.encrypt_text("From: a@b");
        let mut oracle = SimulatedOracle::new(DEFAULT_ORACLE_SECRET);
        let request_id = oracle
            .request_decryption(
                &[fhe.to_transport_handle(&url), fhe.to_transport_handle(&headers)],
                CallbackSelector::RevealSample,
            )
            .unwrap();

        let (cleartext, proof) = oracle.fulfil(&fhe, request_id).unwrap();
        assert!(oracle.verify_proof(request_id, &cleartext, &proof));
        let sample = cleartext::decode_sample(&cleartext).unwrap();
        assert_eq!(sample.url, "http://evil.test");
        assert_eq!(sample.headers, "From: a@b");
    }

    #[test]
    fn test_registry_ids_start_at_one() {
        let mut registry = SimulatedRegistry::default();
        let owner = Pubkey::new_from_array([4; 32]);
        assert_eq!(registry.mint(&owner).unwrap(), 1);
        assert_eq!(registry.owner_of(1), Some(&owner));
        assert_eq!(registry.owner_of(0), None);
        assert_eq!(registry.minted(), 1);
    }
}
