//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use anchor_lang::prelude::*;
use fhe_data_dao::sim::{simulated_dao, SimulatedDao};
use fhe_data_dao::{DaoConfig, DaoError, Invocation};

pub const T0: i64 = 1_700_000_000;

/// Test context holding a DAO wired to simulated collaborators and a clock.
pub struct TestContext {
    pub dao: SimulatedDao,
    pub now: i64,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(DaoConfig::default())
    }

    pub fn with_config(config: DaoConfig) -> Self {
        Self {
            dao: simulated_dao(config).unwrap(),
            now: T0,
        }
    }

    pub fn user(seed: u8) -> Pubkey {
        Pubkey::new_from_array([seed; 32])
    }

    pub fn as_user(&self, seed: u8) -> Invocation {
        Invocation::new(Self::user(seed), self.now)
    }

    pub fn warp(&mut self, seconds: i64) {
        self.now += seconds;
    }

    pub fn submit_sample(&mut self, seed: u8, url: &str, headers: &str) -> u64 {
        let url = self.dao.engine_mut().encrypt_text(url);
        let headers = self.dao.engine_mut().encrypt_text(headers);
        let ix = self.as_user(seed);
        self.dao.submit_sample(&ix, url, headers).unwrap()
    }

    pub fn contribute(&mut self, seed: u8, value: u64) -> u64 {
        let handle = self.dao.engine_mut().encrypt_u64(value);
        let ix = self.as_user(seed);
        self.dao.contribute(&ix, handle).unwrap()
    }

    pub fn upload_dataset(&mut self, seed: u8, cid: &str) -> u64 {
        let metadata = self.dao.engine_mut().encrypt_text("{\"rows\":1024}");
        let ix = self.as_user(seed);
        self.dao
            .upload_dataset(&ix, cid.to_string(), metadata, false)
            .unwrap()
    }

    pub fn create_proposal(&mut self, seed: u8, dataset_id: u64, delay: i64, period: i64) -> u64 {
        let ix = self.as_user(seed);
        self.dao
            .create_proposal(&ix, dataset_id, "ipfs://proposal".to_string(), delay, period)
            .unwrap()
    }

    pub fn cast_votes(&mut self, proposal_id: u64, yes: u8, no: u8) {
        for seed in 0..yes {
            let ix = self.as_user(100 + seed);
            self.dao.vote(&ix, proposal_id, true).unwrap();
        }
        for seed in 0..no {
            let ix = self.as_user(200 + seed);
            self.dao.vote(&ix, proposal_id, false).unwrap();
        }
    }

    /// Asks the simulated oracle for the `(cleartext, proof)` pair of a request.
    pub fn fulfil(&self, request_id: u64) -> (Vec<u8>, Vec<u8>) {
        self.dao
            .oracle()
            .fulfil(self.dao.engine(), request_id)
            .unwrap()
    }

    /// Delivers the oracle's genuine answer for `request_id`.
    pub fn deliver(&mut self, request_id: u64) -> Result<fhe_data_dao::RequestTarget> {
        let (cleartext, proof) = self.fulfil(request_id);
        let ix = self.as_user(250);
        self.dao.on_decrypted(&ix, request_id, &cleartext, &proof)
    }

    /// Delivers `cleartext` correctly signed by the oracle for `request_id`.
    pub fn deliver_signed(
        &mut self,
        request_id: u64,
        cleartext: &[u8],
    ) -> Result<fhe_data_dao::RequestTarget> {
        let proof = self.dao.oracle().sign(request_id, cleartext);
        let ix = self.as_user(250);
        self.dao.on_decrypted(&ix, request_id, cleartext, &proof)
    }
}

/// Asserts that `result` failed with the given DAO error code.
pub fn assert_dao_err<T: std::fmt::Debug>(result: Result<T>, expected: DaoError) {
    match result {
        Err(anchor_lang::error::Error::AnchorError(err)) => {
            assert_eq!(
                err.error_code_number,
                u32::from(expected),
                "expected {:?}, got {}",
                expected,
                err.error_name
            );
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}
